pub mod redis_sliding_window;
