pub mod article_cache;
pub mod article_event_publisher;
pub mod article_repository;
pub mod interactive_cache;
pub mod interactive_repository;
pub mod rate_limiter;
pub mod sms_sender;
