pub mod cache;
pub mod db;
pub mod events;
pub mod memory;
pub mod ratelimit;
