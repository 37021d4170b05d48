//! In-process adapters for every cache-store and relational port. They hold
//! each operation under a single lock, which gives them the same atomicity
//! as the redis scripts and the relational transactions they stand in for.

pub mod article_cache;
pub mod article_repository;
pub mod interactive_cache;
pub mod interactive_repository;
pub mod kv;
pub mod rate_limiter;
