//! Cache key layout and TTLs shared by the redis adapters and their
//! in-memory counterparts.

use std::time::Duration;

pub mod article_cache_redis;
pub mod interactive_cache_redis;

pub const FIRST_PAGE_TTL: Duration = Duration::from_secs(10 * 60);
pub const DRAFT_TTL: Duration = Duration::from_secs(60);
pub const PUB_TTL: Duration = Duration::from_secs(10 * 60);
pub const INTERACTIVE_TTL: Duration = Duration::from_secs(15 * 60);

pub fn first_page_key(author_id: i64) -> String {
    format!("article:first_page:{author_id}")
}

pub fn draft_key(id: i64) -> String {
    format!("article:detail:{id}")
}

pub fn pub_key(id: i64) -> String {
    format!("article:pub:detail:{id}")
}

pub fn interactive_key(biz: &str, biz_id: i64) -> String {
    format!("interactive:{biz}:{biz_id}")
}
