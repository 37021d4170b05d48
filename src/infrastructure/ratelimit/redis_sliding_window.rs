use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use redis::aio::ConnectionManager;

use crate::application::ports::rate_limiter::RateLimiter;

static SLIDE_WINDOW: Lazy<redis::Script> =
    Lazy::new(|| redis::Script::new(include_str!("lua/slide_window.lua")));

/// Sliding-window limiter backed by a redis sorted set per key. Pruning,
/// counting and recording run inside one Lua script.
#[derive(Clone)]
pub struct RedisSlidingWindowLimiter {
    conn: ConnectionManager,
    window: Duration,
    max_requests: u32,
}

impl RedisSlidingWindowLimiter {
    pub fn new(conn: ConnectionManager, window: Duration, max_requests: u32) -> Self {
        Self {
            conn,
            window,
            max_requests,
        }
    }
}

#[async_trait]
impl RateLimiter for RedisSlidingWindowLimiter {
    async fn allow(&self, key: &str) -> anyhow::Result<bool> {
        let now_ms = chrono::Utc::now().timestamp_millis();
        // Unique member so two events in the same millisecond both count.
        let member = format!("{now_ms}-{}", uuid::Uuid::new_v4());
        let mut conn = self.conn.clone();
        let admitted: i64 = SLIDE_WINDOW
            .key(key)
            .arg(self.window.as_millis() as i64)
            .arg(self.max_requests)
            .arg(now_ms)
            .arg(member)
            .invoke_async(&mut conn)
            .await
            .context("redis_slide_window_script")?;
        Ok(admitted == 1)
    }
}
