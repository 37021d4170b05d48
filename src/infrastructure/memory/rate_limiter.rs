use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::application::ports::rate_limiter::RateLimiter;

struct Windows {
    by_key: HashMap<String, VecDeque<Instant>>,
    last_sweep: Instant,
}

/// Process-local sliding window: one timestamp queue per key, pruned to the
/// trailing window on every check. Once per window, keys whose newest event
/// has left the window are dropped, so idle clients do not accumulate.
pub struct MemorySlidingWindowLimiter {
    window: Duration,
    max_requests: u32,
    state: Mutex<Windows>,
}

impl MemorySlidingWindowLimiter {
    pub fn new(window: Duration, max_requests: u32) -> Self {
        Self {
            window,
            max_requests,
            state: Mutex::new(Windows {
                by_key: HashMap::new(),
                last_sweep: Instant::now(),
            }),
        }
    }

    #[cfg(test)]
    async fn tracked_keys(&self) -> usize {
        self.state.lock().await.by_key.len()
    }
}

#[async_trait]
impl RateLimiter for MemorySlidingWindowLimiter {
    async fn allow(&self, key: &str) -> anyhow::Result<bool> {
        let now = Instant::now();
        let window = self.window;
        let mut state = self.state.lock().await;
        if now.duration_since(state.last_sweep) >= window {
            state
                .by_key
                .retain(|_, q| q.back().is_some_and(|t| now.duration_since(*t) < window));
            state.last_sweep = now;
        }
        let recent = state.by_key.entry(key.to_string()).or_default();
        while recent
            .front()
            .is_some_and(|t| now.duration_since(*t) >= window)
        {
            recent.pop_front();
        }
        if recent.len() >= self.max_requests as usize {
            return Ok(false);
        }
        recent.push_back(now);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn admits_max_then_denies_until_window_passes() {
        let limiter = MemorySlidingWindowLimiter::new(Duration::from_secs(1), 3);
        let mut seen = Vec::new();
        for _ in 0..4 {
            seen.push(limiter.allow("k").await.unwrap());
        }
        assert_eq!(seen, vec![true, true, true, false]);

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(limiter.allow("k").await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn window_slides_rather_than_resets() {
        let limiter = MemorySlidingWindowLimiter::new(Duration::from_secs(10), 2);
        assert!(limiter.allow("k").await.unwrap());
        tokio::time::advance(Duration::from_secs(6)).await;
        assert!(limiter.allow("k").await.unwrap());
        tokio::time::advance(Duration::from_secs(5)).await;
        // The first event left the window; the second is still inside it.
        assert!(limiter.allow("k").await.unwrap());
        assert!(!limiter.allow("k").await.unwrap());
        assert!(limiter.allow("other").await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn idle_keys_are_forgotten_once_their_window_passes() {
        let limiter = MemorySlidingWindowLimiter::new(Duration::from_secs(1), 3);
        for ip in 0..1000 {
            assert!(limiter.allow(&format!("ip_ratelimit:{ip}")).await.unwrap());
        }
        assert_eq!(limiter.tracked_keys().await, 1000);

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(limiter.allow("ip_ratelimit:fresh").await.unwrap());
        assert_eq!(limiter.tracked_keys().await, 1);
    }
}
