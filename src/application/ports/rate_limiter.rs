use async_trait::async_trait;

/// Sliding-window admission control.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// `Ok(true)` when the event was admitted and recorded, `Ok(false)` when
    /// the window is full. Check and record happen as one atomic step.
    async fn allow(&self, key: &str) -> anyhow::Result<bool>;
}
