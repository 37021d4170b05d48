use std::sync::Arc;

use async_trait::async_trait;

use crate::application::ports::rate_limiter::RateLimiter;
use crate::application::ports::sms_sender::SmsSender;

/// Limiter key shared by every SMS send.
pub const SMS_RATE_LIMIT_KEY: &str = "sms_ratelimit";

#[derive(thiserror::Error, Debug)]
pub enum SmsError {
    #[error("sms sending is throttled")]
    Throttled,
    #[error("sms rate limiter failure")]
    Limiter(#[source] anyhow::Error),
    #[error("sms send failure")]
    Send(#[source] anyhow::Error),
}

/// Wraps an [`SmsSender`] with the sliding-window limiter. A denied send
/// never reaches the vendor.
pub struct RateLimitedSmsSender<S> {
    inner: S,
    limiter: Arc<dyn RateLimiter>,
}

impl<S: SmsSender> RateLimitedSmsSender<S> {
    pub fn new(inner: S, limiter: Arc<dyn RateLimiter>) -> Self {
        Self { inner, limiter }
    }

    pub async fn send_checked(
        &self,
        template_id: &str,
        args: &[String],
        numbers: &[String],
    ) -> Result<(), SmsError> {
        let allowed = self
            .limiter
            .allow(SMS_RATE_LIMIT_KEY)
            .await
            .map_err(SmsError::Limiter)?;
        if !allowed {
            tracing::warn!(template_id, "sms_send_throttled");
            return Err(SmsError::Throttled);
        }
        self.inner
            .send(template_id, args, numbers)
            .await
            .map_err(SmsError::Send)
    }
}

#[async_trait]
impl<S: SmsSender> SmsSender for RateLimitedSmsSender<S> {
    async fn send(
        &self,
        template_id: &str,
        args: &[String],
        numbers: &[String],
    ) -> anyhow::Result<()> {
        Ok(self.send_checked(template_id, args, numbers).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::memory::rate_limiter::MemorySlidingWindowLimiter;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct CountingSender {
        sent: AtomicUsize,
    }

    #[async_trait]
    impl SmsSender for Arc<CountingSender> {
        async fn send(&self, _: &str, _: &[String], _: &[String]) -> anyhow::Result<()> {
            self.sent.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct BrokenLimiter;

    #[async_trait]
    impl RateLimiter for BrokenLimiter {
        async fn allow(&self, _key: &str) -> anyhow::Result<bool> {
            anyhow::bail!("redis unreachable")
        }
    }

    #[tokio::test(start_paused = true)]
    async fn denied_sends_never_reach_the_vendor() {
        let vendor = Arc::new(CountingSender::default());
        let limiter = Arc::new(MemorySlidingWindowLimiter::new(Duration::from_secs(60), 2));
        let sms = RateLimitedSmsSender::new(vendor.clone(), limiter);
        let numbers = vec!["+10000000000".to_string()];

        sms.send_checked("login", &[], &numbers).await.unwrap();
        sms.send_checked("login", &[], &numbers).await.unwrap();
        let err = sms.send_checked("login", &[], &numbers).await.unwrap_err();
        assert!(matches!(err, SmsError::Throttled));
        assert_eq!(vendor.sent.load(Ordering::SeqCst), 2);

        let err = sms.send("login", &[], &numbers).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SmsError>(),
            Some(SmsError::Throttled)
        ));
    }

    #[tokio::test]
    async fn limiter_failure_is_not_treated_as_allowed() {
        let vendor = Arc::new(CountingSender::default());
        let sms = RateLimitedSmsSender::new(vendor.clone(), Arc::new(BrokenLimiter));
        let err = sms.send_checked("login", &[], &[]).await.unwrap_err();
        assert!(matches!(err, SmsError::Limiter(_)));
        assert_eq!(vendor.sent.load(Ordering::SeqCst), 0);
    }
}
