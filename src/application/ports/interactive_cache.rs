use async_trait::async_trait;

use crate::domain::interactions::interactive::{CounterField, Interactive};

#[async_trait]
pub trait InteractiveCache: Send + Sync {
    /// Atomically applies `delta` to `field` only when the counters entry
    /// exists. Returns whether it was applied; a cold entry is never seeded.
    async fn incr_if_present(
        &self,
        biz: &str,
        biz_id: i64,
        field: CounterField,
        delta: i64,
    ) -> anyhow::Result<bool>;

    async fn get(&self, biz: &str, biz_id: i64) -> anyhow::Result<Option<Interactive>>;

    async fn set(&self, info: &Interactive) -> anyhow::Result<()>;
}
