use async_trait::async_trait;

use crate::domain::interactions::interactive::{ActionOutcome, Interactive, Reaction};

/// Durable interaction counters plus the per-user reaction records that make
/// likes and collects idempotent.
#[async_trait]
pub trait InteractiveRepository: Send + Sync {
    /// Unconditional `read_cnt + 1`, creating the counters row when missing.
    async fn incr_read_cnt(&self, biz: &str, biz_id: i64) -> anyhow::Result<()>;

    /// Records the reaction and bumps its counter in one transaction.
    /// `Duplicate` when the reaction was already active.
    async fn add_reaction(
        &self,
        reaction: Reaction,
        uid: i64,
        biz: &str,
        biz_id: i64,
    ) -> anyhow::Result<ActionOutcome>;

    /// Cancels an active reaction and decrements its counter in one
    /// transaction. `Duplicate` when there was nothing to cancel.
    async fn cancel_reaction(
        &self,
        reaction: Reaction,
        uid: i64,
        biz: &str,
        biz_id: i64,
    ) -> anyhow::Result<ActionOutcome>;

    async fn get(&self, biz: &str, biz_id: i64) -> anyhow::Result<Option<Interactive>>;

    /// Whether `uid` currently has an active reaction on the subject.
    async fn has_reaction(
        &self,
        reaction: Reaction,
        uid: i64,
        biz: &str,
        biz_id: i64,
    ) -> anyhow::Result<bool>;
}
