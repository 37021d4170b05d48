use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::application::ports::interactive_repository::InteractiveRepository;
use crate::domain::interactions::interactive::{
    ActionOutcome, CounterField, Interactive, Reaction, RecordStatus,
};

type SubjectKey = (String, i64);
type RecordKey = (Reaction, i64, String, i64);

#[derive(Default)]
struct State {
    counters: HashMap<SubjectKey, Interactive>,
    records: HashMap<RecordKey, RecordStatus>,
}

impl State {
    fn bump(&mut self, biz: &str, biz_id: i64, field: CounterField, delta: i64) {
        self.counters
            .entry((biz.to_string(), biz_id))
            .or_insert_with(|| Interactive::empty(biz, biz_id))
            .add(field, delta);
    }
}

#[derive(Default)]
pub struct MemoryInteractiveRepository {
    state: Mutex<State>,
}

impl MemoryInteractiveRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl InteractiveRepository for MemoryInteractiveRepository {
    async fn incr_read_cnt(&self, biz: &str, biz_id: i64) -> anyhow::Result<()> {
        self.state
            .lock()
            .await
            .bump(biz, biz_id, CounterField::Read, 1);
        Ok(())
    }

    async fn add_reaction(
        &self,
        reaction: Reaction,
        uid: i64,
        biz: &str,
        biz_id: i64,
    ) -> anyhow::Result<ActionOutcome> {
        let mut state = self.state.lock().await;
        let key = (reaction, uid, biz.to_string(), biz_id);
        if state.records.get(&key) == Some(&RecordStatus::Active) {
            return Ok(ActionOutcome::Duplicate);
        }
        state.records.insert(key, RecordStatus::Active);
        state.bump(biz, biz_id, reaction.counter(), 1);
        Ok(ActionOutcome::Applied)
    }

    async fn cancel_reaction(
        &self,
        reaction: Reaction,
        uid: i64,
        biz: &str,
        biz_id: i64,
    ) -> anyhow::Result<ActionOutcome> {
        let mut state = self.state.lock().await;
        match state.records.get_mut(&(reaction, uid, biz.to_string(), biz_id)) {
            Some(status) if *status == RecordStatus::Active => {
                *status = RecordStatus::Cancelled;
            }
            _ => return Ok(ActionOutcome::Duplicate),
        }
        state.bump(biz, biz_id, reaction.counter(), -1);
        Ok(ActionOutcome::Applied)
    }

    async fn get(&self, biz: &str, biz_id: i64) -> anyhow::Result<Option<Interactive>> {
        Ok(self
            .state
            .lock()
            .await
            .counters
            .get(&(biz.to_string(), biz_id))
            .cloned())
    }

    async fn has_reaction(
        &self,
        reaction: Reaction,
        uid: i64,
        biz: &str,
        biz_id: i64,
    ) -> anyhow::Result<bool> {
        Ok(self
            .state
            .lock()
            .await
            .records
            .get(&(reaction, uid, biz.to_string(), biz_id))
            == Some(&RecordStatus::Active))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn relike_after_cancel_counts_again() {
        let repo = MemoryInteractiveRepository::new();
        let like = || repo.add_reaction(Reaction::Like, 1, "article", 9);
        assert_eq!(like().await.unwrap(), ActionOutcome::Applied);
        assert_eq!(like().await.unwrap(), ActionOutcome::Duplicate);
        assert_eq!(
            repo.cancel_reaction(Reaction::Like, 1, "article", 9)
                .await
                .unwrap(),
            ActionOutcome::Applied
        );
        assert_eq!(like().await.unwrap(), ActionOutcome::Applied);
        let info = repo.get("article", 9).await.unwrap().unwrap();
        assert_eq!(info.like_cnt, 1);
        assert_eq!(info.collect_cnt, 0);
    }
}
