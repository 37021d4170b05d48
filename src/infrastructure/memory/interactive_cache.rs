use std::sync::Arc;

use async_trait::async_trait;

use crate::application::ports::interactive_cache::InteractiveCache;
use crate::domain::interactions::interactive::{CounterField, Interactive};
use crate::infrastructure::cache::{INTERACTIVE_TTL, interactive_key};
use crate::infrastructure::memory::kv::MemoryKv;

pub struct MemoryInteractiveCache {
    kv: Arc<MemoryKv>,
}

impl MemoryInteractiveCache {
    pub fn new(kv: Arc<MemoryKv>) -> Self {
        Self { kv }
    }
}

#[async_trait]
impl InteractiveCache for MemoryInteractiveCache {
    async fn incr_if_present(
        &self,
        biz: &str,
        biz_id: i64,
        field: CounterField,
        delta: i64,
    ) -> anyhow::Result<bool> {
        Ok(self
            .kv
            .hincr_if_present(&interactive_key(biz, biz_id), field.as_str(), delta)
            .await)
    }

    async fn get(&self, biz: &str, biz_id: i64) -> anyhow::Result<Option<Interactive>> {
        let Some(fields) = self.kv.hgetall(&interactive_key(biz, biz_id)).await else {
            return Ok(None);
        };
        let count = |field: CounterField| fields.get(field.as_str()).copied().unwrap_or(0);
        Ok(Some(Interactive {
            read_cnt: count(CounterField::Read),
            like_cnt: count(CounterField::Like),
            collect_cnt: count(CounterField::Collect),
            ..Interactive::empty(biz, biz_id)
        }))
    }

    async fn set(&self, info: &Interactive) -> anyhow::Result<()> {
        let fields = [
            (CounterField::Read.as_str(), info.read_cnt),
            (CounterField::Like.as_str(), info.like_cnt),
            (CounterField::Collect.as_str(), info.collect_cnt),
        ];
        self.kv
            .hset(&interactive_key(&info.biz, info.biz_id), &fields, INTERACTIVE_TTL)
            .await;
        Ok(())
    }
}
