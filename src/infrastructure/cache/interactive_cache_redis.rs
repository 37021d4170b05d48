use std::collections::HashMap;

use anyhow::Context;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use redis::aio::ConnectionManager;

use crate::application::ports::interactive_cache::InteractiveCache;
use crate::domain::interactions::interactive::{CounterField, Interactive};
use crate::infrastructure::cache::{INTERACTIVE_TTL, interactive_key};

static INCR_CNT: Lazy<redis::Script> =
    Lazy::new(|| redis::Script::new(include_str!("lua/incr_cnt.lua")));

/// Counters kept as a redis hash (`read_cnt`, `like_cnt`, `collect_cnt`).
#[derive(Clone)]
pub struct RedisInteractiveCache {
    conn: ConnectionManager,
}

impl RedisInteractiveCache {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl InteractiveCache for RedisInteractiveCache {
    async fn incr_if_present(
        &self,
        biz: &str,
        biz_id: i64,
        field: CounterField,
        delta: i64,
    ) -> anyhow::Result<bool> {
        let mut conn = self.conn.clone();
        let applied: i64 = INCR_CNT
            .key(interactive_key(biz, biz_id))
            .arg(field.as_str())
            .arg(delta)
            .invoke_async(&mut conn)
            .await
            .context("redis_incr_cnt_script")?;
        Ok(applied == 1)
    }

    async fn get(&self, biz: &str, biz_id: i64) -> anyhow::Result<Option<Interactive>> {
        let mut conn = self.conn.clone();
        let fields: HashMap<String, i64> = redis::cmd("HGETALL")
            .arg(interactive_key(biz, biz_id))
            .query_async(&mut conn)
            .await
            .context("redis_hgetall")?;
        if fields.is_empty() {
            return Ok(None);
        }
        let count = |field: CounterField| fields.get(field.as_str()).copied().unwrap_or(0);
        Ok(Some(Interactive {
            read_cnt: count(CounterField::Read),
            like_cnt: count(CounterField::Like),
            collect_cnt: count(CounterField::Collect),
            ..Interactive::empty(biz, biz_id)
        }))
    }

    async fn set(&self, info: &Interactive) -> anyhow::Result<()> {
        let key = interactive_key(&info.biz, info.biz_id);
        let mut conn = self.conn.clone();
        let _: () = redis::pipe()
            .atomic()
            .cmd("HSET")
            .arg(&key)
            .arg(CounterField::Read.as_str())
            .arg(info.read_cnt)
            .arg(CounterField::Like.as_str())
            .arg(info.like_cnt)
            .arg(CounterField::Collect.as_str())
            .arg(info.collect_cnt)
            .ignore()
            .cmd("EXPIRE")
            .arg(&key)
            .arg(INTERACTIVE_TTL.as_secs())
            .ignore()
            .query_async(&mut conn)
            .await
            .context("redis_interactive_set")?;
        Ok(())
    }
}
