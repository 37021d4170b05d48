use anyhow::Context;
use async_trait::async_trait;
use sqlx::Row;

use crate::application::ports::interactive_repository::InteractiveRepository;
use crate::domain::interactions::interactive::{ActionOutcome, Interactive, Reaction, RecordStatus};
use crate::infrastructure::db::{PgPool, now_millis};

fn records_table(reaction: Reaction) -> &'static str {
    match reaction {
        Reaction::Like => "like_records",
        Reaction::Collect => "collect_records",
    }
}

pub struct SqlxInteractiveRepository {
    pub pool: PgPool,
}

impl SqlxInteractiveRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InteractiveRepository for SqlxInteractiveRepository {
    async fn incr_read_cnt(&self, biz: &str, biz_id: i64) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO interactives (biz, biz_id, read_cnt, create_time, update_time)
             VALUES ($1, $2, 1, $3, $3)
             ON CONFLICT (biz, biz_id) DO UPDATE
                 SET read_cnt = interactives.read_cnt + 1, update_time = EXCLUDED.update_time",
        )
        .bind(biz)
        .bind(biz_id)
        .bind(now_millis())
        .execute(&self.pool)
        .await
        .context("interactive_incr_read_cnt")?;
        Ok(())
    }

    async fn add_reaction(
        &self,
        reaction: Reaction,
        uid: i64,
        biz: &str,
        biz_id: i64,
    ) -> anyhow::Result<ActionOutcome> {
        let table = records_table(reaction);
        let column = reaction.counter().as_str();
        let now = now_millis();
        let mut tx = self.pool.begin().await.context("reaction_add_begin")?;

        // Re-activating a cancelled record counts; an active one conflicts.
        let res = sqlx::query(&format!(
            "INSERT INTO {table} (uid, biz, biz_id, status, create_time, update_time)
             VALUES ($1, $2, $3, $4, $5, $5)
             ON CONFLICT (uid, biz, biz_id) DO UPDATE
                 SET status = EXCLUDED.status, update_time = EXCLUDED.update_time
                 WHERE {table}.status <> EXCLUDED.status"
        ))
        .bind(uid)
        .bind(biz)
        .bind(biz_id)
        .bind(RecordStatus::Active.as_i16())
        .bind(now)
        .execute(&mut *tx)
        .await
        .context("reaction_record_upsert")?;
        if res.rows_affected() == 0 {
            tx.rollback().await.context("reaction_add_rollback")?;
            return Ok(ActionOutcome::Duplicate);
        }

        sqlx::query(&format!(
            "INSERT INTO interactives (biz, biz_id, {column}, create_time, update_time)
             VALUES ($1, $2, 1, $3, $3)
             ON CONFLICT (biz, biz_id) DO UPDATE
                 SET {column} = interactives.{column} + 1, update_time = EXCLUDED.update_time"
        ))
        .bind(biz)
        .bind(biz_id)
        .bind(now)
        .execute(&mut *tx)
        .await
        .context("interactive_counter_incr")?;
        tx.commit().await.context("reaction_add_commit")?;
        Ok(ActionOutcome::Applied)
    }

    async fn cancel_reaction(
        &self,
        reaction: Reaction,
        uid: i64,
        biz: &str,
        biz_id: i64,
    ) -> anyhow::Result<ActionOutcome> {
        let table = records_table(reaction);
        let column = reaction.counter().as_str();
        let now = now_millis();
        let mut tx = self.pool.begin().await.context("reaction_cancel_begin")?;

        let res = sqlx::query(&format!(
            "UPDATE {table} SET status = $1, update_time = $2
             WHERE uid = $3 AND biz = $4 AND biz_id = $5 AND status = $6"
        ))
        .bind(RecordStatus::Cancelled.as_i16())
        .bind(now)
        .bind(uid)
        .bind(biz)
        .bind(biz_id)
        .bind(RecordStatus::Active.as_i16())
        .execute(&mut *tx)
        .await
        .context("reaction_record_cancel")?;
        if res.rows_affected() == 0 {
            tx.rollback().await.context("reaction_cancel_rollback")?;
            return Ok(ActionOutcome::Duplicate);
        }

        sqlx::query(&format!(
            "UPDATE interactives SET {column} = {column} - 1, update_time = $1
             WHERE biz = $2 AND biz_id = $3 AND {column} > 0"
        ))
        .bind(now)
        .bind(biz)
        .bind(biz_id)
        .execute(&mut *tx)
        .await
        .context("interactive_counter_decr")?;
        tx.commit().await.context("reaction_cancel_commit")?;
        Ok(ActionOutcome::Applied)
    }

    async fn get(&self, biz: &str, biz_id: i64) -> anyhow::Result<Option<Interactive>> {
        let row = sqlx::query(
            "SELECT read_cnt, like_cnt, collect_cnt FROM interactives WHERE biz = $1 AND biz_id = $2",
        )
        .bind(biz)
        .bind(biz_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|r| Interactive {
            read_cnt: r.get("read_cnt"),
            like_cnt: r.get("like_cnt"),
            collect_cnt: r.get("collect_cnt"),
            ..Interactive::empty(biz, biz_id)
        }))
    }

    async fn has_reaction(
        &self,
        reaction: Reaction,
        uid: i64,
        biz: &str,
        biz_id: i64,
    ) -> anyhow::Result<bool> {
        let table = records_table(reaction);
        let found = sqlx::query_scalar::<_, bool>(&format!(
            "SELECT EXISTS(SELECT 1 FROM {table} WHERE uid = $1 AND biz = $2 AND biz_id = $3 AND status = $4)"
        ))
        .bind(uid)
        .bind(biz)
        .bind(biz_id)
        .bind(RecordStatus::Active.as_i16())
        .fetch_one(&self.pool)
        .await?;
        Ok(found)
    }
}
