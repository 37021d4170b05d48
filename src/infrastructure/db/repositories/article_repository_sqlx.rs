use anyhow::Context;
use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, Row};

use crate::application::ports::article_repository::{ArticleRepository, ArticleStoreError};
use crate::domain::articles::article::{Article, ArticleStatus};
use crate::infrastructure::db::{PgPool, now_millis};

const COLUMNS: &str = "id, title, content, author_id, status, create_time, update_time";

pub struct SqlxArticleRepository {
    pub pool: PgPool,
}

impl SqlxArticleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn list(
        &self,
        sql: &str,
        key: i64,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<Article>> {
        let rows = sqlx::query(sql)
            .bind(key)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(row_to_article).collect())
    }
}

fn row_to_article(r: &PgRow) -> Article {
    Article {
        id: r.get("id"),
        title: r.get("title"),
        content: r.get("content"),
        author_id: r.get("author_id"),
        status: ArticleStatus::from_i16(r.get("status")),
        create_time: r.get("create_time"),
        update_time: r.get("update_time"),
    }
}

async fn insert_draft(conn: &mut PgConnection, article: &Article, now: i64) -> anyhow::Result<i64> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO articles (title, content, author_id, status, create_time, update_time)
         VALUES ($1, $2, $3, $4, $5, $5) RETURNING id",
    )
    .bind(&article.title)
    .bind(&article.content)
    .bind(article.author_id)
    .bind(article.status.as_i16())
    .bind(now)
    .fetch_one(&mut *conn)
    .await
    .context("article_insert")?;
    Ok(id)
}

/// Zero affected rows means either a missing id or a foreign author; the
/// existence probe tells them apart.
async fn ownership_error(conn: &mut PgConnection, id: i64) -> ArticleStoreError {
    let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM articles WHERE id = $1)")
        .bind(id)
        .fetch_one(&mut *conn)
        .await;
    match exists {
        Ok(true) => ArticleStoreError::NotOwned,
        Ok(false) => ArticleStoreError::NotFound,
        Err(e) => ArticleStoreError::Storage(anyhow::Error::new(e).context("article_exists")),
    }
}

/// Explains a zero-row status update: missing, foreign, or not in a status
/// the target can be reached from.
async fn status_update_error(
    conn: &mut PgConnection,
    id: i64,
    author_id: i64,
    to: ArticleStatus,
) -> ArticleStoreError {
    let row = sqlx::query_as::<_, (i64, i16)>("SELECT author_id, status FROM articles WHERE id = $1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await;
    match row {
        Ok(None) => ArticleStoreError::NotFound,
        Ok(Some((owner, _))) if owner != author_id => ArticleStoreError::NotOwned,
        Ok(Some((_, from))) => ArticleStoreError::InvalidTransition {
            from: ArticleStatus::from_i16(from),
            to,
        },
        Err(e) => ArticleStoreError::Storage(anyhow::Error::new(e).context("article_status_probe")),
    }
}

async fn update_owned(
    conn: &mut PgConnection,
    article: &Article,
    now: i64,
) -> Result<(), ArticleStoreError> {
    let res = sqlx::query(
        "UPDATE articles SET title = $1, content = $2, status = $3, update_time = $4
         WHERE id = $5 AND author_id = $6",
    )
    .bind(&article.title)
    .bind(&article.content)
    .bind(article.status.as_i16())
    .bind(now)
    .bind(article.id)
    .bind(article.author_id)
    .execute(&mut *conn)
    .await
    .context("article_update")?;
    if res.rows_affected() != 1 {
        return Err(ownership_error(conn, article.id).await);
    }
    Ok(())
}

#[async_trait]
impl ArticleRepository for SqlxArticleRepository {
    async fn insert(&self, article: &Article) -> Result<i64, ArticleStoreError> {
        let mut conn = self.pool.acquire().await.context("article_acquire")?;
        Ok(insert_draft(&mut conn, article, now_millis()).await?)
    }

    async fn update(&self, article: &Article) -> Result<(), ArticleStoreError> {
        let mut conn = self.pool.acquire().await.context("article_acquire")?;
        update_owned(&mut conn, article, now_millis()).await
    }

    async fn sync(&self, article: &Article) -> Result<i64, ArticleStoreError> {
        let now = now_millis();
        let mut tx = self.pool.begin().await.context("article_sync_begin")?;
        let id = if article.id == 0 {
            insert_draft(&mut tx, article, now).await?
        } else {
            update_owned(&mut tx, article, now).await?;
            article.id
        };
        sqlx::query(
            "INSERT INTO published_articles (id, title, content, author_id, status, create_time, update_time)
             VALUES ($1, $2, $3, $4, $5, $6, $6)
             ON CONFLICT (id) DO UPDATE SET title = EXCLUDED.title, content = EXCLUDED.content,
                 status = EXCLUDED.status, update_time = EXCLUDED.update_time",
        )
        .bind(id)
        .bind(&article.title)
        .bind(&article.content)
        .bind(article.author_id)
        .bind(article.status.as_i16())
        .bind(now)
        .execute(&mut *tx)
        .await
        .context("published_article_upsert")?;
        tx.commit().await.context("article_sync_commit")?;
        Ok(id)
    }

    async fn sync_status(
        &self,
        id: i64,
        author_id: i64,
        status: ArticleStatus,
    ) -> Result<(), ArticleStoreError> {
        let now = now_millis();
        let sources: Vec<i16> = status
            .sync_status_sources()
            .iter()
            .map(|s| s.as_i16())
            .collect();
        let mut tx = self.pool.begin().await.context("article_sync_status_begin")?;
        let res = sqlx::query(
            "UPDATE articles SET status = $1, update_time = $2
             WHERE id = $3 AND author_id = $4 AND status = ANY($5)",
        )
        .bind(status.as_i16())
        .bind(now)
        .bind(id)
        .bind(author_id)
        .bind(sources)
        .execute(&mut *tx)
        .await
        .context("article_status_update")?;
        if res.rows_affected() != 1 {
            let err = status_update_error(&mut tx, id, author_id, status).await;
            tx.rollback().await.context("article_sync_status_rollback")?;
            return Err(err);
        }
        sqlx::query("UPDATE published_articles SET status = $1, update_time = $2 WHERE id = $3")
            .bind(status.as_i16())
            .bind(now)
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("published_article_status_update")?;
        tx.commit().await.context("article_sync_status_commit")?;
        Ok(())
    }

    async fn get_draft(&self, id: i64) -> anyhow::Result<Option<Article>> {
        let row = sqlx::query(&format!("SELECT {COLUMNS} FROM articles WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(row_to_article))
    }

    async fn get_pub(&self, id: i64) -> anyhow::Result<Option<Article>> {
        let row = sqlx::query(&format!(
            "SELECT {COLUMNS} FROM published_articles WHERE id = $1 AND status = $2"
        ))
        .bind(id)
        .bind(ArticleStatus::Published.as_i16())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(row_to_article))
    }

    async fn list_drafts_by_author(
        &self,
        author_id: i64,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<Article>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM articles WHERE author_id = $1
             ORDER BY update_time DESC, id DESC LIMIT $2 OFFSET $3"
        );
        self.list(&sql, author_id, limit, offset).await
    }

    async fn list_pub_by_author(
        &self,
        author_id: i64,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<Article>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM published_articles WHERE author_id = $1 AND status = {}
             ORDER BY update_time DESC, id DESC LIMIT $2 OFFSET $3",
            ArticleStatus::Published.as_i16()
        );
        self.list(&sql, author_id, limit, offset).await
    }

    async fn list_pub_before(
        &self,
        cutoff_ms: i64,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<Article>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM published_articles WHERE update_time < $1 AND status = {}
             ORDER BY update_time DESC, id DESC LIMIT $2 OFFSET $3",
            ArticleStatus::Published.as_i16()
        );
        self.list(&sql, cutoff_ms, limit, offset).await
    }
}
