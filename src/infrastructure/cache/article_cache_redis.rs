use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use redis::aio::ConnectionManager;

use crate::application::ports::article_cache::ArticleCache;
use crate::domain::articles::article::Article;
use crate::infrastructure::cache::{
    DRAFT_TTL, FIRST_PAGE_TTL, PUB_TTL, draft_key, first_page_key, pub_key,
};

/// JSON-encoded article entries in redis. Keys and TTLs are shared with the
/// in-memory cache.
#[derive(Clone)]
pub struct RedisArticleCache {
    conn: ConnectionManager,
}

impl RedisArticleCache {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, key: &str) -> anyhow::Result<Option<T>> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = redis::cmd("GET")
            .arg(key)
            .query_async(&mut conn)
            .await
            .context("redis_get")?;
        match raw {
            Some(raw) => Ok(Some(
                serde_json::from_str(&raw).context("article_cache_decode")?,
            )),
            None => Ok(None),
        }
    }

    async fn set_json<T: serde::Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> anyhow::Result<()> {
        let payload = serde_json::to_string(value).context("article_cache_encode")?;
        let mut conn = self.conn.clone();
        let _: () = redis::cmd("SET")
            .arg(key)
            .arg(payload)
            .arg("PX")
            .arg(ttl.as_millis() as u64)
            .query_async(&mut conn)
            .await
            .context("redis_set")?;
        Ok(())
    }

    async fn del(&self, key: &str) -> anyhow::Result<()> {
        let mut conn = self.conn.clone();
        let _: i64 = redis::cmd("DEL")
            .arg(key)
            .query_async(&mut conn)
            .await
            .context("redis_del")?;
        Ok(())
    }
}

#[async_trait]
impl ArticleCache for RedisArticleCache {
    async fn get_first_page(&self, author_id: i64) -> anyhow::Result<Option<Vec<Article>>> {
        self.get_json(&first_page_key(author_id)).await
    }

    async fn set_first_page(&self, author_id: i64, page: &[Article]) -> anyhow::Result<()> {
        self.set_json(&first_page_key(author_id), page, FIRST_PAGE_TTL)
            .await
    }

    async fn del_first_page(&self, author_id: i64) -> anyhow::Result<()> {
        self.del(&first_page_key(author_id)).await
    }

    async fn get_draft(&self, id: i64) -> anyhow::Result<Option<Article>> {
        self.get_json(&draft_key(id)).await
    }

    async fn set_draft(&self, article: &Article) -> anyhow::Result<()> {
        self.set_json(&draft_key(article.id), article, DRAFT_TTL).await
    }

    async fn del_draft(&self, id: i64) -> anyhow::Result<()> {
        self.del(&draft_key(id)).await
    }

    async fn get_pub(&self, id: i64) -> anyhow::Result<Option<Article>> {
        self.get_json(&pub_key(id)).await
    }

    async fn set_pub(&self, article: &Article) -> anyhow::Result<()> {
        self.set_json(&pub_key(article.id), article, PUB_TTL).await
    }

    async fn del_pub(&self, id: i64) -> anyhow::Result<()> {
        self.del(&pub_key(id)).await
    }
}
