use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;

use crate::application::ports::article_cache::ArticleCache;
use crate::domain::articles::article::Article;
use crate::infrastructure::cache::{
    DRAFT_TTL, FIRST_PAGE_TTL, PUB_TTL, draft_key, first_page_key, pub_key,
};
use crate::infrastructure::memory::kv::MemoryKv;

pub struct MemoryArticleCache {
    kv: Arc<MemoryKv>,
}

impl MemoryArticleCache {
    pub fn new(kv: Arc<MemoryKv>) -> Self {
        Self { kv }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, key: &str) -> anyhow::Result<Option<T>> {
        match self.kv.get(key).await {
            Some(raw) => Ok(Some(
                serde_json::from_str(&raw).context("article_cache_decode")?,
            )),
            None => Ok(None),
        }
    }

    async fn set_json<T: serde::Serialize + ?Sized>(
        &self,
        key: String,
        value: &T,
        ttl: Duration,
    ) -> anyhow::Result<()> {
        let payload = serde_json::to_string(value).context("article_cache_encode")?;
        self.kv.set(key, payload, ttl).await;
        Ok(())
    }
}

#[async_trait]
impl ArticleCache for MemoryArticleCache {
    async fn get_first_page(&self, author_id: i64) -> anyhow::Result<Option<Vec<Article>>> {
        self.get_json(&first_page_key(author_id)).await
    }

    async fn set_first_page(&self, author_id: i64, page: &[Article]) -> anyhow::Result<()> {
        self.set_json(first_page_key(author_id), page, FIRST_PAGE_TTL)
            .await
    }

    async fn del_first_page(&self, author_id: i64) -> anyhow::Result<()> {
        self.kv.del(&first_page_key(author_id)).await;
        Ok(())
    }

    async fn get_draft(&self, id: i64) -> anyhow::Result<Option<Article>> {
        self.get_json(&draft_key(id)).await
    }

    async fn set_draft(&self, article: &Article) -> anyhow::Result<()> {
        self.set_json(draft_key(article.id), article, DRAFT_TTL).await
    }

    async fn del_draft(&self, id: i64) -> anyhow::Result<()> {
        self.kv.del(&draft_key(id)).await;
        Ok(())
    }

    async fn get_pub(&self, id: i64) -> anyhow::Result<Option<Article>> {
        self.get_json(&pub_key(id)).await
    }

    async fn set_pub(&self, article: &Article) -> anyhow::Result<()> {
        self.set_json(pub_key(article.id), article, PUB_TTL).await
    }

    async fn del_pub(&self, id: i64) -> anyhow::Result<()> {
        self.kv.del(&pub_key(id)).await;
        Ok(())
    }
}
