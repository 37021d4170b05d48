use async_trait::async_trait;

use crate::domain::articles::article::Article;

/// Derived, TTL-bound copies of article reads. Never authoritative: every
/// method may fail or miss and callers fall back to the relational store.
#[async_trait]
pub trait ArticleCache: Send + Sync {
    async fn get_first_page(&self, author_id: i64) -> anyhow::Result<Option<Vec<Article>>>;
    async fn set_first_page(&self, author_id: i64, page: &[Article]) -> anyhow::Result<()>;
    async fn del_first_page(&self, author_id: i64) -> anyhow::Result<()>;

    async fn get_draft(&self, id: i64) -> anyhow::Result<Option<Article>>;
    async fn set_draft(&self, article: &Article) -> anyhow::Result<()>;
    async fn del_draft(&self, id: i64) -> anyhow::Result<()>;

    async fn get_pub(&self, id: i64) -> anyhow::Result<Option<Article>>;
    async fn set_pub(&self, article: &Article) -> anyhow::Result<()>;
    async fn del_pub(&self, id: i64) -> anyhow::Result<()>;
}
