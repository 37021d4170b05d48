use async_trait::async_trait;

use crate::domain::articles::article::{Article, ArticleStatus};

#[derive(thiserror::Error, Debug)]
pub enum ArticleStoreError {
    #[error("article not found")]
    NotFound,
    #[error("article is not owned by the acting author")]
    NotOwned,
    #[error("article cannot move from {from:?} to {to:?}")]
    InvalidTransition {
        from: ArticleStatus,
        to: ArticleStatus,
    },
    #[error("article storage failure")]
    Storage(#[from] anyhow::Error),
}

/// Relational store holding the draft table and the published table.
///
/// Only the article service writes through this port. Every write touching
/// both tables runs in one transaction.
#[async_trait]
pub trait ArticleRepository: Send + Sync {
    /// Inserts a draft; `id` and both timestamps are assigned by the store.
    async fn insert(&self, article: &Article) -> Result<i64, ArticleStoreError>;

    /// Updates title/content/status filtered by `id AND author_id`.
    async fn update(&self, article: &Article) -> Result<(), ArticleStoreError>;

    /// Inserts or updates the draft, then upserts the published copy, atomically.
    async fn sync(&self, article: &Article) -> Result<i64, ArticleStoreError>;

    /// Sets the draft status (ownership checked), then mirrors it onto the
    /// published copy, atomically. The draft's current status must be one of
    /// `status.sync_status_sources()`, else `InvalidTransition`.
    async fn sync_status(
        &self,
        id: i64,
        author_id: i64,
        status: ArticleStatus,
    ) -> Result<(), ArticleStoreError>;

    async fn get_draft(&self, id: i64) -> anyhow::Result<Option<Article>>;

    /// Only rows whose status is `Published` are visible.
    async fn get_pub(&self, id: i64) -> anyhow::Result<Option<Article>>;

    /// Most recently updated first.
    async fn list_drafts_by_author(
        &self,
        author_id: i64,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<Article>>;

    /// Published rows only, most recently updated first.
    async fn list_pub_by_author(
        &self,
        author_id: i64,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<Article>>;

    /// Published rows with `update_time < cutoff_ms`, most recently updated first.
    async fn list_pub_before(
        &self,
        cutoff_ms: i64,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<Article>>;
}
