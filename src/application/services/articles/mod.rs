use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::article_cache::ArticleCache;
use crate::application::ports::article_event_publisher::{ArticleEvent, ArticleEventPublisher};
use crate::application::ports::article_repository::{ArticleRepository, ArticleStoreError};
use crate::application::services::background::{BackgroundTasks, run_detached};
use crate::domain::articles::article::{Article, ArticleStatus};

/// Number of drafts held by the first-page cache.
pub const FIRST_PAGE_SIZE: i64 = 100;
/// Drafts at or above this size are never precached.
pub const PRECACHE_MAX_BYTES: usize = 1024 * 1024;

#[derive(thiserror::Error, Debug)]
pub enum ArticleError {
    #[error("article not found")]
    NotFound,
    #[error("article is not owned by the acting author")]
    NotOwned,
    #[error("invalid article status")]
    InvalidStatus,
    #[error("too many requests")]
    Throttled,
    #[error("article storage failure")]
    Storage(#[source] anyhow::Error),
}

impl From<ArticleStoreError> for ArticleError {
    fn from(err: ArticleStoreError) -> Self {
        match err {
            ArticleStoreError::NotFound => ArticleError::NotFound,
            ArticleStoreError::NotOwned => ArticleError::NotOwned,
            ArticleStoreError::InvalidTransition { from, to } => {
                tracing::info!(?from, ?to, "article_status_transition_rejected");
                ArticleError::InvalidStatus
            }
            ArticleStoreError::Storage(e) => ArticleError::Storage(e),
        }
    }
}

/// Draft/published article operations with a cache-aside read path.
///
/// The relational store is the only source of truth. The cache is
/// invalidated and backfilled through [`BackgroundTasks`], so a cache outage
/// only costs latency.
#[derive(Clone)]
pub struct ArticleService {
    store: Arc<dyn ArticleRepository>,
    cache: Arc<dyn ArticleCache>,
    events: Arc<dyn ArticleEventPublisher>,
    tasks: BackgroundTasks,
    list_by_time_timeout: Duration,
}

impl ArticleService {
    pub fn new(
        store: Arc<dyn ArticleRepository>,
        cache: Arc<dyn ArticleCache>,
        events: Arc<dyn ArticleEventPublisher>,
        tasks: BackgroundTasks,
        list_by_time_timeout: Duration,
    ) -> Self {
        Self {
            store,
            cache,
            events,
            tasks,
            list_by_time_timeout,
        }
    }

    pub fn tasks(&self) -> &BackgroundTasks {
        &self.tasks
    }

    /// Saves a draft: always `Unpublished`, inserted when `id == 0`.
    pub async fn save(&self, mut article: Article) -> Result<i64, ArticleError> {
        article.status = ArticleStatus::Unpublished;
        if article.id == 0 {
            self.create(article).await
        } else {
            self.update(article).await
        }
    }

    pub async fn create(&self, article: Article) -> Result<i64, ArticleError> {
        let store = self.store.clone();
        let draft = article.clone();
        let id = run_detached(async move { store.insert(&draft).await })
            .await
            .map_err(ArticleError::Storage)??;
        self.invalidate_drafts(article.author_id, None);
        Ok(id)
    }

    pub async fn update(&self, article: Article) -> Result<i64, ArticleError> {
        let store = self.store.clone();
        let draft = article.clone();
        run_detached(async move { store.update(&draft).await })
            .await
            .map_err(ArticleError::Storage)??;
        self.invalidate_drafts(article.author_id, Some(article.id));
        Ok(article.id)
    }

    /// Marks the article `Published` and syncs it.
    pub async fn publish(&self, mut article: Article) -> Result<i64, ArticleError> {
        article.status = ArticleStatus::Published;
        self.sync(article).await
    }

    /// Writes the draft and the published copy in one transaction.
    pub async fn sync(&self, article: Article) -> Result<i64, ArticleError> {
        if !article.status.is_assignable() {
            return Err(ArticleError::InvalidStatus);
        }
        let store = self.store.clone();
        let draft = article.clone();
        let id = run_detached(async move { store.sync(&draft).await })
            .await
            .map_err(ArticleError::Storage)??;
        self.invalidate_drafts(article.author_id, Some(id));
        self.invalidate_pub(id);
        if article.status.is_published() {
            let events = self.events.clone();
            let event = ArticleEvent::Published {
                article_id: id,
                author_id: article.author_id,
            };
            self.tasks.spawn("article_published_event", async move {
                events.publish(&event).await
            });
        }
        Ok(id)
    }

    pub async fn withdraw(&self, id: i64, author_id: i64) -> Result<(), ArticleError> {
        self.sync_status(id, author_id, ArticleStatus::Private).await
    }

    pub async fn sync_status(
        &self,
        id: i64,
        author_id: i64,
        status: ArticleStatus,
    ) -> Result<(), ArticleError> {
        if status.sync_status_sources().is_empty() {
            return Err(ArticleError::InvalidStatus);
        }
        let store = self.store.clone();
        run_detached(async move { store.sync_status(id, author_id, status).await })
            .await
            .map_err(ArticleError::Storage)??;
        self.invalidate_drafts(author_id, Some(id));
        self.invalidate_pub(id);
        Ok(())
    }

    pub async fn get_draft(&self, id: i64) -> Result<Article, ArticleError> {
        match self.cache.get_draft(id).await {
            Ok(Some(article)) => return Ok(article),
            Ok(None) => tracing::debug!(article_id = id, "article_draft_cache_miss"),
            Err(err) => tracing::warn!(article_id = id, error = ?err, "article_draft_cache_get_failed"),
        }
        let article = self
            .store
            .get_draft(id)
            .await
            .map_err(ArticleError::Storage)?
            .ok_or(ArticleError::NotFound)?;
        let cache = self.cache.clone();
        let cached = article.clone();
        self.tasks.spawn("article_draft_cache_set", async move {
            cache.set_draft(&cached).await
        });
        Ok(article)
    }

    /// Published copy, visible only while its status is `Published`.
    pub async fn get_pub(&self, id: i64) -> Result<Article, ArticleError> {
        match self.cache.get_pub(id).await {
            Ok(Some(article)) if article.status.is_published() => return Ok(article),
            Ok(_) => tracing::debug!(article_id = id, "article_pub_cache_miss"),
            Err(err) => tracing::warn!(article_id = id, error = ?err, "article_pub_cache_get_failed"),
        }
        let article = self
            .store
            .get_pub(id)
            .await
            .map_err(ArticleError::Storage)?
            .ok_or(ArticleError::NotFound)?;
        let cache = self.cache.clone();
        let cached = article.clone();
        self.tasks.spawn("article_pub_cache_set", async move {
            cache.set_pub(&cached).await
        });
        Ok(article)
    }

    /// Author's drafts as abstracts, most recently updated first. Use
    /// [`Self::get_draft`] for full content.
    ///
    /// Requests for the first page (`offset == 0`, `0 < limit <= 100`) go
    /// through the first-page cache. Every other request reads storage
    /// directly and leaves the cache alone.
    pub async fn list_author_draft(
        &self,
        author_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Article>, ArticleError> {
        let first_page = offset == 0 && limit > 0 && limit <= FIRST_PAGE_SIZE;
        if !first_page {
            let page = self
                .store
                .list_drafts_by_author(author_id, limit, offset)
                .await
                .map_err(ArticleError::Storage)?;
            return Ok(page.iter().map(Article::abstracted).collect());
        }

        match self.cache.get_first_page(author_id).await {
            Ok(Some(page)) => {
                tracing::debug!(author_id, "article_first_page_cache_hit");
                return Ok(page.into_iter().take(limit as usize).collect());
            }
            Ok(None) => tracing::debug!(author_id, "article_first_page_cache_miss"),
            Err(err) => {
                tracing::warn!(author_id, error = ?err, "article_first_page_cache_get_failed")
            }
        }

        let page = self
            .store
            .list_drafts_by_author(author_id, FIRST_PAGE_SIZE, 0)
            .await
            .map_err(ArticleError::Storage)?;
        let abstracts: Vec<Article> = page.iter().map(Article::abstracted).collect();
        self.backfill_first_page(author_id, &page, &abstracts);
        Ok(abstracts.into_iter().take(limit as usize).collect())
    }

    pub async fn list_author_pub(
        &self,
        author_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Article>, ArticleError> {
        self.store
            .list_pub_by_author(author_id, limit, offset)
            .await
            .map_err(ArticleError::Storage)
    }

    /// Published articles last updated before `cutoff_ms`. Meant for
    /// best-effort sweeps, so it is bounded by a short hard timeout.
    pub async fn list_by_time(
        &self,
        cutoff_ms: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Article>, ArticleError> {
        match tokio::time::timeout(
            self.list_by_time_timeout,
            self.store.list_pub_before(cutoff_ms, limit, offset),
        )
        .await
        {
            Ok(res) => res.map_err(ArticleError::Storage),
            Err(_) => Err(ArticleError::Storage(anyhow::anyhow!(
                "list_by_time timed out after {:?}",
                self.list_by_time_timeout
            ))),
        }
    }

    /// Forwards a `Read` event in the background.
    pub fn notify_read(&self, uid: i64, article_id: i64) {
        let events = self.events.clone();
        self.tasks.spawn("article_read_event", async move {
            events.publish(&ArticleEvent::Read { uid, article_id }).await
        });
    }

    fn backfill_first_page(&self, author_id: i64, page: &[Article], abstracts: &[Article]) {
        let abstracts = abstracts.to_vec();
        let cache = self.cache.clone();
        self.tasks.spawn("article_first_page_cache_set", async move {
            cache.set_first_page(author_id, &abstracts).await
        });

        // The newest draft is the one most likely to be opened next.
        if let Some(newest) = page.first() {
            if newest.content.len() < PRECACHE_MAX_BYTES {
                let cache = self.cache.clone();
                let draft = newest.clone();
                self.tasks.spawn("article_draft_precache", async move {
                    cache.set_draft(&draft).await
                });
            }
        }
    }

    fn invalidate_drafts(&self, author_id: i64, article_id: Option<i64>) {
        let cache = self.cache.clone();
        self.tasks.spawn("article_first_page_cache_del", async move {
            cache.del_first_page(author_id).await
        });
        if let Some(id) = article_id {
            let cache = self.cache.clone();
            self.tasks.spawn("article_draft_cache_del", async move {
                cache.del_draft(id).await
            });
        }
    }

    fn invalidate_pub(&self, article_id: i64) {
        let cache = self.cache.clone();
        self.tasks.spawn("article_pub_cache_del", async move {
            cache.del_pub(article_id).await
        });
    }
}
