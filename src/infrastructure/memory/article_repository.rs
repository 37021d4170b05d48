use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::application::ports::article_repository::{ArticleRepository, ArticleStoreError};
use crate::domain::articles::article::{Article, ArticleStatus};

#[derive(Default)]
struct Tables {
    drafts: BTreeMap<i64, Article>,
    published: BTreeMap<i64, Article>,
    next_id: i64,
    last_ms: i64,
}

impl Tables {
    /// Wall clock in ms, forced strictly increasing so recency order is total.
    fn now(&mut self) -> i64 {
        let now = chrono::Utc::now().timestamp_millis().max(self.last_ms + 1);
        self.last_ms = now;
        now
    }

    fn insert_draft(&mut self, article: &Article) -> i64 {
        self.next_id += 1;
        let now = self.now();
        let id = self.next_id;
        self.drafts.insert(
            id,
            Article {
                id,
                create_time: now,
                update_time: now,
                ..article.clone()
            },
        );
        id
    }

    fn owned_draft(&mut self, id: i64, author_id: i64) -> Result<&mut Article, ArticleStoreError> {
        match self.drafts.get_mut(&id) {
            None => Err(ArticleStoreError::NotFound),
            Some(draft) if draft.author_id != author_id => Err(ArticleStoreError::NotOwned),
            Some(draft) => Ok(draft),
        }
    }

    fn update_draft(&mut self, article: &Article) -> Result<(), ArticleStoreError> {
        let now = self.now();
        let draft = self.owned_draft(article.id, article.author_id)?;
        draft.title = article.title.clone();
        draft.content = article.content.clone();
        draft.status = article.status;
        draft.update_time = now;
        Ok(())
    }
}

fn page<'a>(rows: impl Iterator<Item = &'a Article>, limit: i64, offset: i64) -> Vec<Article> {
    let mut rows: Vec<&Article> = rows.collect();
    rows.sort_by(|a, b| {
        b.update_time
            .cmp(&a.update_time)
            .then_with(|| b.id.cmp(&a.id))
    });
    rows.into_iter()
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .cloned()
        .collect()
}

/// Draft and published tables behind one lock; `sync` and `sync_status`
/// apply both tables inside the same critical section.
#[derive(Default)]
pub struct MemoryArticleRepository {
    tables: Mutex<Tables>,
}

impl MemoryArticleRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ArticleRepository for MemoryArticleRepository {
    async fn insert(&self, article: &Article) -> Result<i64, ArticleStoreError> {
        Ok(self.tables.lock().await.insert_draft(article))
    }

    async fn update(&self, article: &Article) -> Result<(), ArticleStoreError> {
        self.tables.lock().await.update_draft(article)
    }

    async fn sync(&self, article: &Article) -> Result<i64, ArticleStoreError> {
        let mut tables = self.tables.lock().await;
        let id = if article.id == 0 {
            tables.insert_draft(article)
        } else {
            tables.update_draft(article)?;
            article.id
        };
        let now = tables.now();
        match tables.published.get_mut(&id) {
            Some(published) => {
                published.title = article.title.clone();
                published.content = article.content.clone();
                published.status = article.status;
                published.update_time = now;
            }
            None => {
                tables.published.insert(
                    id,
                    Article {
                        id,
                        create_time: now,
                        update_time: now,
                        ..article.clone()
                    },
                );
            }
        }
        Ok(id)
    }

    async fn sync_status(
        &self,
        id: i64,
        author_id: i64,
        status: ArticleStatus,
    ) -> Result<(), ArticleStoreError> {
        let mut tables = self.tables.lock().await;
        let now = tables.now();
        let draft = tables.owned_draft(id, author_id)?;
        if !draft.status.can_transition_to(status) {
            return Err(ArticleStoreError::InvalidTransition {
                from: draft.status,
                to: status,
            });
        }
        draft.status = status;
        draft.update_time = now;
        if let Some(published) = tables.published.get_mut(&id) {
            published.status = status;
            published.update_time = now;
        }
        Ok(())
    }

    async fn get_draft(&self, id: i64) -> anyhow::Result<Option<Article>> {
        Ok(self.tables.lock().await.drafts.get(&id).cloned())
    }

    async fn get_pub(&self, id: i64) -> anyhow::Result<Option<Article>> {
        Ok(self
            .tables
            .lock()
            .await
            .published
            .get(&id)
            .filter(|a| a.status.is_published())
            .cloned())
    }

    async fn list_drafts_by_author(
        &self,
        author_id: i64,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<Article>> {
        let tables = self.tables.lock().await;
        let rows = tables.drafts.values().filter(|a| a.author_id == author_id);
        Ok(page(rows, limit, offset))
    }

    async fn list_pub_by_author(
        &self,
        author_id: i64,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<Article>> {
        let tables = self.tables.lock().await;
        let rows = tables
            .published
            .values()
            .filter(|a| a.author_id == author_id && a.status.is_published());
        Ok(page(rows, limit, offset))
    }

    async fn list_pub_before(
        &self,
        cutoff_ms: i64,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<Article>> {
        let tables = self.tables.lock().await;
        let rows = tables
            .published
            .values()
            .filter(|a| a.status.is_published() && a.update_time < cutoff_ms);
        Ok(page(rows, limit, offset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn foreign_sync_leaves_both_tables_untouched() {
        let repo = MemoryArticleRepository::new();
        let mut art = Article::new_draft(1, "t", "c");
        art.status = ArticleStatus::Published;
        let id = repo.sync(&art).await.unwrap();

        let mut hijack = Article::new_draft(2, "x", "x");
        hijack.id = id;
        hijack.status = ArticleStatus::Published;
        let err = repo.sync(&hijack).await.unwrap_err();
        assert!(matches!(err, ArticleStoreError::NotOwned));

        assert_eq!(repo.get_draft(id).await.unwrap().unwrap().title, "t");
        assert_eq!(repo.get_pub(id).await.unwrap().unwrap().title, "t");
    }

    #[tokio::test]
    async fn sync_status_never_creates_or_revives_a_published_copy() {
        let repo = MemoryArticleRepository::new();
        let mut draft = Article::new_draft(1, "t", "c");
        draft.status = ArticleStatus::Unpublished;
        let id = repo.insert(&draft).await.unwrap();

        for target in [ArticleStatus::Published, ArticleStatus::Private] {
            let err = repo.sync_status(id, 1, target).await.unwrap_err();
            assert!(matches!(
                err,
                ArticleStoreError::InvalidTransition {
                    from: ArticleStatus::Unpublished,
                    ..
                }
            ));
        }
        assert_eq!(
            repo.get_draft(id).await.unwrap().unwrap().status,
            ArticleStatus::Unpublished
        );
        assert!(repo.get_pub(id).await.unwrap().is_none());

        let mut live = Article::new_draft(1, "p", "c");
        live.status = ArticleStatus::Published;
        let live = repo.sync(&live).await.unwrap();
        repo.sync_status(live, 1, ArticleStatus::Private).await.unwrap();
        let err = repo
            .sync_status(live, 1, ArticleStatus::Published)
            .await
            .unwrap_err();
        assert!(matches!(err, ArticleStoreError::InvalidTransition { .. }));
        assert!(repo.get_pub(live).await.unwrap().is_none());

        let err = repo
            .sync_status(live, 2, ArticleStatus::Private)
            .await
            .unwrap_err();
        assert!(matches!(err, ArticleStoreError::NotOwned));
        let err = repo
            .sync_status(live + 100, 1, ArticleStatus::Private)
            .await
            .unwrap_err();
        assert!(matches!(err, ArticleStoreError::NotFound));
    }

    #[tokio::test]
    async fn drafts_list_newest_first() {
        let repo = MemoryArticleRepository::new();
        let a = repo.insert(&Article::new_draft(1, "a", "")).await.unwrap();
        let b = repo.insert(&Article::new_draft(1, "b", "")).await.unwrap();
        repo.insert(&Article::new_draft(2, "other", "")).await.unwrap();
        let mut touched = Article::new_draft(1, "a2", "");
        touched.id = a;
        repo.update(&touched).await.unwrap();

        let ids: Vec<i64> = repo
            .list_drafts_by_author(1, 10, 0)
            .await
            .unwrap()
            .iter()
            .map(|x| x.id)
            .collect();
        assert_eq!(ids, vec![a, b]);
        assert_eq!(repo.list_drafts_by_author(1, 10, 1).await.unwrap().len(), 1);
    }
}
