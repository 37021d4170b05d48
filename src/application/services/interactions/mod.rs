use std::sync::Arc;

use crate::application::ports::interactive_cache::InteractiveCache;
use crate::application::ports::interactive_repository::InteractiveRepository;
use crate::application::services::background::{BackgroundTasks, run_detached};
use crate::domain::interactions::interactive::{ActionOutcome, CounterField, Interactive, Reaction};

#[derive(thiserror::Error, Debug)]
pub enum InteractionError {
    #[error("too many requests")]
    Throttled,
    #[error("interaction storage failure")]
    Storage(#[source] anyhow::Error),
}

/// Read/like/collect counters. Durable writes commit first; the cache mirror
/// is updated afterwards in the background and only when already warm.
#[derive(Clone)]
pub struct InteractiveService {
    store: Arc<dyn InteractiveRepository>,
    cache: Arc<dyn InteractiveCache>,
    tasks: BackgroundTasks,
}

impl InteractiveService {
    pub fn new(
        store: Arc<dyn InteractiveRepository>,
        cache: Arc<dyn InteractiveCache>,
        tasks: BackgroundTasks,
    ) -> Self {
        Self {
            store,
            cache,
            tasks,
        }
    }

    pub fn tasks(&self) -> &BackgroundTasks {
        &self.tasks
    }

    pub async fn incr_read_cnt(&self, biz: &str, biz_id: i64) -> Result<(), InteractionError> {
        let store = self.store.clone();
        let owned_biz = biz.to_string();
        run_detached(async move { store.incr_read_cnt(&owned_biz, biz_id).await })
            .await
            .and_then(|res| res)
            .map_err(InteractionError::Storage)?;
        self.mirror(biz, biz_id, CounterField::Read, 1);
        Ok(())
    }

    pub async fn like(&self, uid: i64, biz: &str, biz_id: i64) -> Result<(), InteractionError> {
        self.react(Reaction::Like, true, uid, biz, biz_id).await
    }

    pub async fn cancel_like(
        &self,
        uid: i64,
        biz: &str,
        biz_id: i64,
    ) -> Result<(), InteractionError> {
        self.react(Reaction::Like, false, uid, biz, biz_id).await
    }

    pub async fn collect(&self, uid: i64, biz: &str, biz_id: i64) -> Result<(), InteractionError> {
        self.react(Reaction::Collect, true, uid, biz, biz_id).await
    }

    pub async fn cancel_collect(
        &self,
        uid: i64,
        biz: &str,
        biz_id: i64,
    ) -> Result<(), InteractionError> {
        self.react(Reaction::Collect, false, uid, biz, biz_id).await
    }

    /// Counters of the subject plus whether `uid` liked / collected it.
    ///
    /// Counters are read through the cache. Both viewer flags are looked up
    /// concurrently and either failure fails the call.
    pub async fn get_interactive_info(
        &self,
        uid: i64,
        biz: &str,
        biz_id: i64,
    ) -> Result<Interactive, InteractionError> {
        let mut info = match self.cache.get(biz, biz_id).await {
            Ok(Some(info)) => info,
            other => {
                if let Err(err) = other {
                    tracing::warn!(biz, biz_id, error = ?err, "interactive_cache_get_failed");
                }
                self.load_counters(biz, biz_id).await?
            }
        };

        let (liked, collected) = tokio::try_join!(
            self.store.has_reaction(Reaction::Like, uid, biz, biz_id),
            self.store.has_reaction(Reaction::Collect, uid, biz, biz_id),
        )
        .map_err(InteractionError::Storage)?;
        info.liked = liked;
        info.collected = collected;
        Ok(info)
    }

    async fn load_counters(&self, biz: &str, biz_id: i64) -> Result<Interactive, InteractionError> {
        match self
            .store
            .get(biz, biz_id)
            .await
            .map_err(InteractionError::Storage)?
        {
            Some(info) => {
                let cache = self.cache.clone();
                let cached = info.clone();
                self.tasks.spawn("interactive_cache_set", async move {
                    cache.set(&cached).await
                });
                Ok(info)
            }
            // Nothing recorded yet; keep the cache cold.
            None => Ok(Interactive::empty(biz, biz_id)),
        }
    }

    async fn react(
        &self,
        reaction: Reaction,
        add: bool,
        uid: i64,
        biz: &str,
        biz_id: i64,
    ) -> Result<(), InteractionError> {
        let store = self.store.clone();
        let owned_biz = biz.to_string();
        let outcome = run_detached(async move {
            if add {
                store.add_reaction(reaction, uid, &owned_biz, biz_id).await
            } else {
                store.cancel_reaction(reaction, uid, &owned_biz, biz_id).await
            }
        })
        .await
        .and_then(|res| res)
        .map_err(InteractionError::Storage)?;

        match outcome {
            ActionOutcome::Applied => {
                self.mirror(biz, biz_id, reaction.counter(), if add { 1 } else { -1 });
            }
            ActionOutcome::Duplicate => {
                tracing::info!(
                    reaction = reaction.as_str(),
                    add,
                    uid,
                    biz,
                    biz_id,
                    "interactive_duplicate_action"
                );
            }
        }
        Ok(())
    }

    fn mirror(&self, biz: &str, biz_id: i64, field: CounterField, delta: i64) {
        let cache = self.cache.clone();
        let biz = biz.to_string();
        self.tasks.spawn("interactive_cache_incr", async move {
            cache
                .incr_if_present(&biz, biz_id, field, delta)
                .await
                .map(|_| ())
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::memory::interactive_cache::MemoryInteractiveCache;
    use crate::infrastructure::memory::interactive_repository::MemoryInteractiveRepository;
    use crate::infrastructure::memory::kv::MemoryKv;
    use std::time::Duration;

    fn service() -> (InteractiveService, Arc<MemoryInteractiveCache>) {
        let cache = Arc::new(MemoryInteractiveCache::new(Arc::new(MemoryKv::new())));
        let svc = InteractiveService::new(
            Arc::new(MemoryInteractiveRepository::new()),
            cache.clone(),
            BackgroundTasks::new(64, Duration::from_secs(1)),
        );
        (svc, cache)
    }

    #[tokio::test]
    async fn like_is_idempotent_per_user() {
        let (svc, _) = service();
        svc.like(1, "article", 10).await.unwrap();
        svc.like(1, "article", 10).await.unwrap();
        svc.like(2, "article", 10).await.unwrap();
        let info = svc.get_interactive_info(1, "article", 10).await.unwrap();
        assert_eq!(info.like_cnt, 2);
        assert!(info.liked);
        assert!(!info.collected);
        svc.tasks().drain().await;

        svc.cancel_like(1, "article", 10).await.unwrap();
        svc.cancel_like(1, "article", 10).await.unwrap();
        svc.tasks().drain().await;
        let info = svc.get_interactive_info(1, "article", 10).await.unwrap();
        assert_eq!(info.like_cnt, 1);
        assert!(!info.liked);
    }

    #[tokio::test]
    async fn cancel_without_prior_reaction_is_noop() {
        let (svc, _) = service();
        svc.cancel_collect(5, "article", 3).await.unwrap();
        let info = svc.get_interactive_info(5, "article", 3).await.unwrap();
        assert_eq!(info.collect_cnt, 0);
        assert_eq!(info.biz, "article");
    }

    #[tokio::test]
    async fn cold_cache_is_not_seeded_by_increments() {
        let (svc, cache) = service();
        svc.incr_read_cnt("article", 8).await.unwrap();
        svc.tasks().drain().await;
        assert!(cache.get("article", 8).await.unwrap().is_none());

        // A read warms the cache; later increments are mirrored into it.
        svc.get_interactive_info(1, "article", 8).await.unwrap();
        svc.tasks().drain().await;
        svc.incr_read_cnt("article", 8).await.unwrap();
        svc.collect(1, "article", 8).await.unwrap();
        svc.tasks().drain().await;
        let cached = cache.get("article", 8).await.unwrap().unwrap();
        assert_eq!(cached.read_cnt, 2);
        assert_eq!(cached.collect_cnt, 1);
    }

    struct BrokenCache;

    #[async_trait::async_trait]
    impl InteractiveCache for BrokenCache {
        async fn incr_if_present(
            &self,
            _: &str,
            _: i64,
            _: CounterField,
            _: i64,
        ) -> anyhow::Result<bool> {
            anyhow::bail!("cache down")
        }
        async fn get(&self, _: &str, _: i64) -> anyhow::Result<Option<Interactive>> {
            anyhow::bail!("cache down")
        }
        async fn set(&self, _: &Interactive) -> anyhow::Result<()> {
            anyhow::bail!("cache down")
        }
    }

    /// Store whose collect lookups fail; everything else is delegated.
    struct CollectLookupDown(MemoryInteractiveRepository);

    #[async_trait::async_trait]
    impl InteractiveRepository for CollectLookupDown {
        async fn incr_read_cnt(&self, biz: &str, biz_id: i64) -> anyhow::Result<()> {
            self.0.incr_read_cnt(biz, biz_id).await
        }
        async fn add_reaction(
            &self,
            reaction: Reaction,
            uid: i64,
            biz: &str,
            biz_id: i64,
        ) -> anyhow::Result<ActionOutcome> {
            self.0.add_reaction(reaction, uid, biz, biz_id).await
        }
        async fn cancel_reaction(
            &self,
            reaction: Reaction,
            uid: i64,
            biz: &str,
            biz_id: i64,
        ) -> anyhow::Result<ActionOutcome> {
            self.0.cancel_reaction(reaction, uid, biz, biz_id).await
        }
        async fn get(&self, biz: &str, biz_id: i64) -> anyhow::Result<Option<Interactive>> {
            self.0.get(biz, biz_id).await
        }
        async fn has_reaction(
            &self,
            reaction: Reaction,
            uid: i64,
            biz: &str,
            biz_id: i64,
        ) -> anyhow::Result<bool> {
            if reaction == Reaction::Collect {
                anyhow::bail!("collect_records unavailable");
            }
            self.0.has_reaction(reaction, uid, biz, biz_id).await
        }
    }

    #[tokio::test]
    async fn cache_outage_falls_back_to_storage() {
        let svc = InteractiveService::new(
            Arc::new(MemoryInteractiveRepository::new()),
            Arc::new(BrokenCache),
            BackgroundTasks::new(64, Duration::from_secs(1)),
        );
        svc.like(1, "article", 6).await.unwrap();
        svc.incr_read_cnt("article", 6).await.unwrap();
        svc.tasks().drain().await;

        let info = svc.get_interactive_info(1, "article", 6).await.unwrap();
        assert_eq!((info.read_cnt, info.like_cnt), (1, 1));
        assert!(info.liked);
        svc.tasks().drain().await;

        svc.cancel_like(1, "article", 6).await.unwrap();
        let info = svc.get_interactive_info(1, "article", 6).await.unwrap();
        assert_eq!(info.like_cnt, 0);
    }

    #[tokio::test]
    async fn one_failed_flag_lookup_fails_the_read() {
        let svc = InteractiveService::new(
            Arc::new(CollectLookupDown(MemoryInteractiveRepository::new())),
            Arc::new(MemoryInteractiveCache::new(Arc::new(MemoryKv::new()))),
            BackgroundTasks::new(64, Duration::from_secs(1)),
        );
        svc.like(1, "article", 2).await.unwrap();
        let err = svc.get_interactive_info(1, "article", 2).await.unwrap_err();
        assert!(matches!(err, InteractionError::Storage(_)));
    }

    #[tokio::test]
    async fn flags_are_per_viewer() {
        let (svc, _) = service();
        svc.collect(1, "article", 4).await.unwrap();
        let own = svc.get_interactive_info(1, "article", 4).await.unwrap();
        let other = svc.get_interactive_info(2, "article", 4).await.unwrap();
        assert!(own.collected);
        assert!(!other.collected);
        assert_eq!(other.collect_cnt, 1);
    }
}
