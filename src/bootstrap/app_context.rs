use std::sync::Arc;

use anyhow::Context;
use tokio::sync::broadcast;

use crate::application::ports::article_cache::ArticleCache;
use crate::application::ports::article_event_publisher::ArticleEvent;
use crate::application::ports::article_repository::ArticleRepository;
use crate::application::ports::interactive_cache::InteractiveCache;
use crate::application::ports::interactive_repository::InteractiveRepository;
use crate::application::ports::rate_limiter::RateLimiter;
use crate::application::ports::sms_sender::SmsSender;
use crate::application::services::articles::ArticleService;
use crate::application::services::background::BackgroundTasks;
use crate::application::services::interactions::InteractiveService;
use crate::application::services::sms::RateLimitedSmsSender;
use crate::bootstrap::config::{Config, RateLimitConfig};
use crate::infrastructure::cache::article_cache_redis::RedisArticleCache;
use crate::infrastructure::cache::interactive_cache_redis::RedisInteractiveCache;
use crate::infrastructure::db::PgPool;
use crate::infrastructure::db::repositories::article_repository_sqlx::SqlxArticleRepository;
use crate::infrastructure::db::repositories::interactive_repository_sqlx::SqlxInteractiveRepository;
use crate::infrastructure::events::broadcast_publisher::BroadcastArticleEventPublisher;
use crate::infrastructure::memory::article_cache::MemoryArticleCache;
use crate::infrastructure::memory::article_repository::MemoryArticleRepository;
use crate::infrastructure::memory::interactive_cache::MemoryInteractiveCache;
use crate::infrastructure::memory::interactive_repository::MemoryInteractiveRepository;
use crate::infrastructure::memory::kv::MemoryKv;
use crate::infrastructure::memory::rate_limiter::MemorySlidingWindowLimiter;
use crate::infrastructure::ratelimit::redis_sliding_window::RedisSlidingWindowLimiter;

/// Relational-store adapters.
pub struct StoreAdapters {
    pub articles: Arc<dyn ArticleRepository>,
    pub interactions: Arc<dyn InteractiveRepository>,
}

impl StoreAdapters {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            articles: Arc::new(SqlxArticleRepository::new(pool.clone())),
            interactions: Arc::new(SqlxInteractiveRepository::new(pool)),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            articles: Arc::new(MemoryArticleRepository::new()),
            interactions: Arc::new(MemoryInteractiveRepository::new()),
        }
    }
}

/// Cache-store adapters: caches plus the three sliding-window limiters.
pub struct CacheAdapters {
    pub articles: Arc<dyn ArticleCache>,
    pub interactions: Arc<dyn InteractiveCache>,
    pub ingress_limiter: Arc<dyn RateLimiter>,
    pub write_limiter: Arc<dyn RateLimiter>,
    pub sms_limiter: Arc<dyn RateLimiter>,
}

impl CacheAdapters {
    pub async fn redis(redis_url: &str, cfg: &Config) -> anyhow::Result<Self> {
        let client = redis::Client::open(redis_url).context("redis_client_open")?;
        let conn = redis::aio::ConnectionManager::new(client)
            .await
            .context("redis_connection_manager")?;
        let limiter = |rate: &RateLimitConfig| -> Arc<dyn RateLimiter> {
            Arc::new(RedisSlidingWindowLimiter::new(
                conn.clone(),
                rate.window,
                rate.max_requests,
            ))
        };
        Ok(Self {
            articles: Arc::new(RedisArticleCache::new(conn.clone())),
            interactions: Arc::new(RedisInteractiveCache::new(conn.clone())),
            ingress_limiter: limiter(&cfg.ingress_rate),
            write_limiter: limiter(&cfg.article_write_rate),
            sms_limiter: limiter(&cfg.sms_rate),
        })
    }

    pub fn in_memory(cfg: &Config) -> Self {
        let kv = Arc::new(MemoryKv::new());
        let limiter = |rate: &RateLimitConfig| -> Arc<dyn RateLimiter> {
            Arc::new(MemorySlidingWindowLimiter::new(rate.window, rate.max_requests))
        };
        Self {
            articles: Arc::new(MemoryArticleCache::new(kv.clone())),
            interactions: Arc::new(MemoryInteractiveCache::new(kv)),
            ingress_limiter: limiter(&cfg.ingress_rate),
            write_limiter: limiter(&cfg.article_write_rate),
            sms_limiter: limiter(&cfg.sms_rate),
        }
    }
}

#[derive(Clone)]
pub struct AppContext {
    pub cfg: Config,
    services: Arc<AppServices>,
}

pub struct AppServices {
    articles: ArticleService,
    interactions: InteractiveService,
    tasks: BackgroundTasks,
    ingress_limiter: Arc<dyn RateLimiter>,
    write_limiter: Arc<dyn RateLimiter>,
    sms_limiter: Arc<dyn RateLimiter>,
    article_events: broadcast::Sender<ArticleEvent>,
}

impl AppServices {
    pub fn new(cfg: &Config, stores: StoreAdapters, caches: CacheAdapters) -> Self {
        let tasks = BackgroundTasks::new(cfg.background_max_tasks, cfg.cache_task_timeout);
        let (article_events, _) = broadcast::channel(1024);
        let articles = ArticleService::new(
            stores.articles,
            caches.articles,
            Arc::new(BroadcastArticleEventPublisher::new(article_events.clone())),
            tasks.clone(),
            cfg.list_by_time_timeout,
        );
        let interactions =
            InteractiveService::new(stores.interactions, caches.interactions, tasks.clone());
        Self {
            articles,
            interactions,
            tasks,
            ingress_limiter: caches.ingress_limiter,
            write_limiter: caches.write_limiter,
            sms_limiter: caches.sms_limiter,
            article_events,
        }
    }
}

impl AppContext {
    pub fn new(cfg: Config, services: AppServices) -> Self {
        Self {
            cfg,
            services: Arc::new(services),
        }
    }

    /// Everything in process; used when no redis is configured and by tests.
    pub fn in_memory(cfg: Config) -> Self {
        let caches = CacheAdapters::in_memory(&cfg);
        let services = AppServices::new(&cfg, StoreAdapters::in_memory(), caches);
        Self::new(cfg, services)
    }

    pub fn articles(&self) -> &ArticleService {
        &self.services.articles
    }

    pub fn interactions(&self) -> &InteractiveService {
        &self.services.interactions
    }

    pub fn tasks(&self) -> &BackgroundTasks {
        &self.services.tasks
    }

    pub fn ingress_limiter(&self) -> Arc<dyn RateLimiter> {
        self.services.ingress_limiter.clone()
    }

    pub fn write_limiter(&self) -> Arc<dyn RateLimiter> {
        self.services.write_limiter.clone()
    }

    /// Wraps an SMS vendor adapter with the shared SMS limiter.
    pub fn sms_sender<S: SmsSender>(&self, vendor: S) -> RateLimitedSmsSender<S> {
        RateLimitedSmsSender::new(vendor, self.services.sms_limiter.clone())
    }

    pub fn subscribe_article_events(&self) -> broadcast::Receiver<ArticleEvent> {
        self.services.article_events.subscribe()
    }
}
