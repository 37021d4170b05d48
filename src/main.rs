use std::net::SocketAddr;

use axum::extract::MatchedPath;
use dotenvy::dotenv;
use http::HeaderValue;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use webook::bootstrap::app_context::{AppContext, AppServices, CacheAdapters, StoreAdapters};
use webook::bootstrap::config::Config;

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = ?e, "shutdown_signal_failed");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "webook=debug,axum=info,tower_http=info".into()),
        )
        .init();

    let cfg = Config::from_env()?;
    info!(
        api_port = cfg.api_port,
        redis = cfg.redis_url.is_some(),
        production = cfg.is_production,
        "Starting webook backend"
    );

    // Database
    let pool = webook::infrastructure::db::connect_pool(&cfg.database_url).await?;
    webook::infrastructure::db::migrate(&pool).await?;

    let caches = match cfg.redis_url.as_deref() {
        Some(url) => CacheAdapters::redis(url, &cfg).await?,
        None => {
            tracing::warn!("redis_url_unset_using_process_local_cache");
            CacheAdapters::in_memory(&cfg)
        }
    };
    let services = AppServices::new(&cfg, StoreAdapters::postgres(pool.clone()), caches);
    let ctx = AppContext::new(cfg.clone(), services);

    let methods = [
        http::Method::GET,
        http::Method::POST,
        http::Method::OPTIONS,
    ];
    let headers = [http::header::CONTENT_TYPE, http::header::AUTHORIZATION];
    let cors = match cfg.frontend_url.as_deref().map(HeaderValue::from_str) {
        Some(Ok(origin)) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods(methods)
            .allow_headers(headers),
        _ if cfg.is_production => CorsLayer::new()
            .allow_origin(AllowOrigin::exact(HeaderValue::from_static("http://invalid")))
            .allow_methods(methods)
            .allow_headers(headers),
        // Development convenience
        _ => CorsLayer::new()
            .allow_origin(AllowOrigin::mirror_request())
            .allow_methods(methods)
            .allow_headers(headers),
    };

    let app = webook::presentation::http::api_router(ctx.clone(), Some(pool.clone()))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http().make_span_with(|req: &http::Request<_>| {
                let method = req.method().clone();
                let uri = req.uri().clone();
                let matched = req
                    .extensions()
                    .get::<MatchedPath>()
                    .map(|p| p.as_str().to_string())
                    .unwrap_or_default();
                tracing::info_span!("http", %method, %uri, matched_path = %matched)
            }),
        );

    let api_addr = SocketAddr::from(([0, 0, 0, 0], cfg.api_port));
    info!(%api_addr, "HTTP API listening");
    let listener = tokio::net::TcpListener::bind(api_addr).await?;

    let served = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await;
    if let Err(e) = &served {
        error!(?e, "API server task failed");
    }

    // Let in-flight cache repairs finish, bounded by their own timeout.
    info!(in_flight = ctx.tasks().in_flight(), "draining_background_tasks");
    ctx.tasks().drain().await;
    served?;
    Ok(())
}
