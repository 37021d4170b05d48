use axum::{Router, middleware};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::bootstrap::app_context::AppContext;
use crate::infrastructure::db::PgPool;

pub mod articles;
pub mod auth;
pub mod health;
pub mod interactions;
pub mod ratelimit;

#[derive(OpenApi)]
#[openapi(
    paths(
        articles::edit_article,
        articles::publish_article,
        articles::withdraw_article,
        articles::list_drafts,
        articles::get_draft,
        articles::read_article,
        articles::list_author_articles,
        interactions::like_article,
        interactions::collect_article,
        health::health,
    ),
    components(schemas(
        articles::ArticleItem,
        articles::ArticleListResponse,
        articles::ArticleDetailResponse,
        articles::EditArticleRequest,
        articles::WithdrawArticleRequest,
        articles::ArticleIdResponse,
        interactions::LikeRequest,
        interactions::CollectRequest,
        health::HealthResp,
    )),
    tags(
        (name = "Articles", description = "Drafts, publishing and reading"),
        (name = "Interactions", description = "Likes and collects"),
        (name = "Health", description = "System health checks")
    )
)]
pub struct ApiDoc;

/// Full `/api` surface behind the ingress limiter. `pool` is only used by
/// the health probe.
pub fn api_router(ctx: AppContext, pool: Option<PgPool>) -> Router {
    Router::new()
        .nest("/api", health::routes(pool, ctx.tasks().clone()))
        .nest("/api", articles::routes(ctx.clone()))
        .nest("/api", interactions::routes(ctx.clone()))
        .merge(SwaggerUi::new("/api/docs").url("/api/openapi.json", ApiDoc::openapi()))
        .layer(middleware::from_fn_with_state(
            ctx.ingress_limiter(),
            ratelimit::ingress_limit,
        ))
}
