use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::post,
};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::application::services::interactions::InteractionError;
use crate::application::use_cases::interactions::collect::CollectArticle;
use crate::application::use_cases::interactions::like::LikeArticle;
use crate::bootstrap::app_context::AppContext;
use crate::presentation::http::auth::{self, Bearer};

#[derive(Debug, Deserialize, ToSchema)]
pub struct LikeRequest {
    /// `false` cancels a previous like.
    pub like: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CollectRequest {
    /// `false` cancels a previous collect.
    pub collect: bool,
}

fn interaction_error_status(err: InteractionError) -> StatusCode {
    match err {
        InteractionError::Throttled => StatusCode::TOO_MANY_REQUESTS,
        InteractionError::Storage(err) => {
            tracing::error!(error = ?err, "interaction_request_failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

#[utoipa::path(post, path = "/api/articles/{id}/like", tag = "Interactions",
    params(("id" = i64, Path, description = "Article id")),
    request_body = LikeRequest,
    responses((status = 204)))]
pub async fn like_article(
    State(ctx): State<AppContext>,
    bearer: Bearer,
    Path(id): Path<i64>,
    Json(req): Json<LikeRequest>,
) -> Result<StatusCode, StatusCode> {
    let uid = auth::validate_bearer(&ctx.cfg, bearer)?;
    let limiter = ctx.write_limiter();
    let uc = LikeArticle {
        interactions: ctx.interactions(),
        limiter: limiter.as_ref(),
        biz: &ctx.cfg.interactive_biz,
    };
    uc.execute(uid, id, req.like)
        .await
        .map_err(interaction_error_status)?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(post, path = "/api/articles/{id}/collect", tag = "Interactions",
    params(("id" = i64, Path, description = "Article id")),
    request_body = CollectRequest,
    responses((status = 204)))]
pub async fn collect_article(
    State(ctx): State<AppContext>,
    bearer: Bearer,
    Path(id): Path<i64>,
    Json(req): Json<CollectRequest>,
) -> Result<StatusCode, StatusCode> {
    let uid = auth::validate_bearer(&ctx.cfg, bearer)?;
    let limiter = ctx.write_limiter();
    let uc = CollectArticle {
        interactions: ctx.interactions(),
        limiter: limiter.as_ref(),
        biz: &ctx.cfg.interactive_biz,
    };
    uc.execute(uid, id, req.collect)
        .await
        .map_err(interaction_error_status)?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn routes(ctx: AppContext) -> Router {
    Router::new()
        .route("/articles/:id/like", post(like_article))
        .route("/articles/:id/collect", post(collect_article))
        .with_state(ctx)
}
