use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;
use utoipa::ToSchema;

use crate::application::services::background::BackgroundTasks;
use crate::infrastructure::db::PgPool;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResp {
    pub status: &'static str,
    /// Background cache tasks currently running.
    pub background_tasks: usize,
}

#[derive(Clone)]
pub struct HealthState {
    pub pool: Option<PgPool>,
    pub tasks: BackgroundTasks,
}

#[utoipa::path(
    get,
    path = "/api/health",
    tag = "Health",
    responses((status = 200, body = HealthResp))
)]
pub async fn health(State(state): State<HealthState>) -> Json<HealthResp> {
    let db_ok = match &state.pool {
        Some(pool) => sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(pool)
            .await
            .is_ok(),
        None => true,
    };
    let status = if db_ok { "ok" } else { "degraded" };
    Json(HealthResp {
        status,
        background_tasks: state.tasks.in_flight(),
    })
}

pub fn routes(pool: Option<PgPool>, tasks: BackgroundTasks) -> Router {
    Router::new()
        .route("/health", get(health))
        .with_state(HealthState { pool, tasks })
}
