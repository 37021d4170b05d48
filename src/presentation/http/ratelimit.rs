use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::application::ports::rate_limiter::RateLimiter;

fn client_key(req: &Request) -> String {
    if let Some(ConnectInfo(addr)) = req.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }
    req.headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Per-client ingress limit. Denials answer 429; a limiter failure answers
/// 500 instead of letting the request through.
pub async fn ingress_limit(
    State(limiter): State<Arc<dyn RateLimiter>>,
    req: Request,
    next: Next,
) -> Response {
    let key = format!("ip_ratelimit:{}", client_key(&req));
    match limiter.allow(&key).await {
        Ok(true) => next.run(req).await,
        Ok(false) => {
            tracing::info!(%key, "ingress_throttled");
            StatusCode::TOO_MANY_REQUESTS.into_response()
        }
        Err(err) => {
            tracing::error!(error = ?err, "ingress_rate_limiter_failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
