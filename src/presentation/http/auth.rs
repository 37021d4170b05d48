use axum::extract::FromRequestParts;
use axum::http::{StatusCode, request::Parts};
use jsonwebtoken::{DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::bootstrap::config::Config;

/// Token claims. `sub` carries the numeric user id; tokens are issued by the
/// account service.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

pub struct Bearer(pub String);

#[axum::async_trait]
impl<S> FromRequestParts<S> for Bearer
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|auth| auth.strip_prefix("Bearer "))
            .map(|t| Bearer(t.trim().to_string()))
            .ok_or(StatusCode::UNAUTHORIZED)
    }
}

/// Validates the token and returns the acting user id.
pub fn validate_bearer(cfg: &Config, bearer: Bearer) -> Result<i64, StatusCode> {
    let data = jsonwebtoken::decode::<Claims>(
        &bearer.0,
        &DecodingKey::from_secret(cfg.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| StatusCode::UNAUTHORIZED)?;
    data.claims
        .sub
        .parse::<i64>()
        .ok()
        .filter(|uid| *uid > 0)
        .ok_or(StatusCode::UNAUTHORIZED)
}
