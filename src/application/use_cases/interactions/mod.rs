use crate::application::ports::rate_limiter::RateLimiter;
use crate::application::services::interactions::InteractionError;

pub mod collect;
pub mod like;

pub(crate) async fn check_reaction_quota<L: RateLimiter + ?Sized>(
    limiter: &L,
    uid: i64,
) -> Result<(), InteractionError> {
    match limiter.allow(&format!("interaction_write:{uid}")).await {
        Ok(true) => Ok(()),
        Ok(false) => Err(InteractionError::Throttled),
        Err(err) => Err(InteractionError::Storage(err)),
    }
}
