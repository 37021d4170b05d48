use crate::application::ports::rate_limiter::RateLimiter;
use crate::application::services::interactions::{InteractionError, InteractiveService};
use crate::application::use_cases::interactions::check_reaction_quota;

pub struct LikeArticle<'a, L: RateLimiter + ?Sized> {
    pub interactions: &'a InteractiveService,
    pub limiter: &'a L,
    pub biz: &'a str,
}

impl<'a, L: RateLimiter + ?Sized> LikeArticle<'a, L> {
    /// `like == false` cancels. Repeats are no-ops either way.
    pub async fn execute(&self, uid: i64, id: i64, like: bool) -> Result<(), InteractionError> {
        check_reaction_quota(self.limiter, uid).await?;
        if like {
            self.interactions.like(uid, self.biz, id).await
        } else {
            self.interactions.cancel_like(uid, self.biz, id).await
        }
    }
}
