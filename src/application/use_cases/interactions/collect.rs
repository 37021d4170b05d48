use crate::application::ports::rate_limiter::RateLimiter;
use crate::application::services::interactions::{InteractionError, InteractiveService};
use crate::application::use_cases::interactions::check_reaction_quota;

pub struct CollectArticle<'a, L: RateLimiter + ?Sized> {
    pub interactions: &'a InteractiveService,
    pub limiter: &'a L,
    pub biz: &'a str,
}

impl<'a, L: RateLimiter + ?Sized> CollectArticle<'a, L> {
    pub async fn execute(&self, uid: i64, id: i64, collect: bool) -> Result<(), InteractionError> {
        check_reaction_quota(self.limiter, uid).await?;
        if collect {
            self.interactions.collect(uid, self.biz, id).await
        } else {
            self.interactions.cancel_collect(uid, self.biz, id).await
        }
    }
}
