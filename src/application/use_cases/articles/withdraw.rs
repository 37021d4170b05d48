use crate::application::ports::rate_limiter::RateLimiter;
use crate::application::services::articles::{ArticleError, ArticleService};
use crate::application::use_cases::articles::check_write_quota;

pub struct WithdrawArticle<'a, L: RateLimiter + ?Sized> {
    pub articles: &'a ArticleService,
    pub limiter: &'a L,
}

impl<'a, L: RateLimiter + ?Sized> WithdrawArticle<'a, L> {
    /// Makes the article private; only its author may do so.
    pub async fn execute(&self, author_id: i64, id: i64) -> Result<(), ArticleError> {
        check_write_quota(self.limiter, author_id).await?;
        self.articles.withdraw(id, author_id).await
    }
}
