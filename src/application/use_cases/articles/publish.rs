use crate::application::ports::rate_limiter::RateLimiter;
use crate::application::services::articles::{ArticleError, ArticleService};
use crate::application::use_cases::articles::check_write_quota;
use crate::domain::articles::article::Article;

pub struct PublishArticle<'a, L: RateLimiter + ?Sized> {
    pub articles: &'a ArticleService,
    pub limiter: &'a L,
}

impl<'a, L: RateLimiter + ?Sized> PublishArticle<'a, L> {
    pub async fn execute(
        &self,
        author_id: i64,
        id: i64,
        title: String,
        content: String,
    ) -> Result<i64, ArticleError> {
        check_write_quota(self.limiter, author_id).await?;
        let article = Article {
            id,
            ..Article::new_draft(author_id, title, content)
        };
        self.articles.publish(article).await
    }
}
