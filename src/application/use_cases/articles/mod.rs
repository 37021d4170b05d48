use crate::application::ports::rate_limiter::RateLimiter;
use crate::application::services::articles::ArticleError;

pub mod edit;
pub mod get_draft;
pub mod list_drafts;
pub mod list_published;
pub mod publish;
pub mod read_article;
pub mod withdraw;

pub fn write_quota_key(author_id: i64) -> String {
    format!("article_write:{author_id}")
}

/// Consumes one slot of the author's write window. A limiter outage fails
/// the write rather than letting it through.
pub(crate) async fn check_write_quota<L: RateLimiter + ?Sized>(
    limiter: &L,
    author_id: i64,
) -> Result<(), ArticleError> {
    match limiter.allow(&write_quota_key(author_id)).await {
        Ok(true) => Ok(()),
        Ok(false) => {
            tracing::info!(author_id, "article_write_throttled");
            Err(ArticleError::Throttled)
        }
        Err(err) => Err(ArticleError::Storage(err)),
    }
}
