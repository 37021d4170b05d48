use crate::application::services::articles::{ArticleError, ArticleService};
use crate::domain::articles::article::Article;

pub struct GetDraft<'a> {
    pub articles: &'a ArticleService,
}

impl<'a> GetDraft<'a> {
    pub async fn execute(&self, author_id: i64, id: i64) -> Result<Article, ArticleError> {
        let article = self.articles.get_draft(id).await?;
        if article.author_id != author_id {
            tracing::warn!(article_id = id, author_id, "draft_read_by_non_author");
            return Err(ArticleError::NotOwned);
        }
        Ok(article)
    }
}
