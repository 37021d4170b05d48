use crate::application::services::articles::{ArticleError, ArticleService};
use crate::domain::articles::article::Article;

pub struct ListDrafts<'a> {
    pub articles: &'a ArticleService,
}

impl<'a> ListDrafts<'a> {
    pub async fn execute(
        &self,
        author_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Article>, ArticleError> {
        self.articles
            .list_author_draft(author_id, limit, offset)
            .await
    }
}
