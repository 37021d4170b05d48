use crate::application::services::articles::{ArticleError, ArticleService};
use crate::domain::articles::article::Article;

pub struct ListPublished<'a> {
    pub articles: &'a ArticleService,
}

impl<'a> ListPublished<'a> {
    /// Published articles of one author, as abstracts.
    pub async fn execute(
        &self,
        author_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Article>, ArticleError> {
        let list = self
            .articles
            .list_author_pub(author_id, limit, offset)
            .await?;
        Ok(list.iter().map(Article::abstracted).collect())
    }
}
