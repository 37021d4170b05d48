use crate::application::services::articles::{ArticleError, ArticleService};
use crate::application::services::interactions::{InteractionError, InteractiveService};
use crate::domain::articles::article::Article;
use crate::domain::interactions::interactive::Interactive;

#[derive(Debug, Clone)]
pub struct ArticleDetail {
    pub article: Article,
    pub interactive: Interactive,
}

/// Reader-facing article page: published copy plus counters, then a read is
/// counted and announced in the background.
pub struct ReadArticle<'a> {
    pub articles: &'a ArticleService,
    pub interactions: &'a InteractiveService,
    pub biz: &'a str,
}

impl<'a> ReadArticle<'a> {
    pub async fn execute(&self, uid: i64, id: i64) -> Result<ArticleDetail, ArticleError> {
        let (article, interactive) = tokio::try_join!(self.articles.get_pub(id), async {
            self.interactions
                .get_interactive_info(uid, self.biz, id)
                .await
                .map_err(|err| match err {
                    InteractionError::Throttled => ArticleError::Throttled,
                    InteractionError::Storage(e) => ArticleError::Storage(e),
                })
        })?;

        let interactions = self.interactions.clone();
        let biz = self.biz.to_string();
        self.interactions
            .tasks()
            .spawn("article_read_cnt_incr", async move {
                interactions
                    .incr_read_cnt(&biz, id)
                    .await
                    .map_err(anyhow::Error::from)
            });
        self.articles.notify_read(uid, id);

        Ok(ArticleDetail {
            article,
            interactive,
        })
    }
}
