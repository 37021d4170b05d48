use async_trait::async_trait;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ArticleEvent {
    /// The article became readable through the published path.
    Published { article_id: i64, author_id: i64 },
    Read { uid: i64, article_id: i64 },
}

#[async_trait]
pub trait ArticleEventPublisher: Send + Sync {
    async fn publish(&self, event: &ArticleEvent) -> anyhow::Result<()>;
}
