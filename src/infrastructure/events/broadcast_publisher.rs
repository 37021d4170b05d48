use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::application::ports::article_event_publisher::{ArticleEvent, ArticleEventPublisher};

#[derive(Clone)]
pub struct BroadcastArticleEventPublisher {
    sender: broadcast::Sender<ArticleEvent>,
}

impl BroadcastArticleEventPublisher {
    pub fn new(sender: broadcast::Sender<ArticleEvent>) -> Self {
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ArticleEvent> {
        self.sender.subscribe()
    }
}

#[async_trait]
impl ArticleEventPublisher for BroadcastArticleEventPublisher {
    async fn publish(&self, event: &ArticleEvent) -> anyhow::Result<()> {
        match self.sender.send(event.clone()) {
            Ok(receivers) => {
                tracing::debug!(receivers, ?event, "article_event_published");
                Ok(())
            }
            // Nobody listening yet.
            Err(broadcast::error::SendError(_)) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_without_subscribers_succeeds() {
        let (tx, rx) = broadcast::channel(4);
        drop(rx);
        let publisher = BroadcastArticleEventPublisher::new(tx);
        publisher
            .publish(&ArticleEvent::Read {
                uid: 1,
                article_id: 2,
            })
            .await
            .unwrap();

        let mut sub = publisher.subscribe();
        let event = ArticleEvent::Published {
            article_id: 2,
            author_id: 1,
        };
        publisher.publish(&event).await.unwrap();
        assert_eq!(sub.recv().await.unwrap(), event);
    }
}
