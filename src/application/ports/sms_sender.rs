use async_trait::async_trait;

#[async_trait]
pub trait SmsSender: Send + Sync {
    async fn send(
        &self,
        template_id: &str,
        args: &[String],
        numbers: &[String],
    ) -> anyhow::Result<()>;
}
