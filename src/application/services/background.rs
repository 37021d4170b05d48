use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;

/// Bounded pool of fire-and-forget tasks (cache invalidation, backfill,
/// counter mirroring, event forwarding).
///
/// Each task runs detached from the request that submitted it, under its own
/// timeout. Failures are logged and never returned to the submitter.
#[derive(Clone)]
pub struct BackgroundTasks {
    permits: Arc<Semaphore>,
    capacity: u32,
    timeout: Duration,
}

impl BackgroundTasks {
    pub fn new(capacity: usize, timeout: Duration) -> Self {
        let capacity = capacity.clamp(1, u32::MAX as usize) as u32;
        Self {
            permits: Arc::new(Semaphore::new(capacity as usize)),
            capacity,
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn in_flight(&self) -> usize {
        self.capacity as usize - self.permits.available_permits()
    }

    /// Submits `task`. Returns `false` when the pool is saturated and the
    /// task was dropped.
    pub fn spawn<F>(&self, name: &'static str, task: F) -> bool
    where
        F: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let permit = match self.permits.clone().try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => {
                tracing::warn!(task = name, "background_task_dropped");
                return false;
            }
        };
        let timeout = self.timeout;
        tokio::spawn(async move {
            let _permit = permit;
            match tokio::time::timeout(timeout, task).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    tracing::warn!(task = name, error = ?err, "background_task_failed");
                }
                Err(_) => {
                    tracing::warn!(
                        task = name,
                        timeout_ms = timeout.as_millis() as u64,
                        "background_task_timed_out"
                    );
                }
            }
        });
        true
    }

    /// Waits until every task submitted so far has finished.
    pub async fn drain(&self) {
        if let Ok(all) = self.permits.acquire_many(self.capacity).await {
            drop(all);
        }
    }
}

/// Runs `task` on its own tokio task and waits for it. Dropping the returned
/// future does not interrupt the task, so a relational transaction started
/// inside always reaches commit or rollback.
pub async fn run_detached<T, F>(task: F) -> anyhow::Result<T>
where
    F: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    tokio::spawn(task)
        .await
        .map_err(|err| anyhow::anyhow!("detached_task_join_failed: {err}"))
}
