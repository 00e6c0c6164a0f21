use std::sync::Arc;

use common::config::RepositoryConfig;
use common::event::EventPublisher;
use common::storage::ObjectStorage;
use common::task::TaskKind;
use sea_orm::DatabaseConnection;
use tracing::warn;

/// Everything task handlers need to touch the world.
///
/// Shared between the worker binary and the server's inline task path, so
/// both run the exact same handler code.
#[derive(Clone)]
pub struct RegistryContext {
    pub db: DatabaseConnection,
    pub storage: Arc<dyn ObjectStorage>,
    pub events: Arc<dyn EventPublisher>,
    pub repository: RepositoryConfig,
    /// Set when an MQ is connected. Follow-up tasks go through it; without
    /// one they run inline on the calling task.
    pub mq: Option<Arc<mq::Mq>>,
    pub task_queue_name: String,
}

impl RegistryContext {
    /// Hand a follow-up task to the queue, or run it in place when no MQ
    /// is configured.
    pub async fn schedule(&self, kind: TaskKind) -> Result<(), crate::error::WorkerError> {
        match &self.mq {
            Some(mq) => {
                let task = kind.into_task()?;
                mq.publish(&self.task_queue_name, None, &task, None)
                    .await
                    .map_err(|e| {
                        crate::error::WorkerError::Internal(format!(
                            "Failed to publish task: {e}"
                        ))
                    })?;
                Ok(())
            }
            None => Box::pin(crate::runner::run_task(self, kind)).await,
        }
    }

    /// Like `schedule`, but failures are logged instead of propagated.
    pub async fn schedule_best_effort(&self, kind: TaskKind) {
        let task_type = kind.task_type();
        if let Err(e) = self.schedule(kind).await {
            warn!(task_type, "Failed to schedule follow-up task: {e}");
        }
    }
}
