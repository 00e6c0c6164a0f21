use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A background work item published to the task queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub task_type: String,
    pub payload: serde_json::Value,
}

/// Typed task payloads the worker knows how to run.
///
/// All tasks are delivered at-least-once; handlers must be idempotent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TaskKind {
    /// Process one pending package submission.
    ProcessSubmission { submission_id: Uuid },
    /// Rebuild the flat and chunked indexes of one community.
    RefreshCommunityCache { community_id: i32 },
    /// Rebuild all community caches except the configured heavy one.
    RefreshAllCaches,
    /// Rebuild the configured heavy community's caches in isolation.
    RefreshHeavyCache,
    /// Delete finished or stale-polled submissions past the retention TTL.
    CleanupSubmissions,
    /// Abort and delete expired upload sessions.
    CleanupUserMedia,
    /// Delete cache snapshots superseded for longer than the retention window.
    DropStaleCaches,
}

impl TaskKind {
    pub fn task_type(&self) -> &'static str {
        match self {
            Self::ProcessSubmission { .. } => "process_submission",
            Self::RefreshCommunityCache { .. } => "refresh_community_cache",
            Self::RefreshAllCaches => "refresh_all_caches",
            Self::RefreshHeavyCache => "refresh_heavy_cache",
            Self::CleanupSubmissions => "cleanup_submissions",
            Self::CleanupUserMedia => "cleanup_usermedia",
            Self::DropStaleCaches => "drop_stale_caches",
        }
    }

    /// Wrap into the queue envelope.
    pub fn into_task(self) -> Result<Task, serde_json::Error> {
        Ok(Task {
            id: Uuid::new_v4().to_string(),
            task_type: self.task_type().to_string(),
            payload: serde_json::to_value(&self)?,
        })
    }

    pub fn from_task(task: &Task) -> Result<Self, serde_json::Error> {
        serde_json::from_value(task.payload.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_envelope_round_trip() {
        let id = Uuid::new_v4();
        let kind = TaskKind::ProcessSubmission { submission_id: id };
        let task = kind.into_task().unwrap();
        assert_eq!(task.task_type, "process_submission");

        match TaskKind::from_task(&task).unwrap() {
            TaskKind::ProcessSubmission { submission_id } => assert_eq!(submission_id, id),
            other => panic!("unexpected kind: {other:?}"),
        }
    }

    #[test]
    fn unit_kinds_round_trip() {
        for kind in [
            TaskKind::RefreshAllCaches,
            TaskKind::RefreshHeavyCache,
            TaskKind::CleanupSubmissions,
            TaskKind::CleanupUserMedia,
            TaskKind::DropStaleCaches,
        ] {
            let task = kind.clone().into_task().unwrap();
            let parsed = TaskKind::from_task(&task).unwrap();
            assert_eq!(task.task_type, parsed.task_type());
        }
    }
}
