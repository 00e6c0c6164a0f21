//! Task dispatch.

use common::task::TaskKind;
use tracing::{info, instrument};

use crate::context::RegistryContext;
use crate::error::WorkerError;
use crate::{caches, submission, usermedia};

/// Run one task to completion. All handlers are idempotent, so re-running
/// after a crash or redelivery is always safe.
#[instrument(skip(ctx), fields(task_type = kind.task_type()))]
pub async fn run_task(ctx: &RegistryContext, kind: TaskKind) -> Result<(), WorkerError> {
    info!("Running task");
    match kind {
        TaskKind::ProcessSubmission { submission_id } => {
            submission::process_submission(ctx, submission_id).await
        }
        TaskKind::RefreshCommunityCache { community_id } => {
            caches::refresh_community_cache(ctx, community_id).await
        }
        TaskKind::RefreshAllCaches => caches::refresh_all_caches(ctx).await,
        TaskKind::RefreshHeavyCache => caches::refresh_heavy_cache(ctx).await,
        TaskKind::CleanupSubmissions => submission::cleanup_submissions(ctx).await.map(|_| ()),
        TaskKind::CleanupUserMedia => usermedia::cleanup_expired(ctx).await.map(|_| ()),
        TaskKind::DropStaleCaches => caches::drop_stale_caches(ctx).await,
    }
}
