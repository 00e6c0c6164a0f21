//! Periodic task scheduling.
//!
//! One worker instance runs these loops; each tick executes the task
//! directly rather than round-tripping through the queue.

use std::time::Duration;

use common::task::TaskKind;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::context::RegistryContext;
use crate::runner::run_task;

pub const CACHE_REFRESH_INTERVAL: Duration = Duration::from_secs(3600);
pub const SUBMISSION_CLEANUP_INTERVAL: Duration = Duration::from_secs(20 * 60);
pub const USERMEDIA_CLEANUP_INTERVAL: Duration = Duration::from_secs(3600);
pub const STALE_CACHE_SWEEP_INTERVAL: Duration = Duration::from_secs(3600);

/// Spawn all periodic loops. Handles run until process exit.
pub fn spawn_scheduler(ctx: RegistryContext) -> Vec<JoinHandle<()>> {
    info!("Starting periodic task scheduler");
    vec![
        spawn_interval(ctx.clone(), CACHE_REFRESH_INTERVAL, TaskKind::RefreshAllCaches),
        spawn_interval(ctx.clone(), CACHE_REFRESH_INTERVAL, TaskKind::RefreshHeavyCache),
        spawn_interval(
            ctx.clone(),
            SUBMISSION_CLEANUP_INTERVAL,
            TaskKind::CleanupSubmissions,
        ),
        spawn_interval(
            ctx.clone(),
            USERMEDIA_CLEANUP_INTERVAL,
            TaskKind::CleanupUserMedia,
        ),
        spawn_interval(ctx, STALE_CACHE_SWEEP_INTERVAL, TaskKind::DropStaleCaches),
    ]
}

fn spawn_interval(ctx: RegistryContext, period: Duration, kind: TaskKind) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The immediate first tick is skipped; steady state only.
        interval.tick().await;
        loop {
            interval.tick().await;
            if let Err(e) = run_task(&ctx, kind.clone()).await {
                warn!(task_type = kind.task_type(), "Scheduled task failed: {e}");
            }
        }
    })
}
