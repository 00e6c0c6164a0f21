use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use common::storage::build_storage;
use common::task::{Task, TaskKind};
use mq::{BroccoliError, BrokerMessage, MqConfig, init_mq};
use sea_orm::{ConnectOptions, Database};
use tracing::{error, info, warn};
use worker::config::WorkerAppConfig;
use worker::runner::run_task;
use worker::scheduler::spawn_scheduler;
use worker::{RegistryContext, WorkerError};

const MAX_ATTEMPTS: u32 = 3;
const RETRY_BASE_DELAY: Duration = Duration::from_millis(500);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_target(false).init();

    let config = WorkerAppConfig::load().context("Failed to load config")?;
    info!("Worker starting: {}", config.worker.id);

    let mut db_options = ConnectOptions::new(&config.database.url);
    db_options.max_connections(config.database.max_connections);
    let db = Database::connect(db_options)
        .await
        .context("Failed to connect to database")?;

    let storage = build_storage(&config.storage)
        .await
        .context("Failed to initialize storage")?;

    if !config.mq.enabled {
        warn!("MQ disabled; running scheduler only");
        let ctx = RegistryContext {
            db,
            storage,
            events: Arc::new(common::event::NullPublisher),
            repository: config.repository.clone(),
            mq: None,
            task_queue_name: config.mq.task_queue_name.clone(),
        };
        let _handles = spawn_scheduler(ctx);
        tokio::signal::ctrl_c().await?;
        return Ok(());
    }

    let mq = Arc::new(
        init_mq(MqConfig::from(&config.mq))
            .await
            .context("Failed to initialize MQ")?,
    );
    info!(
        task_queue = %config.mq.task_queue_name,
        event_queue = %config.mq.event_queue_name,
        "MQ connected"
    );

    let ctx = RegistryContext {
        db,
        storage,
        events: Arc::new(mq::MqEventPublisher::new(
            Arc::clone(&mq),
            config.mq.event_queue_name.clone(),
        )),
        repository: config.repository.clone(),
        mq: Some(Arc::clone(&mq)),
        task_queue_name: config.mq.task_queue_name.clone(),
    };

    let _scheduler_handles = if config.worker.run_scheduler {
        spawn_scheduler(ctx.clone())
    } else {
        Vec::new()
    };

    let handler_ctx = ctx.clone();
    let result = mq
        .process_messages(
            &config.mq.task_queue_name,
            Some(config.worker.batch_size), // concurrent workers
            None,
            move |message: BrokerMessage<Task>| {
                let ctx = handler_ctx.clone();
                async move { process_message(&ctx, message).await }
            },
        )
        .await;

    if let Err(e) = result {
        error!(error = %e, "Worker stopped unexpectedly");
    }

    Ok(())
}

async fn process_message(
    ctx: &RegistryContext,
    message: BrokerMessage<Task>,
) -> Result<(), BroccoliError> {
    let task = message.payload;
    let task_id = task.id.clone();

    let kind = match TaskKind::from_task(&task) {
        Ok(kind) => kind,
        Err(e) => {
            error!(task_id = %task_id, task_type = %task.task_type, "Unparseable task dropped: {e}");
            return Ok(());
        }
    };

    let mut attempt = 1u32;
    loop {
        match run_task(ctx, kind.clone()).await {
            Ok(()) => return Ok(()),
            Err(e) if e.is_retryable() && attempt < MAX_ATTEMPTS => {
                let delay = RETRY_BASE_DELAY * 2u32.pow(attempt - 1);
                warn!(
                    task_id = %task_id,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "Task failed, retrying: {e}"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e @ WorkerError::Validation(_)) => {
                // Validation outcomes are recorded on their rows; nothing
                // to retry.
                warn!(task_id = %task_id, "Task rejected input: {e}");
                return Ok(());
            }
            Err(e) => {
                error!(task_id = %task_id, attempt, "Task failed permanently: {e}");
                return Ok(());
            }
        }
    }
}
