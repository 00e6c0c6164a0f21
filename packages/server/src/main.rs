use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::http::{HeaderValue, Method};
use common::storage::build_storage;
use mq::{MqConfig, init_mq};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::info;

use server::config::{AppConfig, CorsConfig};
use server::state::AppState;
use server::{build_router, database, seed};
use worker::RegistryContext;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_target(false).init();

    let config = AppConfig::load().context("Failed to load config")?;

    let db = database::init_db(&config.database)
        .await
        .context("Failed to initialize database")?;
    seed::seed_communities(&db).await?;

    let storage = build_storage(&config.storage)
        .await
        .context("Failed to initialize storage")?;

    let (events, mq_handle) = if config.mq.enabled {
        let mq = Arc::new(
            init_mq(MqConfig::from(&config.mq))
                .await
                .context("Failed to initialize MQ")?,
        );
        let publisher = Arc::new(mq::MqEventPublisher::new(
            Arc::clone(&mq),
            config.mq.event_queue_name.clone(),
        )) as Arc<dyn common::event::EventPublisher>;
        (publisher, Some(mq))
    } else {
        // Tasks run inline on the request path and events are dropped.
        info!("MQ disabled; processing tasks inline");
        (
            Arc::new(common::event::NullPublisher) as Arc<dyn common::event::EventPublisher>,
            None,
        )
    };

    let ctx = RegistryContext {
        db: db.clone(),
        storage,
        events,
        repository: config.repository.clone(),
        mq: mq_handle,
        task_queue_name: config.mq.task_queue_name.clone(),
    };

    let config = Arc::new(config);
    let state = AppState {
        db,
        config: Arc::clone(&config),
        ctx,
    };

    let app = build_router(state).layer(cors_layer(&config.server.cors)?);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Listening on {addr}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

fn cors_layer(config: &CorsConfig) -> anyhow::Result<CorsLayer> {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers(Any)
        .max_age(std::time::Duration::from_secs(config.max_age));

    if config.allow_origins.iter().any(|o| o == "*") {
        return Ok(layer.allow_origin(Any));
    }

    let origins = config
        .allow_origins
        .iter()
        .map(|o| {
            o.parse::<HeaderValue>()
                .with_context(|| format!("Invalid CORS origin: {o}"))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    Ok(layer.allow_origin(AllowOrigin::list(origins)))
}
