use std::sync::Arc;

use sea_orm::DatabaseConnection;
use worker::RegistryContext;

use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Arc<AppConfig>,
    /// Shared registry context; handlers reach storage, events and the
    /// task queue through it.
    pub ctx: RegistryContext,
}
