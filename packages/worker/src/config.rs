use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

pub use common::config::{DatabaseConfig, MqAppConfig, RepositoryConfig, StorageConfig};

/// Worker-specific configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct WorkerConfig {
    /// Unique identifier for this worker instance. Default: "worker-1".
    #[serde(default = "default_worker_id")]
    pub id: String,
    /// Number of tasks processed concurrently. Default: 4.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Whether this instance runs the periodic task scheduler. Exactly one
    /// worker per deployment should.
    #[serde(default = "default_run_scheduler")]
    pub run_scheduler: bool,
}

fn default_worker_id() -> String {
    "worker-1".into()
}
fn default_batch_size() -> usize {
    4
}
fn default_run_scheduler() -> bool {
    true
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            id: default_worker_id(),
            batch_size: default_batch_size(),
            run_scheduler: default_run_scheduler(),
        }
    }
}

/// Worker application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct WorkerAppConfig {
    #[serde(default)]
    pub worker: WorkerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub mq: MqAppConfig,
    #[serde(default)]
    pub repository: RepositoryConfig,
}

impl WorkerAppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("MODVAULT_CONFIG").unwrap_or_else(|_| "config/config".to_string());

        let s = Config::builder()
            .add_source(File::with_name(&config_path).required(false))
            .add_source(Environment::with_prefix("MODVAULT").separator("__"))
            .build()?;

        let config: Self = s.try_deserialize()?;
        Ok(Self {
            repository: config.repository.clone().with_env_overrides(),
            ..config
        })
    }
}
