pub mod config;
pub mod error;
pub mod models;
pub mod publisher;

pub use config::ConsumeConfig;
pub use error::MqError;
pub use models::{BrokerMessage, BroccoliError, MqBuilder, MqConfig, MqQueue, init_mq};
pub use publisher::MqEventPublisher;

pub type Mq = MqQueue;
