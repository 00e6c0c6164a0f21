use std::sync::Arc;

use async_trait::async_trait;
use common::event::{EventPublisher, EventTopic, RegistryEvent};
use tracing::warn;

use crate::models::MqQueue;

/// Publishes registry events onto the shared event queue. Failures are
/// logged and swallowed; event delivery never blocks the request path.
pub struct MqEventPublisher {
    mq: Arc<MqQueue>,
    queue_name: String,
}

impl MqEventPublisher {
    pub fn new(mq: Arc<MqQueue>, queue_name: String) -> Self {
        Self { mq, queue_name }
    }
}

#[async_trait]
impl EventPublisher for MqEventPublisher {
    async fn publish(&self, topic: EventTopic, key: &str, payload: serde_json::Value) {
        let event = RegistryEvent {
            topic: topic.as_str().to_string(),
            key: key.to_string(),
            payload,
        };
        if let Err(e) = self.mq.publish(&self.queue_name, None, &event, None).await {
            warn!(
                topic = topic.as_str(),
                key = event.key,
                "Failed to publish event: {e}"
            );
        }
    }
}
