use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Topics the registry publishes metrics events to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventTopic {
    Accounts,
    Moderation,
    Submissions,
    Downloads,
}

impl EventTopic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accounts => "metrics.accounts",
            Self::Moderation => "metrics.moderation",
            Self::Submissions => "metrics.submissions",
            Self::Downloads => "metrics.downloads",
        }
    }
}

/// A typed event on its way to the external broker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryEvent {
    pub topic: String,
    pub key: String,
    pub payload: serde_json::Value,
}

/// One-way, best-effort event publishing.
///
/// Implementations must capture their own errors; callers never fail
/// because the broker is down.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, topic: EventTopic, key: &str, payload: serde_json::Value);
}

/// Publisher used when no broker is configured.
pub struct NullPublisher;

#[async_trait]
impl EventPublisher for NullPublisher {
    async fn publish(&self, topic: EventTopic, key: &str, payload: serde_json::Value) {
        debug!(topic = topic.as_str(), key, ?payload, "Event dropped (no broker configured)");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_names_are_stable() {
        assert_eq!(EventTopic::Accounts.as_str(), "metrics.accounts");
        assert_eq!(EventTopic::Moderation.as_str(), "metrics.moderation");
        assert_eq!(EventTopic::Submissions.as_str(), "metrics.submissions");
        assert_eq!(EventTopic::Downloads.as_str(), "metrics.downloads");
    }
}
