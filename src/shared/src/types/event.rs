//! Lifecycle event schema
//!
//! Events record provider status changes, operation outcomes, and workflow
//! state changes. The orchestrator keeps them in a bounded ring and fans
//! them out to subscribers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::provider::ProviderStatus;
use super::workflow::WorkflowStatus;

/// Lifecycle event payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type")]
#[serde(rename_all = "snake_case")]
pub enum OrchestratorEvent {
    ProviderStatusChanged {
        provider_id: Uuid,
        from: ProviderStatus,
        to: ProviderStatus,
    },
    OperationCompleted {
        operation_id: Uuid,
        provider_id: Uuid,
        kind: String,
        duration_ms: u64,
    },
    OperationFailed {
        operation_id: Uuid,
        provider_id: Uuid,
        kind: String,
        error: String,
    },
    WorkflowStatusChanged {
        workflow_id: Uuid,
        from: WorkflowStatus,
        to: WorkflowStatus,
    },
}

/// A logged event with identity and timestamp
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    /// Unique event identifier
    pub id: Uuid,

    /// Emission timestamp
    pub timestamp: DateTime<Utc>,

    /// Event payload
    #[serde(flatten)]
    pub event: OrchestratorEvent,
}

impl EventRecord {
    /// Wrap an event with identity and timestamp
    pub fn new(event: OrchestratorEvent) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            event,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_serializes_with_type_tag() {
        let record = EventRecord::new(OrchestratorEvent::ProviderStatusChanged {
            provider_id: Uuid::new_v4(),
            from: ProviderStatus::Disconnected,
            to: ProviderStatus::Connecting,
        });
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["event_type"], "provider_status_changed");
        assert_eq!(json["from"], "disconnected");
        assert_eq!(json["to"], "connecting");
    }
}
