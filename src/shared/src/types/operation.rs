//! Operation types
//!
//! One request/response unit of work against a provider. Terminal records
//! are immutable; retry creates a new operation rather than mutating the
//! old one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Operation lifecycle state
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum OperationState {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl OperationState {
    /// Whether the state is terminal
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OperationState::Completed | OperationState::Failed | OperationState::Cancelled
        )
    }
}

impl std::fmt::Display for OperationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OperationState::Pending => write!(f, "pending"),
            OperationState::Running => write!(f, "running"),
            OperationState::Completed => write!(f, "completed"),
            OperationState::Failed => write!(f, "failed"),
            OperationState::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Operation record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operation {
    /// Unique operation identifier
    pub id: Uuid,

    /// Owning provider
    pub provider_id: Uuid,

    /// Operation kind (provider-specific method name)
    pub kind: String,

    /// Input parameters
    pub params: serde_json::Value,

    /// Current state
    pub state: OperationState,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Dispatch timestamp
    pub started_at: Option<DateTime<Utc>>,

    /// Terminal-transition timestamp
    pub finished_at: Option<DateTime<Utc>>,

    /// Wall-clock duration in milliseconds
    pub duration_ms: Option<u64>,

    /// Result payload on success
    pub result: Option<serde_json::Value>,

    /// Error text on failure; always present on a failed record
    pub error: Option<String>,
}

impl Operation {
    /// Create a new operation in `pending` state
    pub fn new(provider_id: Uuid, kind: impl Into<String>, params: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            provider_id,
            kind: kind.into(),
            params,
            state: OperationState::Pending,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
            duration_ms: None,
            result: None,
            error: None,
        }
    }

    /// Transition `pending -> running`
    pub fn begin(&mut self) {
        self.state = OperationState::Running;
        self.started_at = Some(Utc::now());
    }

    /// Transition to `completed` with a result payload
    pub fn complete(&mut self, result: serde_json::Value) {
        self.result = Some(result);
        self.finish(OperationState::Completed);
    }

    /// Transition to `failed` with an error message
    pub fn fail(&mut self, error: impl Into<String>) {
        self.error = Some(error.into());
        self.finish(OperationState::Failed);
    }

    /// Transition to `cancelled`
    pub fn cancel(&mut self) {
        self.error = Some("cancelled".to_string());
        self.finish(OperationState::Cancelled);
    }

    fn finish(&mut self, state: OperationState) {
        let now = Utc::now();
        self.state = state;
        self.finished_at = Some(now);
        let origin = self.started_at.unwrap_or(self.created_at);
        self.duration_ms = Some((now - origin).num_milliseconds().max(0) as u64);
    }
}
