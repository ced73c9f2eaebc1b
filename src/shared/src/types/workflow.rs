//! Workflow types
//!
//! A workflow is a named, validated DAG of steps with a shared result
//! context. Steps are bound to a provider and operation kind, carry a
//! parameter template, and may be conditionally skipped.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Workflow lifecycle status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    Draft,
    Running,
    Paused,
    Completed,
    Failed,
}

impl WorkflowStatus {
    /// Whether the status is terminal
    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkflowStatus::Completed | WorkflowStatus::Failed)
    }
}

impl std::fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkflowStatus::Draft => write!(f, "draft"),
            WorkflowStatus::Running => write!(f, "running"),
            WorkflowStatus::Paused => write!(f, "paused"),
            WorkflowStatus::Completed => write!(f, "completed"),
            WorkflowStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Per-step execution state
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StepState {
    Pending,
    Running,
    Completed,
    Skipped,
    Failed,
}

impl StepState {
    /// Skipped steps satisfy downstream dependencies but contribute no
    /// result.
    pub fn is_terminal_success(&self) -> bool {
        matches!(self, StepState::Completed | StepState::Skipped)
    }
}

/// One node in a workflow's DAG
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    /// Caller-chosen step identifier, unique within the workflow
    pub id: String,

    /// Target provider
    pub provider_id: Uuid,

    /// Operation kind
    pub kind: String,

    /// Parameter template; may contain `{{name}}` placeholders resolved
    /// against prior step results and workflow inputs
    pub params: serde_json::Value,

    /// Step ids this step depends on
    #[serde(default)]
    pub depends_on: Vec<String>,

    /// Optional condition template; a falsy resolution skips the step
    #[serde(default)]
    pub condition: Option<String>,

    /// When set, the step consults and populates the result cache with
    /// this TTL
    #[serde(default)]
    pub cache_ttl_ms: Option<u64>,

    /// Execution state, managed by the workflow engine
    #[serde(default = "default_step_state")]
    pub state: StepState,
}

fn default_step_state() -> StepState {
    StepState::Pending
}

impl Step {
    /// Create a step with no dependencies
    pub fn new(
        id: impl Into<String>,
        provider_id: Uuid,
        kind: impl Into<String>,
        params: serde_json::Value,
    ) -> Self {
        Self {
            id: id.into(),
            provider_id,
            kind: kind.into(),
            params,
            depends_on: Vec::new(),
            condition: None,
            cache_ttl_ms: None,
            state: StepState::Pending,
        }
    }

    /// Add dependencies on other steps
    pub fn depends_on(mut self, deps: &[&str]) -> Self {
        self.depends_on = deps.iter().map(|d| d.to_string()).collect();
        self
    }

    /// Attach a condition template
    pub fn when(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }
}

/// Workflow record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    /// Unique workflow identifier
    pub id: Uuid,

    /// Workflow name
    pub name: String,

    /// Workflow description
    pub description: Option<String>,

    /// Steps in declaration order; declaration order is the dispatch
    /// tie-break for simultaneously-ready steps
    pub steps: Vec<Step>,

    /// Lifecycle status
    pub status: WorkflowStatus,

    /// Accumulated step results, keyed by step id
    pub results: HashMap<String, serde_json::Value>,

    /// Error text when the workflow failed
    pub error: Option<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last mutation timestamp
    pub updated_at: DateTime<Utc>,
}

impl Workflow {
    /// Create a new workflow in `draft` state
    pub fn new(name: impl Into<String>, description: Option<String>, steps: Vec<Step>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description,
            steps,
            status: WorkflowStatus::Draft,
            results: HashMap::new(),
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Look up a step by id
    pub fn step(&self, id: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.id == id)
    }

    /// Whether every step reached terminal success
    pub fn all_steps_succeeded(&self) -> bool {
        self.steps.iter().all(|s| s.state.is_terminal_success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn step_builder() {
        let provider = Uuid::new_v4();
        let step = Step::new("fetch", provider, "http_get", json!({"url": "x"}))
            .depends_on(&["auth"])
            .when("{{auth.ok}}");
        assert_eq!(step.depends_on, vec!["auth"]);
        assert_eq!(step.condition.as_deref(), Some("{{auth.ok}}"));
        assert_eq!(step.state, StepState::Pending);
    }

    #[test]
    fn skipped_counts_as_terminal_success() {
        assert!(StepState::Skipped.is_terminal_success());
        assert!(StepState::Completed.is_terminal_success());
        assert!(!StepState::Failed.is_terminal_success());
        assert!(!StepState::Running.is_terminal_success());
    }

    #[test]
    fn new_workflow_is_draft() {
        let wf = Workflow::new("test", None, vec![]);
        assert_eq!(wf.status, WorkflowStatus::Draft);
        assert!(wf.results.is_empty());
    }
}
