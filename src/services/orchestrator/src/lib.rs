//! Conductor Orchestrator Library
//!
//! This library provides the orchestration core of the Conductor platform:
//! it tracks the health of pluggable capability providers, executes single
//! operations against them through an injected executor, and runs
//! multi-step workflows whose steps declare dependencies, carry templated
//! parameters, and may be conditionally skipped.
//!
//! # Features
//!
//! - **Provider Registry**: configuration, connectivity state, and live
//!   operation metrics per provider
//! - **Operation Engine**: single-call lifecycle with deadlines,
//!   cooperative cancellation, and retry
//! - **Workflow Engine**: DAG validation (cycle detection, referential
//!   integrity) and dependency-ordered concurrent step dispatch
//! - **Result Cache**: TTL'd key/value store with hit accounting
//! - **Template Engine**: recursive `{{name}}` substitution over parameter
//!   trees
//! - **Analytics**: on-demand rollups over the registry and operation
//!   history
//!
//! Transport is not part of this crate: callers supply a
//! [`executor::ProviderExecutor`] implementation per deployment and embed
//! the [`service::Orchestrator`] facade directly.

use thiserror::Error;
use uuid::Uuid;

/// Orchestrator error taxonomy
#[derive(Error, Debug)]
pub enum OrchestratorError {
    /// Provider id does not resolve to a registered provider
    #[error("provider {0} is not registered")]
    ProviderUnavailable(Uuid),

    /// Provider exists but is disabled
    #[error("provider {0} is disabled")]
    DisabledProvider(Uuid),

    /// The provider executor reported a failure
    #[error("executor failure: {0}")]
    ExecutorFailure(String),

    /// The provider's configured deadline elapsed
    #[error("operation timed out after {0} ms")]
    Timeout(u64),

    /// The operation was cancelled by the caller
    #[error("operation cancelled")]
    Cancelled,

    /// Workflow step graph contains a cycle
    #[error("cyclic dependency involving step '{0}'")]
    CyclicDependency(String),

    /// A step depends on a step id that does not exist in the workflow
    #[error("step '{step}' depends on unknown step '{dependency}'")]
    DanglingDependency { step: String, dependency: String },

    /// Aggregate validation failure (empty name, duplicate step ids, bad
    /// request shape)
    #[error("validation failed: {0}")]
    ValidationFailure(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<validator::ValidationErrors> for OrchestratorError {
    fn from(errors: validator::ValidationErrors) -> Self {
        OrchestratorError::ValidationFailure(errors.to_string())
    }
}

/// Type alias for Result with OrchestratorError
pub type Result<T> = std::result::Result<T, OrchestratorError>;

// Public modules
pub mod analytics;
pub mod cache;
pub mod config;
pub mod events;
pub mod executor;
pub mod operations;
pub mod registry;
pub mod service;
pub mod telemetry;
pub mod template;
pub mod workflow;

// Re-exports for convenience
pub use analytics::AnalyticsSnapshot;
pub use cache::ResultCache;
pub use config::OrchestratorConfig;
pub use events::EventLog;
pub use executor::{ExecutorOutcome, ProviderExecutor};
pub use operations::OperationEngine;
pub use registry::ProviderRegistry;
pub use service::Orchestrator;
pub use workflow::WorkflowEngine;
