//! Analytics Module
//!
//! Point-in-time rollups over providers, workflows, the cache, and the
//! event log. Snapshots are computed on demand from live state; nothing
//! here is persisted or sampled on a timer.

use crate::{cache::CacheStats, events::EventLog, registry::ProviderRegistry, workflow::WorkflowEngine};
use crate::cache::ResultCache;
use chrono::{DateTime, Utc};
use conductor_shared::types::{ProviderStatus, WorkflowStatus};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-provider rollup line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRollup {
    /// Provider identifier
    pub provider_id: Uuid,

    /// Provider name
    pub name: String,

    /// Connectivity status at snapshot time
    pub status: ProviderStatus,

    /// Total operations dispatched
    pub total_operations: u64,

    /// Operations that succeeded
    pub succeeded: u64,

    /// Operations that failed or timed out
    pub failed: u64,

    /// Success rate percentage
    pub success_rate: f64,

    /// Mean response time in milliseconds
    pub avg_response_time_ms: f64,

    /// Tokens consumed
    pub tokens_used: u64,

    /// Cost incurred
    pub cost: f64,

    /// Operations dispatched today
    pub operations_today: u64,

    /// Operations dispatched this ISO week
    pub operations_this_week: u64,
}

/// Workflow population counters
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct WorkflowRollup {
    /// All stored workflows
    pub total: usize,

    /// Workflows in `draft`
    pub draft: usize,

    /// Workflows in `running`
    pub running: usize,

    /// Workflows in `paused`
    pub paused: usize,

    /// Workflows that completed
    pub completed: usize,

    /// Workflows that failed
    pub failed: usize,

    /// Completed / (completed + failed) percentage; 0 when none finished
    pub success_rate: f64,
}

/// Point-in-time analytics rollup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsSnapshot {
    /// Snapshot timestamp
    pub generated_at: DateTime<Utc>,

    /// Registered providers
    pub total_providers: usize,

    /// Providers currently connected
    pub connected_providers: usize,

    /// Per-provider rollup lines
    pub providers: Vec<ProviderRollup>,

    /// Operations dispatched across all providers
    pub total_operations: u64,

    /// Successful operations across all providers
    pub succeeded_operations: u64,

    /// Failed operations across all providers
    pub failed_operations: u64,

    /// Overall success rate percentage
    pub overall_success_rate: f64,

    /// Operation-count-weighted mean response time in milliseconds
    pub avg_response_time_ms: f64,

    /// Tokens consumed across all providers
    pub tokens_used: u64,

    /// Cost incurred across all providers
    pub total_cost: f64,

    /// Operations dispatched today across all providers
    pub operations_today: u64,

    /// Operations dispatched this ISO week across all providers
    pub operations_this_week: u64,

    /// Provider with the highest mean response time among those with
    /// recorded operations
    pub slowest_provider: Option<Uuid>,

    /// Cache occupancy counters
    pub cache: CacheStats,

    /// Workflow population counters
    pub workflows: WorkflowRollup,

    /// Lifecycle events currently retained in the log
    pub events_retained: usize,
}

/// Compute a rollup from live orchestrator state
pub async fn snapshot(
    registry: &ProviderRegistry,
    workflows: &WorkflowEngine,
    cache: &ResultCache,
    events: &EventLog,
) -> AnalyticsSnapshot {
    let providers = registry.list().await;

    let mut lines = Vec::with_capacity(providers.len());
    let mut total_operations = 0u64;
    let mut succeeded = 0u64;
    let mut failed = 0u64;
    let mut weighted_response = 0.0f64;
    let mut tokens_used = 0u64;
    let mut total_cost = 0.0f64;
    let mut operations_today = 0u64;
    let mut operations_this_week = 0u64;
    let mut connected = 0usize;

    for provider in &providers {
        if provider.is_connected() {
            connected += 1;
        }
        total_operations += provider.metrics.total_operations;
        succeeded += provider.metrics.succeeded;
        failed += provider.metrics.failed;
        weighted_response +=
            provider.metrics.avg_response_time_ms * provider.metrics.total_operations as f64;
        tokens_used += provider.metrics.tokens_used;
        total_cost += provider.metrics.cost;
        operations_today += provider.metrics.operations_today;
        operations_this_week += provider.metrics.operations_this_week;

        lines.push(ProviderRollup {
            provider_id: provider.id,
            name: provider.config.name.clone(),
            status: provider.health.status,
            total_operations: provider.metrics.total_operations,
            succeeded: provider.metrics.succeeded,
            failed: provider.metrics.failed,
            success_rate: provider.health.success_rate,
            avg_response_time_ms: provider.metrics.avg_response_time_ms,
            tokens_used: provider.metrics.tokens_used,
            cost: provider.metrics.cost,
            operations_today: provider.metrics.operations_today,
            operations_this_week: provider.metrics.operations_this_week,
        });
    }

    let overall_success_rate = if total_operations == 0 {
        0.0
    } else {
        succeeded as f64 / total_operations as f64 * 100.0
    };
    let avg_response_time_ms = if total_operations == 0 {
        0.0
    } else {
        weighted_response / total_operations as f64
    };

    let mut workflow_rollup = WorkflowRollup::default();
    for workflow in workflows.list().await {
        workflow_rollup.total += 1;
        match workflow.status {
            WorkflowStatus::Draft => workflow_rollup.draft += 1,
            WorkflowStatus::Running => workflow_rollup.running += 1,
            WorkflowStatus::Paused => workflow_rollup.paused += 1,
            WorkflowStatus::Completed => workflow_rollup.completed += 1,
            WorkflowStatus::Failed => workflow_rollup.failed += 1,
        }
    }
    let finished = workflow_rollup.completed + workflow_rollup.failed;
    workflow_rollup.success_rate = if finished == 0 {
        0.0
    } else {
        workflow_rollup.completed as f64 / finished as f64 * 100.0
    };

    let slowest_provider = lines
        .iter()
        .filter(|line| line.total_operations > 0)
        .max_by(|a, b| {
            a.avg_response_time_ms
                .partial_cmp(&b.avg_response_time_ms)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|line| line.provider_id);

    AnalyticsSnapshot {
        generated_at: Utc::now(),
        total_providers: providers.len(),
        connected_providers: connected,
        providers: lines,
        total_operations,
        succeeded_operations: succeeded,
        failed_operations: failed,
        overall_success_rate,
        avg_response_time_ms,
        tokens_used,
        total_cost,
        operations_today,
        operations_this_week,
        slowest_provider,
        cache: cache.stats(),
        workflows: workflow_rollup,
        events_retained: events.len(),
    }
}
