//! Orchestrator Service Module
//!
//! Facade wiring the registry, operation engine, workflow engine, cache,
//! and event log together behind one handle. The embedding application
//! constructs it with a [`ProviderExecutor`] and the loaded configuration;
//! everything else is internal plumbing.

use crate::{
    analytics::{self, AnalyticsSnapshot},
    cache::{CacheStats, ResultCache},
    config::OrchestratorConfig,
    events::EventLog,
    executor::ProviderExecutor,
    operations::OperationEngine,
    registry::ProviderRegistry,
    workflow::WorkflowEngine,
    Result,
};
use conductor_shared::types::{
    EventRecord, Operation, Provider, ProviderConfig, Step, Workflow,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::info;
use uuid::Uuid;

/// Orchestration core handle
pub struct Orchestrator {
    config: OrchestratorConfig,
    registry: Arc<ProviderRegistry>,
    operations: Arc<OperationEngine>,
    workflows: Arc<WorkflowEngine>,
    cache: Arc<ResultCache>,
    events: Arc<EventLog>,
}

impl Orchestrator {
    /// Assemble the core around an executor
    pub fn new(config: OrchestratorConfig, executor: Arc<dyn ProviderExecutor>) -> Self {
        let events = Arc::new(EventLog::new(config.max_events));
        let cache = Arc::new(ResultCache::new());
        let registry = Arc::new(ProviderRegistry::new(
            executor.clone(),
            events.clone(),
            config.max_providers,
            Duration::from_millis(config.connect_probe_timeout_ms),
        ));
        let operations = Arc::new(OperationEngine::new(
            registry.clone(),
            executor,
            cache.clone(),
            events.clone(),
            config.max_operation_history,
            Duration::from_millis(config.default_timeout_ms),
        ));
        let workflows = Arc::new(WorkflowEngine::new(
            operations.clone(),
            registry.clone(),
            events.clone(),
        ));

        info!(
            environment = %config.environment,
            max_providers = config.max_providers,
            "Orchestrator initialized"
        );

        Self {
            config,
            registry,
            operations,
            workflows,
            cache,
            events,
        }
    }

    // ---- providers ----

    /// Register a provider
    pub async fn register_provider(&self, config: ProviderConfig) -> Result<Uuid> {
        self.registry.register(config).await
    }

    /// Remove a provider and purge its cached results; silent when absent
    pub async fn remove_provider(&self, provider_id: Uuid) {
        if self.registry.remove(provider_id).await.is_some() {
            let purged = self.cache.clear(Some(provider_id));
            if purged > 0 {
                info!(provider_id = %provider_id, purged, "Purged cache entries for removed provider");
            }
        }
    }

    /// Connect a provider
    pub async fn connect_provider(&self, provider_id: Uuid) -> Result<()> {
        self.registry.connect(provider_id).await
    }

    /// Disconnect a provider
    pub async fn disconnect_provider(&self, provider_id: Uuid) -> Result<()> {
        self.registry.disconnect(provider_id).await
    }

    /// Look up a provider
    pub async fn provider(&self, provider_id: Uuid) -> Option<Provider> {
        self.registry.get(provider_id).await
    }

    /// List all providers
    pub async fn providers(&self) -> Vec<Provider> {
        self.registry.list().await
    }

    // ---- operations ----

    /// Execute one operation, bypassing the cache
    pub async fn execute_operation(
        &self,
        provider_id: Uuid,
        kind: &str,
        params: Value,
    ) -> Result<Operation> {
        self.operations
            .execute(provider_id, kind, params, None, None)
            .await
    }

    /// Execute one operation through the result cache
    ///
    /// `ttl: None` uses the configured default TTL.
    pub async fn execute_cached(
        &self,
        provider_id: Uuid,
        kind: &str,
        params: Value,
        ttl: Option<Duration>,
    ) -> Result<Operation> {
        let ttl = ttl.unwrap_or(Duration::from_millis(self.config.default_cache_ttl_ms));
        self.operations
            .execute(provider_id, kind, params, Some(ttl), None)
            .await
    }

    /// Cancel an in-flight operation; a no-op for unknown or terminal ids
    pub fn cancel_operation(&self, operation_id: Uuid) {
        self.operations.cancel(operation_id)
    }

    /// Re-execute a finished operation as a fresh record
    pub async fn retry_operation(&self, operation_id: Uuid) -> Result<Operation> {
        self.operations.retry(operation_id).await
    }

    /// Look up a finished operation record
    pub fn operation(&self, operation_id: Uuid) -> Option<Operation> {
        self.operations.get(operation_id)
    }

    /// Most recent finished operations, oldest first
    pub fn recent_operations(&self, limit: usize) -> Vec<Operation> {
        self.operations.recent(limit)
    }

    /// Ids of operations currently in flight
    pub fn active_operations(&self) -> Vec<Uuid> {
        self.operations.active_operations()
    }

    // ---- workflows ----

    /// Create a workflow in `draft` state
    pub async fn create_workflow(
        &self,
        name: impl Into<String>,
        description: Option<String>,
        steps: Vec<Step>,
    ) -> Result<Uuid> {
        self.workflows.create(name, description, steps).await
    }

    /// Validate a stored workflow without executing it
    pub async fn validate_workflow(&self, workflow_id: Uuid) -> Result<()> {
        self.workflows.validate(workflow_id).await
    }

    /// Execute a workflow to completion (or pause)
    pub async fn execute_workflow(
        &self,
        workflow_id: Uuid,
        inputs: HashMap<String, Value>,
    ) -> Result<Workflow> {
        self.workflows.execute(workflow_id, inputs).await
    }

    /// Request a workflow pause
    pub async fn pause_workflow(&self, workflow_id: Uuid) -> Result<()> {
        self.workflows.pause(workflow_id).await
    }

    /// Resume a paused workflow
    pub async fn resume_workflow(&self, workflow_id: Uuid) -> Result<Workflow> {
        self.workflows.resume(workflow_id).await
    }

    /// Cancel a running or paused workflow
    pub async fn cancel_workflow(&self, workflow_id: Uuid) -> Result<()> {
        self.workflows.cancel(workflow_id).await
    }

    /// Delete a workflow; a running workflow must be cancelled first
    pub async fn delete_workflow(&self, workflow_id: Uuid) -> Result<()> {
        self.workflows.delete(workflow_id).await
    }

    /// Look up a workflow
    pub async fn workflow(&self, workflow_id: Uuid) -> Option<Workflow> {
        self.workflows.get(workflow_id).await
    }

    /// List all workflows
    pub async fn list_workflows(&self) -> Vec<Workflow> {
        self.workflows.list().await
    }

    // ---- cache ----

    /// Cache occupancy counters
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Evict expired cache entries, returning the count removed
    pub fn evict_expired_cache(&self) -> usize {
        self.cache.evict_expired()
    }

    /// Clear the cache, optionally scoped to one provider
    pub fn clear_cache(&self, provider_id: Option<Uuid>) -> usize {
        self.cache.clear(provider_id)
    }

    // ---- events & analytics ----

    /// Most recent lifecycle events, oldest first
    pub fn recent_events(&self, limit: usize) -> Vec<EventRecord> {
        self.events.recent(limit)
    }

    /// Subscribe to live lifecycle events
    pub fn subscribe(&self) -> broadcast::Receiver<EventRecord> {
        self.events.subscribe()
    }

    /// Compute a point-in-time analytics rollup
    pub async fn analytics(&self) -> AnalyticsSnapshot {
        analytics::snapshot(&self.registry, &self.workflows, &self.cache, &self.events).await
    }
}
