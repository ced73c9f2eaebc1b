//! Operation Engine Module
//!
//! Dispatches single operations against providers: deadline enforcement,
//! cooperative cancellation, result caching, metrics attribution, and a
//! bounded history of finished records. Runtime outcomes (failure,
//! timeout, cancellation) come back as terminal operation records; only
//! dispatch-rejection conditions surface as errors.

use crate::{
    cache::{cache_key, ResultCache},
    events::EventLog,
    executor::ProviderExecutor,
    registry::ProviderRegistry,
    OrchestratorError, Result,
};
use conductor_shared::types::{Operation, OrchestratorEvent};
use dashmap::DashMap;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Single-operation dispatch engine
pub struct OperationEngine {
    /// Provider registry, consulted for dispatch eligibility and metrics
    registry: Arc<ProviderRegistry>,

    /// Executor operations are dispatched through
    executor: Arc<dyn ProviderExecutor>,

    /// Result cache, consulted only when the caller supplies a TTL
    cache: Arc<ResultCache>,

    /// Lifecycle event sink
    events: Arc<EventLog>,

    /// Finished operation records, oldest evicted beyond the bound
    history: RwLock<VecDeque<Operation>>,

    /// Cancellation tokens for in-flight operations
    active: DashMap<Uuid, CancellationToken>,

    /// History bound
    max_history: usize,

    /// Deadline applied when a provider config sets none
    default_timeout: Duration,
}

impl OperationEngine {
    /// Create a new engine
    pub fn new(
        registry: Arc<ProviderRegistry>,
        executor: Arc<dyn ProviderExecutor>,
        cache: Arc<ResultCache>,
        events: Arc<EventLog>,
        max_history: usize,
        default_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            executor,
            cache,
            events,
            history: RwLock::new(VecDeque::with_capacity(max_history.min(64))),
            active: DashMap::new(),
            max_history,
            default_timeout,
        }
    }

    /// Execute one operation against a provider
    ///
    /// Returns `Err` only when dispatch is rejected outright (unknown or
    /// disabled provider). Executor failures, deadline expiry, and
    /// cancellation all return `Ok` with a terminal record carrying the
    /// error text.
    ///
    /// When `cache_ttl` is set the cache is consulted first; a hit
    /// synthesizes a completed record without touching the executor or the
    /// provider's metrics. When `parent` is set, cancelling the parent
    /// token cancels this operation.
    pub async fn execute(
        &self,
        provider_id: Uuid,
        kind: &str,
        params: Value,
        cache_ttl: Option<Duration>,
        parent: Option<&CancellationToken>,
    ) -> Result<Operation> {
        let provider = self
            .registry
            .get(provider_id)
            .await
            .ok_or(OrchestratorError::ProviderUnavailable(provider_id))?;
        if !provider.is_enabled() {
            return Err(OrchestratorError::DisabledProvider(provider_id));
        }

        let key = cache_ttl.map(|_| cache_key(provider_id, kind, &params));
        if let Some(key) = &key {
            if let Some(result) = self.cache.get(key) {
                debug!(provider_id = %provider_id, kind, "Cache hit");
                let mut operation = Operation::new(provider_id, kind, params);
                operation.begin();
                operation.complete(result);
                self.events.emit(OrchestratorEvent::OperationCompleted {
                    operation_id: operation.id,
                    provider_id,
                    kind: kind.to_string(),
                    duration_ms: operation.duration_ms.unwrap_or(0),
                });
                self.push_history(operation.clone());
                return Ok(operation);
            }
        }

        let mut operation = Operation::new(provider_id, kind, params);
        let token = parent
            .map(|p| p.child_token())
            .unwrap_or_else(CancellationToken::new);
        self.active.insert(operation.id, token.clone());
        operation.begin();

        let deadline = provider
            .config
            .timeout_ms
            .map(Duration::from_millis)
            .unwrap_or(self.default_timeout);
        let call_params = operation.params.clone();
        let invocation = tokio::time::timeout(
            deadline,
            self.executor
                .invoke(provider_id, kind, &call_params, deadline),
        );

        tokio::select! {
            _ = token.cancelled() => {
                operation.cancel();
                info!(operation_id = %operation.id, "Operation cancelled");
                self.events.emit(OrchestratorEvent::OperationFailed {
                    operation_id: operation.id,
                    provider_id,
                    kind: kind.to_string(),
                    error: "cancelled".to_string(),
                });
            }
            outcome = invocation => match outcome {
                Ok(Ok(outcome)) => {
                    operation.complete(outcome.result.clone());
                    let duration_ms = operation.duration_ms.unwrap_or(0);
                    self.registry
                        .record_operation_success(
                            provider_id,
                            duration_ms,
                            outcome.tokens_used,
                            outcome.cost,
                        )
                        .await;
                    if let Some(key) = key {
                        if let Some(ttl) = cache_ttl {
                            self.cache.put(key, provider_id, kind, outcome.result, ttl);
                        }
                    }
                    self.events.emit(OrchestratorEvent::OperationCompleted {
                        operation_id: operation.id,
                        provider_id,
                        kind: kind.to_string(),
                        duration_ms,
                    });
                    debug!(
                        operation_id = %operation.id,
                        duration_ms,
                        "Operation completed"
                    );
                }
                Ok(Err(e)) => {
                    let error = e.to_string();
                    operation.fail(&error);
                    self.registry.record_operation_failure(provider_id).await;
                    self.events.emit(OrchestratorEvent::OperationFailed {
                        operation_id: operation.id,
                        provider_id,
                        kind: kind.to_string(),
                        error: error.clone(),
                    });
                    warn!(operation_id = %operation.id, error = %error, "Operation failed");
                }
                Err(_) => {
                    let error = format!("timed out after {}ms", deadline.as_millis());
                    operation.fail(&error);
                    self.registry.record_operation_failure(provider_id).await;
                    self.events.emit(OrchestratorEvent::OperationFailed {
                        operation_id: operation.id,
                        provider_id,
                        kind: kind.to_string(),
                        error: error.clone(),
                    });
                    warn!(operation_id = %operation.id, error = %error, "Operation timed out");
                }
            }
        }

        self.active.remove(&operation.id);
        self.push_history(operation.clone());
        Ok(operation)
    }

    /// Cancel an in-flight operation
    ///
    /// Cancelling an operation that is unknown or already terminal is a
    /// no-op; cancellation never fails.
    pub fn cancel(&self, operation_id: Uuid) {
        if let Some(token) = self.active.get(&operation_id) {
            token.cancel();
        }
    }

    /// Re-execute a finished operation with the same provider, kind, and
    /// parameters
    ///
    /// The original record is untouched; the retry is a fresh operation
    /// with its own id. Retrying an operation that is not terminal is
    /// rejected.
    pub async fn retry(&self, operation_id: Uuid) -> Result<Operation> {
        let original = self
            .get(operation_id)
            .ok_or_else(|| {
                OrchestratorError::ValidationFailure(format!(
                    "operation {} not found in history",
                    operation_id
                ))
            })?;
        if !original.state.is_terminal() {
            return Err(OrchestratorError::ValidationFailure(format!(
                "operation {} is still {}",
                operation_id, original.state
            )));
        }

        info!(operation_id = %operation_id, "Retrying operation");
        self.execute(
            original.provider_id,
            &original.kind,
            original.params.clone(),
            None,
            None,
        )
        .await
    }

    /// Look up a finished operation record
    pub fn get(&self, operation_id: Uuid) -> Option<Operation> {
        self.history
            .read()
            .iter()
            .find(|op| op.id == operation_id)
            .cloned()
    }

    /// Most recent finished records, oldest first, at most `limit`
    pub fn recent(&self, limit: usize) -> Vec<Operation> {
        let history = self.history.read();
        let skip = history.len().saturating_sub(limit);
        history.iter().skip(skip).cloned().collect()
    }

    /// Number of operations currently in flight
    pub fn in_flight(&self) -> usize {
        self.active.len()
    }

    /// Ids of operations currently in flight
    pub fn active_operations(&self) -> Vec<Uuid> {
        self.active.iter().map(|entry| *entry.key()).collect()
    }

    fn push_history(&self, operation: Operation) {
        let mut history = self.history.write();
        if history.len() == self.max_history {
            history.pop_front();
        }
        history.push_back(operation);
    }
}
