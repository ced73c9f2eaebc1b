//! Provider Registry Module
//!
//! Registry of capability providers: configuration, connectivity state,
//! and live operation metrics. Health transitions happen only here and in
//! the operation engine; every connect/disconnect transition emits a
//! status-change event.

use crate::{
    events::EventLog,
    executor::ProviderExecutor,
    OrchestratorError, Result,
};
use conductor_shared::types::{
    OrchestratorEvent, Provider, ProviderConfig, ProviderHealth, ProviderMetrics, ProviderStatus,
};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;
use validator::Validate;

/// Provider registry
pub struct ProviderRegistry {
    /// Providers indexed by id
    providers: DashMap<Uuid, Provider>,

    /// Executor used for connection probes
    executor: Arc<dyn ProviderExecutor>,

    /// Lifecycle event sink
    events: Arc<EventLog>,

    /// Maximum number of registered providers
    max_providers: usize,

    /// Deadline for connection probes
    probe_timeout: Duration,
}

impl ProviderRegistry {
    /// Create a new registry
    pub fn new(
        executor: Arc<dyn ProviderExecutor>,
        events: Arc<EventLog>,
        max_providers: usize,
        probe_timeout: Duration,
    ) -> Self {
        Self {
            providers: DashMap::new(),
            executor,
            events,
            max_providers,
            probe_timeout,
        }
    }

    /// Register a new provider in `disconnected` state; when the config
    /// sets `auto_connect`, a connection attempt is made immediately
    pub async fn register(&self, config: ProviderConfig) -> Result<Uuid> {
        config.validate()?;

        if self.providers.len() >= self.max_providers {
            return Err(OrchestratorError::ValidationFailure(
                "maximum number of providers reached".to_string(),
            ));
        }

        if self
            .providers
            .iter()
            .any(|entry| entry.config.name == config.name)
        {
            return Err(OrchestratorError::ValidationFailure(format!(
                "provider with name '{}' already exists",
                config.name
            )));
        }

        let auto_connect = config.auto_connect;
        let provider = Provider::new(config);
        let provider_id = provider.id;

        info!(
            provider_id = %provider_id,
            provider_name = %provider.config.name,
            capability = %provider.config.capability,
            "Provider registered"
        );

        self.providers.insert(provider_id, provider);

        if auto_connect {
            if let Err(e) = self.connect(provider_id).await {
                warn!(
                    provider_id = %provider_id,
                    error = %e,
                    "Auto-connect failed"
                );
            }
        }

        Ok(provider_id)
    }

    /// Remove a provider; silent no-op when absent. Returns the removed
    /// record so callers can cascade (cache purge).
    pub async fn remove(&self, provider_id: Uuid) -> Option<Provider> {
        let removed = self.providers.remove(&provider_id).map(|(_, p)| p);
        if let Some(provider) = &removed {
            info!(
                provider_id = %provider_id,
                provider_name = %provider.config.name,
                "Provider removed"
            );
        }
        removed
    }

    /// Get a provider by id
    pub async fn get(&self, provider_id: Uuid) -> Option<Provider> {
        self.providers.get(&provider_id).map(|entry| entry.clone())
    }

    /// List all providers
    pub async fn list(&self) -> Vec<Provider> {
        self.providers.iter().map(|entry| entry.clone()).collect()
    }

    /// Number of registered providers
    pub async fn count(&self) -> usize {
        self.providers.len()
    }

    /// Number of providers currently connected
    pub async fn connected_count(&self) -> usize {
        self.providers
            .iter()
            .filter(|entry| entry.is_connected())
            .count()
    }

    /// Connect a provider
    ///
    /// Transitions `disconnected -> connecting`, probes the provider
    /// through the executor, then lands on `connected` or `error`. A call
    /// that observes an in-flight `connecting` state (or an established
    /// connection) returns without reissuing the attempt, so concurrent
    /// connects cannot race to contradictory terminal health.
    pub async fn connect(&self, provider_id: Uuid) -> Result<()> {
        {
            let mut entry = self
                .providers
                .get_mut(&provider_id)
                .ok_or(OrchestratorError::ProviderUnavailable(provider_id))?;

            match entry.health.status {
                ProviderStatus::Connected | ProviderStatus::Connecting => {
                    debug!(
                        provider_id = %provider_id,
                        status = %entry.health.status,
                        "Connect is a no-op in current state"
                    );
                    return Ok(());
                }
                from => {
                    entry.set_status(ProviderStatus::Connecting);
                    self.events.emit(OrchestratorEvent::ProviderStatusChanged {
                        provider_id,
                        from,
                        to: ProviderStatus::Connecting,
                    });
                }
            }
        }

        let started = Instant::now();
        let probe = tokio::time::timeout(
            self.probe_timeout,
            self.executor.probe(provider_id, self.probe_timeout),
        )
        .await;

        let outcome = match probe {
            Ok(Ok(())) => Ok(started.elapsed().as_millis() as u64),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(OrchestratorError::Timeout(
                self.probe_timeout.as_millis() as u64
            )),
        };

        let mut entry = self
            .providers
            .get_mut(&provider_id)
            .ok_or(OrchestratorError::ProviderUnavailable(provider_id))?;

        match outcome {
            Ok(response_time_ms) => {
                entry.record_probe(response_time_ms);
                entry.set_status(ProviderStatus::Connected);
                self.events.emit(OrchestratorEvent::ProviderStatusChanged {
                    provider_id,
                    from: ProviderStatus::Connecting,
                    to: ProviderStatus::Connected,
                });
                info!(
                    provider_id = %provider_id,
                    response_time_ms,
                    "Provider connected"
                );
                Ok(())
            }
            Err(e) => {
                entry.health.error_count += 1;
                entry.set_status(ProviderStatus::Error);
                self.events.emit(OrchestratorEvent::ProviderStatusChanged {
                    provider_id,
                    from: ProviderStatus::Connecting,
                    to: ProviderStatus::Error,
                });
                warn!(
                    provider_id = %provider_id,
                    error = %e,
                    "Provider connection failed"
                );
                Err(e)
            }
        }
    }

    /// Disconnect a provider unconditionally
    pub async fn disconnect(&self, provider_id: Uuid) -> Result<()> {
        let mut entry = self
            .providers
            .get_mut(&provider_id)
            .ok_or(OrchestratorError::ProviderUnavailable(provider_id))?;

        let from = entry.health.status;
        entry.set_status(ProviderStatus::Disconnected);
        self.events.emit(OrchestratorEvent::ProviderStatusChanged {
            provider_id,
            from,
            to: ProviderStatus::Disconnected,
        });

        info!(provider_id = %provider_id, "Provider disconnected");
        Ok(())
    }

    /// Apply a partial update to a provider's health block
    pub async fn update_health<F>(&self, provider_id: Uuid, apply: F) -> Result<()>
    where
        F: FnOnce(&mut ProviderHealth),
    {
        let mut entry = self
            .providers
            .get_mut(&provider_id)
            .ok_or(OrchestratorError::ProviderUnavailable(provider_id))?;
        apply(&mut entry.health);
        Ok(())
    }

    /// Apply a partial update to a provider's metrics block
    pub async fn update_metrics<F>(&self, provider_id: Uuid, apply: F) -> Result<()>
    where
        F: FnOnce(&mut ProviderMetrics),
    {
        let mut entry = self
            .providers
            .get_mut(&provider_id)
            .ok_or(OrchestratorError::ProviderUnavailable(provider_id))?;
        apply(&mut entry.metrics);
        Ok(())
    }

    /// Record a successful operation against a provider's metrics
    ///
    /// Takes the provider entry's exclusive guard, so racing steps cannot
    /// lose updates.
    pub async fn record_operation_success(
        &self,
        provider_id: Uuid,
        duration_ms: u64,
        tokens: Option<u64>,
        cost: Option<f64>,
    ) {
        if let Some(mut entry) = self.providers.get_mut(&provider_id) {
            entry.record_success(duration_ms, tokens, cost);
        }
    }

    /// Record a failed operation against a provider's metrics
    pub async fn record_operation_failure(&self, provider_id: Uuid) {
        if let Some(mut entry) = self.providers.get_mut(&provider_id) {
            entry.record_failure();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::ExecutorOutcome;
    use async_trait::async_trait;
    use serde_json::Value;

    struct StubExecutor {
        fail_probe: bool,
    }

    #[async_trait]
    impl ProviderExecutor for StubExecutor {
        async fn invoke(
            &self,
            _provider_id: Uuid,
            _kind: &str,
            _params: &Value,
            _deadline: Duration,
        ) -> Result<ExecutorOutcome> {
            Ok(ExecutorOutcome::of(Value::Null))
        }

        async fn probe(&self, _provider_id: Uuid, _deadline: Duration) -> Result<()> {
            if self.fail_probe {
                Err(OrchestratorError::ExecutorFailure("unreachable".into()))
            } else {
                Ok(())
            }
        }
    }

    fn registry(fail_probe: bool) -> ProviderRegistry {
        ProviderRegistry::new(
            Arc::new(StubExecutor { fail_probe }),
            Arc::new(EventLog::new(64)),
            100,
            Duration::from_millis(200),
        )
    }

    fn config(name: &str) -> ProviderConfig {
        ProviderConfig {
            name: name.to_string(),
            capability: "test".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn register_starts_disconnected() {
        let registry = registry(false);
        let id = registry.register(config("p1")).await.unwrap();
        let provider = registry.get(id).await.unwrap();
        assert_eq!(provider.health.status, ProviderStatus::Disconnected);
    }

    #[tokio::test]
    async fn duplicate_name_rejected() {
        let registry = registry(false);
        registry.register(config("dup")).await.unwrap();
        assert!(registry.register(config("dup")).await.is_err());
    }

    #[tokio::test]
    async fn connect_lands_on_connected_and_records_ping() {
        let registry = registry(false);
        let id = registry.register(config("p1")).await.unwrap();
        registry.connect(id).await.unwrap();

        let provider = registry.get(id).await.unwrap();
        assert_eq!(provider.health.status, ProviderStatus::Connected);
        assert!(provider.health.last_ping.is_some());
        assert_eq!(registry.connected_count().await, 1);
    }

    #[tokio::test]
    async fn failed_probe_lands_on_error() {
        let registry = registry(true);
        let id = registry.register(config("p1")).await.unwrap();
        assert!(registry.connect(id).await.is_err());

        let provider = registry.get(id).await.unwrap();
        assert_eq!(provider.health.status, ProviderStatus::Error);
        assert_eq!(provider.health.error_count, 1);
    }

    #[tokio::test]
    async fn connect_is_idempotent_once_connected() {
        let registry = registry(false);
        let id = registry.register(config("p1")).await.unwrap();
        registry.connect(id).await.unwrap();
        registry.connect(id).await.unwrap();

        let provider = registry.get(id).await.unwrap();
        assert_eq!(provider.health.status, ProviderStatus::Connected);
    }

    #[tokio::test]
    async fn remove_is_silent_when_absent() {
        let registry = registry(false);
        assert!(registry.remove(Uuid::new_v4()).await.is_none());
    }

    #[tokio::test]
    async fn auto_connect_connects_on_registration() {
        let registry = registry(false);
        let mut cfg = config("p1");
        cfg.auto_connect = true;
        let id = registry.register(cfg).await.unwrap();
        let provider = registry.get(id).await.unwrap();
        assert_eq!(provider.health.status, ProviderStatus::Connected);
    }
}
