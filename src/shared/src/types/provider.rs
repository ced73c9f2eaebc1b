//! Provider types
//!
//! A provider is a registered external capability endpoint the core can
//! dispatch operations to. Its configuration is caller-supplied and
//! immutable once created; the health and metrics blocks are mutated only
//! through the registry and the operation engine.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;
use validator::Validate;

/// Caller-supplied provider configuration, immutable after registration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ProviderConfig {
    /// Provider name
    #[validate(length(min = 1, max = 100))]
    pub name: String,

    /// Provider description
    #[validate(length(max = 500))]
    pub description: Option<String>,

    /// Declared capability type (e.g. "filesystem", "database", "search")
    #[validate(length(min = 1, max = 50))]
    pub capability: String,

    /// Whether the provider may be dispatched to
    pub enabled: bool,

    /// Connect immediately on registration
    pub auto_connect: bool,

    /// Per-operation deadline in milliseconds; the orchestrator's default
    /// applies when unset
    #[validate(range(min = 1, max = 300_000))]
    pub timeout_ms: Option<u64>,

    /// Retry-attempt budget, advisory for callers (the core never retries
    /// on its own)
    #[validate(range(max = 10))]
    pub retry_limit: u32,

    /// Provider-specific settings, opaque to the core
    pub settings: HashMap<String, serde_json::Value>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: None,
            capability: String::new(),
            enabled: true,
            auto_connect: false,
            timeout_ms: None,
            retry_limit: 3,
            settings: HashMap::new(),
        }
    }
}

/// Provider connectivity status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ProviderStatus {
    Disconnected,
    Connecting,
    Connected,
    Error,
}

impl std::fmt::Display for ProviderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderStatus::Disconnected => write!(f, "disconnected"),
            ProviderStatus::Connecting => write!(f, "connecting"),
            ProviderStatus::Connected => write!(f, "connected"),
            ProviderStatus::Error => write!(f, "error"),
        }
    }
}

/// Live health block for a provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderHealth {
    /// Connectivity status
    pub status: ProviderStatus,

    /// Last successful ping/probe timestamp
    pub last_ping: Option<DateTime<Utc>>,

    /// Rolling response time in milliseconds
    pub response_time_ms: Option<u64>,

    /// Errors observed (probe failures and operation failures)
    pub error_count: u64,

    /// Operation success rate percentage (0.0 - 100.0)
    pub success_rate: f64,
}

impl Default for ProviderHealth {
    fn default() -> Self {
        Self {
            status: ProviderStatus::Disconnected,
            last_ping: None,
            response_time_ms: None,
            error_count: 0,
            success_rate: 0.0,
        }
    }
}

/// Accumulated operation metrics for a provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderMetrics {
    /// Total operations dispatched
    pub total_operations: u64,

    /// Operations that completed successfully
    pub succeeded: u64,

    /// Operations that failed or timed out
    pub failed: u64,

    /// Incremental mean response time in milliseconds
    pub avg_response_time_ms: f64,

    /// Token accumulator, when the executor reports usage
    pub tokens_used: u64,

    /// Cost accumulator, when the executor reports usage
    pub cost: f64,

    /// Operations dispatched on `today`
    pub operations_today: u64,

    /// Day stamp for the daily counter
    pub today: NaiveDate,

    /// Operations dispatched in the current ISO week
    pub operations_this_week: u64,

    /// (year, ISO week) stamp for the weekly counter
    pub week: (i32, u32),
}

impl Default for ProviderMetrics {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            total_operations: 0,
            succeeded: 0,
            failed: 0,
            avg_response_time_ms: 0.0,
            tokens_used: 0,
            cost: 0.0,
            operations_today: 0,
            today: now.date_naive(),
            operations_this_week: 0,
            week: (now.iso_week().year(), now.iso_week().week()),
        }
    }
}

/// Provider record: immutable config plus mutable health/metrics blocks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provider {
    /// Unique provider identifier
    pub id: Uuid,

    /// Immutable configuration
    pub config: ProviderConfig,

    /// Live health block
    pub health: ProviderHealth,

    /// Accumulated metrics block
    pub metrics: ProviderMetrics,

    /// Registration timestamp
    pub created_at: DateTime<Utc>,

    /// Last mutation timestamp
    pub updated_at: DateTime<Utc>,
}

impl Provider {
    /// Create a new provider in `disconnected` state
    pub fn new(config: ProviderConfig) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            config,
            health: ProviderHealth::default(),
            metrics: ProviderMetrics::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the provider may be dispatched to
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Whether the provider is currently connected
    pub fn is_connected(&self) -> bool {
        self.health.status == ProviderStatus::Connected
    }

    /// Transition the health status
    pub fn set_status(&mut self, status: ProviderStatus) {
        self.health.status = status;
        self.updated_at = Utc::now();
    }

    /// Record a successful operation: counts, incremental mean, rolling
    /// response time, optional token/cost usage
    pub fn record_success(&mut self, duration_ms: u64, tokens: Option<u64>, cost: Option<f64>) {
        self.roll_counters();
        self.metrics.total_operations += 1;
        self.metrics.succeeded += 1;
        self.metrics.operations_today += 1;
        self.metrics.operations_this_week += 1;
        let n = self.metrics.total_operations as f64;
        self.metrics.avg_response_time_ms +=
            (duration_ms as f64 - self.metrics.avg_response_time_ms) / n;
        if let Some(tokens) = tokens {
            self.metrics.tokens_used += tokens;
        }
        if let Some(cost) = cost {
            self.metrics.cost += cost;
        }
        self.health.response_time_ms = Some(duration_ms);
        self.recompute_success_rate();
        self.updated_at = Utc::now();
    }

    /// Record a failed or timed-out operation
    pub fn record_failure(&mut self) {
        self.roll_counters();
        self.metrics.total_operations += 1;
        self.metrics.failed += 1;
        self.metrics.operations_today += 1;
        self.metrics.operations_this_week += 1;
        self.health.error_count += 1;
        self.recompute_success_rate();
        self.updated_at = Utc::now();
    }

    /// Record a successful connection probe
    pub fn record_probe(&mut self, response_time_ms: u64) {
        self.health.last_ping = Some(Utc::now());
        self.health.response_time_ms = Some(response_time_ms);
        self.updated_at = Utc::now();
    }

    fn recompute_success_rate(&mut self) {
        self.health.success_rate = if self.metrics.total_operations == 0 {
            0.0
        } else {
            self.metrics.succeeded as f64 / self.metrics.total_operations as f64 * 100.0
        };
    }

    // Daily/weekly counters reset lazily when the stamp rolls over.
    fn roll_counters(&mut self) {
        let now = Utc::now();
        let today = now.date_naive();
        if self.metrics.today != today {
            self.metrics.today = today;
            self.metrics.operations_today = 0;
        }
        let week = (now.iso_week().year(), now.iso_week().week());
        if self.metrics.week != week {
            self.metrics.week = week;
            self.metrics.operations_this_week = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn test_config(name: &str) -> ProviderConfig {
        ProviderConfig {
            name: name.to_string(),
            capability: "test".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn new_provider_starts_disconnected() {
        let provider = Provider::new(test_config("p1"));
        assert_eq!(provider.health.status, ProviderStatus::Disconnected);
        assert_eq!(provider.metrics.total_operations, 0);
        assert!(provider.is_enabled());
    }

    #[test]
    fn incremental_mean_matches_batch_mean() {
        let mut provider = Provider::new(test_config("p1"));
        for duration in [100u64, 200, 300] {
            provider.record_success(duration, None, None);
        }
        assert!((provider.metrics.avg_response_time_ms - 200.0).abs() < f64::EPSILON);
        assert_eq!(provider.health.success_rate, 100.0);
    }

    #[test]
    fn failure_updates_error_count_and_rate() {
        let mut provider = Provider::new(test_config("p1"));
        provider.record_success(50, None, None);
        provider.record_failure();
        assert_eq!(provider.health.error_count, 1);
        assert_eq!(provider.metrics.failed, 1);
        assert!((provider.health.success_rate - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn usage_accumulators() {
        let mut provider = Provider::new(test_config("p1"));
        provider.record_success(10, Some(120), Some(0.25));
        provider.record_success(10, Some(80), Some(0.75));
        assert_eq!(provider.metrics.tokens_used, 200);
        assert!((provider.metrics.cost - 1.0).abs() < f64::EPSILON);
    }
}
