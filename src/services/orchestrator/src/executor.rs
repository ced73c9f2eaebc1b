//! Provider Executor Module
//!
//! The abstract capability the orchestration core dispatches through. The
//! embedding application supplies one implementation per deployment; the
//! core never assumes a specific transport. Implementations should honour
//! the deadline where they can — the operation engine enforces it
//! regardless.

use crate::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use uuid::Uuid;

/// Successful executor invocation
#[derive(Debug, Clone)]
pub struct ExecutorOutcome {
    /// Result payload
    pub result: Value,

    /// Tokens consumed, when the provider reports usage
    pub tokens_used: Option<u64>,

    /// Cost incurred, when the provider reports usage
    pub cost: Option<f64>,
}

impl ExecutorOutcome {
    /// Outcome carrying only a result payload
    pub fn of(result: Value) -> Self {
        Self {
            result,
            tokens_used: None,
            cost: None,
        }
    }

    /// Attach usage accounting
    pub fn with_usage(mut self, tokens_used: u64, cost: f64) -> Self {
        self.tokens_used = Some(tokens_used);
        self.cost = Some(cost);
        self
    }
}

/// Transport-agnostic provider call surface
#[async_trait]
pub trait ProviderExecutor: Send + Sync {
    /// Execute one operation against a provider
    async fn invoke(
        &self,
        provider_id: Uuid,
        kind: &str,
        params: &Value,
        deadline: Duration,
    ) -> Result<ExecutorOutcome>;

    /// Probe provider reachability, used by connection attempts
    async fn probe(&self, provider_id: Uuid, deadline: Duration) -> Result<()>;
}
