//! Configuration module for the Conductor orchestrator
//!
//! Configuration loads from an optional `conductor.toml` file layered with
//! `CONDUCTOR_`-prefixed environment variables, and is validated before
//! use.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Main configuration structure for the orchestrator
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Environment (development, staging, production)
    pub environment: String,

    /// Maximum number of registered providers
    #[validate(range(min = 1, max = 1000))]
    pub max_providers: usize,

    /// Event log capacity (ring-buffer bound)
    #[validate(range(min = 16, max = 65536))]
    pub max_events: usize,

    /// Operation history capacity (ring-buffer bound)
    #[validate(range(min = 16, max = 65536))]
    pub max_operation_history: usize,

    /// Default per-operation deadline in milliseconds, used when a
    /// provider config does not set one
    #[validate(range(min = 1, max = 300_000))]
    pub default_timeout_ms: u64,

    /// Default TTL for cached results in milliseconds
    #[validate(range(min = 100, max = 86_400_000))]
    pub default_cache_ttl_ms: u64,

    /// Deadline for connection probes in milliseconds
    #[validate(range(min = 1, max = 60_000))]
    pub connect_probe_timeout_ms: u64,

    /// Logging configuration
    #[validate]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default log filter when RUST_LOG is unset
    #[validate(length(min = 1))]
    pub level: String,

    /// Output format: "pretty" or "json"
    #[validate(custom = "validate_log_format")]
    pub format: String,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            max_providers: 100,
            max_events: 256,
            max_operation_history: 512,
            default_timeout_ms: 30_000,
            default_cache_ttl_ms: 300_000,
            connect_probe_timeout_ms: 5_000,
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

fn validate_log_format(format: &str) -> std::result::Result<(), validator::ValidationError> {
    match format {
        "pretty" | "json" => Ok(()),
        _ => Err(validator::ValidationError::new("invalid_log_format")),
    }
}

impl OrchestratorConfig {
    /// Load configuration from `conductor.toml` (optional) layered with
    /// `CONDUCTOR_`-prefixed environment variables
    pub fn load() -> Result<Self> {
        let config: Self = config::Config::builder()
            .add_source(config::File::with_name("conductor").required(false))
            .add_source(
                config::Environment::with_prefix("CONDUCTOR")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("failed to build configuration")?
            .try_deserialize()
            .context("failed to deserialize configuration")?;

        config
            .validate()
            .context("configuration failed validation")?;

        Ok(config)
    }
}
