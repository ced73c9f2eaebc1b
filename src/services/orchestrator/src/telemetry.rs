//! Telemetry Module
//!
//! Structured logging initialisation for embedding applications. `RUST_LOG`
//! takes precedence over the configured default filter.

use crate::config::LoggingConfig;
use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// Initialise the global tracing subscriber
///
/// Safe to call once per process; subsequent calls return an error from the
/// underlying subscriber registry.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    match config.format.as_str() {
        "json" => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .try_init()
            .map_err(|e| anyhow::anyhow!("failed to initialise telemetry: {}", e))?,
        _ => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init()
            .map_err(|e| anyhow::anyhow!("failed to initialise telemetry: {}", e))?,
    }

    tracing::info!(
        level = %config.level,
        format = %config.format,
        "Telemetry initialised"
    );

    Ok(())
}
