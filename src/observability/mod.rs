//! # Observability
//!
//! Structured logging for the sealbox secrets manager using the tracing
//! ecosystem. Payload bytes and key material are never recorded as fields;
//! log sites carry key names and lengths only.

use crate::config::ObservabilityConfig;
use crate::errors::Result;
use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber.
///
/// Uses `try_init` so repeated initialization (tests, embedding) is not
/// fatal.
pub fn init_tracing(config: &ObservabilityConfig) -> Result<()> {
    let filter = EnvFilter::try_new(&config.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let result = if config.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .try_init()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init()
    };

    if result.is_err() {
        tracing::debug!("Tracing subscriber already initialized");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        let config = ObservabilityConfig::default();
        assert!(init_tracing(&config).is_ok());
        assert!(init_tracing(&config).is_ok());
    }

    #[test]
    fn bad_filter_falls_back_to_info() {
        let config = ObservabilityConfig {
            log_level: "!!not a filter!!".to_string(),
            ..Default::default()
        };
        assert!(init_tracing(&config).is_ok());
    }
}
