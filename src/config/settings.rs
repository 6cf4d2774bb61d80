//! # Configuration Settings
//!
//! Defines the configuration structure for the sealbox secrets manager.

use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default)]
pub struct Config {
    /// gRPC server configuration
    #[validate(nested)]
    pub grpc: GrpcConfig,

    /// Database configuration
    #[validate(nested)]
    pub database: DatabaseConfig,

    /// Security configuration
    #[validate(nested)]
    pub security: SecurityConfig,

    /// Observability configuration
    #[validate(nested)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let config = Self {
            grpc: GrpcConfig::from_env()?,
            database: DatabaseConfig::from_env(),
            security: SecurityConfig::from_env(),
            observability: ObservabilityConfig::from_env(),
        };

        config.validate_all()?;
        Ok(config)
    }

    /// Validate the entire configuration
    pub fn validate_all(&self) -> Result<()> {
        Validate::validate(self).map_err(Error::from)?;
        self.validate_custom()?;
        Ok(())
    }

    /// Custom validation logic that goes beyond what the validator crate can do
    fn validate_custom(&self) -> Result<()> {
        if !self.database.url.starts_with("sqlite://") {
            return Err(Error::validation(
                "Database URL must start with 'sqlite://'",
            ));
        }

        if self.security.master_key_path.trim().is_empty() {
            return Err(Error::validation("Master key path cannot be empty"));
        }

        Ok(())
    }
}

/// gRPC server configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct GrpcConfig {
    /// Server bind address
    #[validate(length(min = 1, message = "Bind address cannot be empty"))]
    pub bind_address: String,

    /// Server port
    #[validate(range(min = 1, message = "Port must be between 1 and 65535"))]
    pub port: u16,
}

impl Default for GrpcConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 50051,
        }
    }
}

impl GrpcConfig {
    /// Create GrpcConfig from environment variables
    pub fn from_env() -> Result<Self> {
        let bind_address = std::env::var("SEALBOX_GRPC_BIND_ADDRESS")
            .unwrap_or_else(|_| "0.0.0.0".to_string());

        let port = std::env::var("SEALBOX_GRPC_PORT")
            .unwrap_or_else(|_| "50051".to_string())
            .parse()
            .map_err(|e| Error::config(format!("Invalid gRPC port: {}", e)))?;

        Ok(Self { bind_address, port })
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DatabaseConfig {
    /// Database connection URL
    #[validate(length(min = 1, message = "Database URL cannot be empty"))]
    pub url: String,

    /// Maximum number of connections in the pool
    #[validate(range(
        min = 1,
        max = 100,
        message = "Max connections must be between 1 and 100"
    ))]
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    #[validate(range(
        max = 50,
        message = "Min connections must be between 0 and 50"
    ))]
    pub min_connections: u32,

    /// Connection timeout in seconds
    #[validate(range(
        min = 1,
        max = 60,
        message = "Connect timeout must be between 1 and 60 seconds"
    ))]
    pub connect_timeout_seconds: u64,

    /// Idle timeout in seconds (0 = no timeout)
    pub idle_timeout_seconds: u64,

    /// Enable automatic migrations
    pub auto_migrate: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://./data/sealbox.db".to_string(),
            max_connections: 10,
            min_connections: 0,
            connect_timeout_seconds: 10,
            idle_timeout_seconds: 600,
            auto_migrate: true,
        }
    }
}

impl DatabaseConfig {
    /// Get connection timeout as Duration
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }

    /// Get idle timeout as Duration (None if 0)
    pub fn idle_timeout(&self) -> Option<Duration> {
        if self.idle_timeout_seconds == 0 {
            None
        } else {
            Some(Duration::from_secs(self.idle_timeout_seconds))
        }
    }

    /// Create DatabaseConfig from environment variables
    pub fn from_env() -> Self {
        let url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://./data/sealbox.db".to_string());

        let max_connections = std::env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(10);

        let min_connections = std::env::var("DATABASE_MIN_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(0);

        let connect_timeout_seconds = std::env::var("DATABASE_CONNECT_TIMEOUT_SECONDS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(10);

        let idle_timeout_seconds = std::env::var("DATABASE_IDLE_TIMEOUT_SECONDS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(600);

        let auto_migrate = std::env::var("DATABASE_AUTO_MIGRATE")
            .map(|s| s.to_lowercase() == "true" || s == "1")
            .unwrap_or(true);

        Self {
            url,
            max_connections,
            min_connections,
            connect_timeout_seconds,
            idle_timeout_seconds,
            auto_migrate,
        }
    }
}

/// Security configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SecurityConfig {
    /// Filesystem path to the master key file. The file is read once at
    /// startup; a missing or malformed key file is fatal.
    #[validate(length(min = 1, message = "Master key path cannot be empty"))]
    pub master_key_path: String,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            master_key_path: "master.key".to_string(),
        }
    }
}

impl SecurityConfig {
    /// Create SecurityConfig from environment variables
    pub fn from_env() -> Self {
        let master_key_path =
            std::env::var("SEALBOX_MASTER_KEY_PATH").unwrap_or_else(|_| "master.key".to_string());

        Self { master_key_path }
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ObservabilityConfig {
    /// Service name reported in logs
    #[validate(length(min = 1, message = "Service name cannot be empty"))]
    pub service_name: String,

    /// Log level filter (tracing EnvFilter syntax)
    pub log_level: String,

    /// Emit logs as JSON
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            service_name: "sealbox".to_string(),
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

impl ObservabilityConfig {
    /// Create ObservabilityConfig from environment variables
    pub fn from_env() -> Self {
        let service_name =
            std::env::var("SEALBOX_SERVICE_NAME").unwrap_or_else(|_| "sealbox".to_string());

        let log_level = std::env::var("SEALBOX_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let json_logs = std::env::var("SEALBOX_LOG_JSON")
            .map(|s| s.to_lowercase() == "true" || s == "1")
            .unwrap_or(false);

        Self {
            service_name,
            log_level,
            json_logs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate_all().is_ok());
    }

    #[test]
    fn rejects_non_sqlite_database_url() {
        let config = Config {
            database: DatabaseConfig {
                url: "mysql://localhost/sealbox".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate_all().is_err());
    }

    #[test]
    fn rejects_blank_master_key_path() {
        let config = Config {
            security: SecurityConfig {
                master_key_path: "   ".to_string(),
            },
            ..Default::default()
        };
        assert!(config.validate_all().is_err());
    }

    #[test]
    fn idle_timeout_zero_means_none() {
        let config = DatabaseConfig {
            idle_timeout_seconds: 0,
            ..Default::default()
        };
        assert!(config.idle_timeout().is_none());
    }
}
