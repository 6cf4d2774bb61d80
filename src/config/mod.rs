//! # Configuration Management
//!
//! Configuration for the sealbox secrets manager. All settings are read from
//! environment variables (with `.env` support in `main`); see [`Config::from_env`].

mod settings;

pub use settings::{
    Config, DatabaseConfig, GrpcConfig, ObservabilityConfig, SecurityConfig,
};
