//! # sealbox
//!
//! sealbox is a secrets and key management service. It stores opaque
//! secrets, AES-256 symmetric keys, and RSA key pairs in a relational
//! store, with all sensitive material encrypted at rest under a single
//! process-wide master key, and exposes creation/retrieval through a gRPC
//! interface.
//!
//! ## Architecture
//!
//! ```text
//! gRPC Layer → SecretsManager → EnvelopeCrypto (AES-256-GCM)
//!                    ↓
//!            SecretsRepository → SQLite (sqlx)
//! ```
//!
//! ## Core Components
//!
//! - **Master key loading**: a 256-bit root key read once from a JSON key
//!   file at startup; losing it makes all stored ciphertext unrecoverable.
//! - **Envelope encryption**: each stored item carries its own
//!   `nonce || ciphertext || tag` envelope.
//! - **Record repository**: write-once records, uniqueness by name enforced
//!   by the database.
//! - **gRPC service**: tonic server with the standard health service and
//!   reflection.

pub mod config;
pub mod crypto;
pub mod errors;
pub mod grpc;
pub mod observability;
pub mod services;
pub mod storage;

// Re-export commonly used types
pub use config::Config;
pub use errors::{Error, Result};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
