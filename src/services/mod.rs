//! # Domain Services
//!
//! Orchestration between the crypto engine and the record repository.

mod secrets_manager;

pub use secrets_manager::{
    CreatedKeyPair, CreatedRecord, KeyPairMaterial, KeyPairView, ReturnKeyType, SecretPayload,
    SecretsManager, SymmetricKeyMaterial,
};
