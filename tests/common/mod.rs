//! Shared helpers for integration tests: in-memory database pool and a
//! service wired to a fixed test master key.

#![allow(dead_code)]

use sealbox::config::DatabaseConfig;
use sealbox::crypto::{EnvelopeCrypto, MasterKey};
use sealbox::services::SecretsManager;
use sealbox::storage::{create_pool, DbPool, SecretsRepository};
use std::sync::Arc;

pub async fn test_pool() -> DbPool {
    let config = DatabaseConfig {
        url: "sqlite://:memory:".to_string(),
        auto_migrate: true,
        ..Default::default()
    };
    create_pool(&config).await.unwrap()
}

/// Crypto engine over a fixed key byte, so two engines with different bytes
/// model "different master keys".
pub fn test_crypto(key_byte: u8) -> EnvelopeCrypto {
    EnvelopeCrypto::new(Arc::new(MasterKey::from_bytes([key_byte; 32], 1)))
}

pub async fn test_service() -> SecretsManager {
    let pool = test_pool().await;
    SecretsManager::new(test_crypto(0x42), SecretsRepository::new(pool))
}

/// A service sharing the given pool (for wrong-master-key scenarios).
pub fn service_over(pool: DbPool, key_byte: u8) -> SecretsManager {
    SecretsManager::new(test_crypto(key_byte), SecretsRepository::new(pool))
}
