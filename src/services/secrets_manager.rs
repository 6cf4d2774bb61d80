//! Secrets manager orchestration.
//!
//! Validates requests, encrypts on write, decrypts on read, and delegates
//! persistence to the repository. Create responses carry metadata only;
//! plaintext is returned exclusively by the Get operations.

use crate::crypto::{self, EnvelopeCrypto};
use crate::errors::{Error, Result};
use crate::storage::{NewRecord, RecordKind, SecretsRepository, StoredRecord};
use tracing::instrument;
use zeroize::Zeroizing;

/// Longest accepted `key_name`
const MAX_KEY_NAME_LEN: usize = 255;

/// Metadata returned by create operations. Deliberately contains no payload.
#[derive(Debug, Clone)]
pub struct CreatedRecord {
    pub key_name: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Metadata plus the public half returned when a key pair is created.
#[derive(Debug, Clone)]
pub struct CreatedKeyPair {
    pub key_name: String,
    pub public_key_pem: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// A decrypted opaque secret.
pub struct SecretPayload {
    pub key_name: String,
    pub value: Zeroizing<Vec<u8>>,
}

/// Decrypted symmetric key material.
pub struct SymmetricKeyMaterial {
    pub key_name: String,
    pub key_material: Zeroizing<Vec<u8>>,
}

/// Which halves of an asymmetric pair a retrieval should expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnKeyType {
    Public,
    Pair,
}

/// Result of a key pair retrieval. The `PublicOnly` variant cannot carry
/// private material, which makes "public never decrypts" checkable in the
/// type system rather than by convention.
pub enum KeyPairMaterial {
    PublicOnly {
        public_key_pem: String,
    },
    Pair {
        public_key_pem: String,
        private_key_pem: Zeroizing<String>,
    },
}

/// A retrieved key pair.
pub struct KeyPairView {
    pub key_name: String,
    pub material: KeyPairMaterial,
}

/// The secrets manager service: crypto engine + repository.
#[derive(Debug, Clone)]
pub struct SecretsManager {
    crypto: EnvelopeCrypto,
    repository: SecretsRepository,
}

impl SecretsManager {
    pub fn new(crypto: EnvelopeCrypto, repository: SecretsRepository) -> Self {
        Self { crypto, repository }
    }

    /// Encrypt and store an opaque secret under a unique name.
    #[instrument(skip(self, plaintext), fields(plaintext_len = plaintext.len()))]
    pub async fn create_secret(&self, key_name: &str, plaintext: &[u8]) -> Result<CreatedRecord> {
        let key_name = validate_key_name(key_name)?;

        let ciphertext = self.crypto.seal(plaintext)?;
        let stored = self
            .repository
            .create(
                NewRecord::Secret {
                    key_name: key_name.to_string(),
                    ciphertext,
                },
                self.crypto.master_key_version(),
            )
            .await?;

        match stored {
            StoredRecord::Secret(row) => Ok(CreatedRecord {
                key_name: row.key_name,
                created_at: row.created_at,
            }),
            _ => Err(Error::internal("Repository returned wrong record kind")),
        }
    }

    /// Fetch and decrypt an opaque secret.
    #[instrument(skip(self))]
    pub async fn get_secret_by_name(&self, key_name: &str) -> Result<SecretPayload> {
        let key_name = validate_key_name(key_name)?;

        match self
            .repository
            .get_by_name(RecordKind::Secret, key_name)
            .await?
        {
            StoredRecord::Secret(row) => Ok(SecretPayload {
                key_name: row.key_name,
                value: self.crypto.open(&row.ciphertext)?,
            }),
            _ => Err(Error::internal("Repository returned wrong record kind")),
        }
    }

    /// Generate, encrypt, and store a fresh AES-256 key. The caller never
    /// supplies key bytes.
    #[instrument(skip(self))]
    pub async fn create_symmetric_key(&self, key_name: &str) -> Result<CreatedRecord> {
        let key_name = validate_key_name(key_name)?;

        let key_material = crypto::generate_symmetric_key(self.crypto.rng())?;
        let ciphertext = self.crypto.seal(&key_material)?;

        let stored = self
            .repository
            .create(
                NewRecord::SymmetricKey {
                    key_name: key_name.to_string(),
                    ciphertext,
                },
                self.crypto.master_key_version(),
            )
            .await?;

        match stored {
            StoredRecord::SymmetricKey(row) => Ok(CreatedRecord {
                key_name: row.key_name,
                created_at: row.created_at,
            }),
            _ => Err(Error::internal("Repository returned wrong record kind")),
        }
    }

    /// Fetch and decrypt symmetric key material.
    #[instrument(skip(self))]
    pub async fn get_symmetric_key_by_name(&self, key_name: &str) -> Result<SymmetricKeyMaterial> {
        let key_name = validate_key_name(key_name)?;

        match self
            .repository
            .get_by_name(RecordKind::SymmetricKey, key_name)
            .await?
        {
            StoredRecord::SymmetricKey(row) => Ok(SymmetricKeyMaterial {
                key_name: row.key_name,
                key_material: self.crypto.open(&row.ciphertext)?,
            }),
            _ => Err(Error::internal("Repository returned wrong record kind")),
        }
    }

    /// Generate a fresh RSA pair, encrypt the private half, and persist both
    /// halves atomically under one name.
    #[instrument(skip(self))]
    pub async fn create_asymmetric_key_pair(&self, key_name: &str) -> Result<CreatedKeyPair> {
        let key_name = validate_key_name(key_name)?;

        let pair = crypto::generate_rsa_key_pair()?;
        let private_key_ciphertext = self.crypto.seal(pair.private_key_pem.as_bytes())?;

        let stored = self
            .repository
            .create(
                NewRecord::AsymmetricKeyPair {
                    key_name: key_name.to_string(),
                    public_key_pem: pair.public_key_pem,
                    private_key_ciphertext,
                },
                self.crypto.master_key_version(),
            )
            .await?;

        match stored {
            StoredRecord::AsymmetricKeyPair(row) => Ok(CreatedKeyPair {
                key_name: row.key_name,
                public_key_pem: row.public_key,
                created_at: row.created_at,
            }),
            _ => Err(Error::internal("Repository returned wrong record kind")),
        }
    }

    /// Fetch a key pair. `ReturnKeyType::Public` is the cheap path: the
    /// private half is never decrypted.
    #[instrument(skip(self))]
    pub async fn get_asymmetric_key_pair_by_name(
        &self,
        key_name: &str,
        return_key_type: ReturnKeyType,
    ) -> Result<KeyPairView> {
        let key_name = validate_key_name(key_name)?;

        let row = match self
            .repository
            .get_by_name(RecordKind::AsymmetricKeyPair, key_name)
            .await?
        {
            StoredRecord::AsymmetricKeyPair(row) => row,
            _ => return Err(Error::internal("Repository returned wrong record kind")),
        };

        let material = match return_key_type {
            ReturnKeyType::Public => KeyPairMaterial::PublicOnly {
                public_key_pem: row.public_key,
            },
            ReturnKeyType::Pair => {
                let private_key = self.crypto.open(&row.private_key_ciphertext)?;
                let private_key_pem = std::str::from_utf8(&private_key).map_err(|_| {
                    tracing::error!(key_name = %row.key_name, "Stored private key is not valid UTF-8 PEM");
                    Error::internal("Stored private key is not valid PEM")
                })?;
                KeyPairMaterial::Pair {
                    public_key_pem: row.public_key,
                    private_key_pem: Zeroizing::new(private_key_pem.to_string()),
                }
            }
        };

        Ok(KeyPairView {
            key_name: row.key_name,
            material,
        })
    }
}

/// Reject empty or oversized names before anything touches crypto or storage.
fn validate_key_name(key_name: &str) -> Result<&str> {
    let trimmed = key_name.trim();
    if trimmed.is_empty() {
        return Err(Error::validation_field("key_name cannot be empty", "key_name"));
    }
    if trimmed.chars().count() > MAX_KEY_NAME_LEN {
        return Err(Error::validation_field(
            format!("key_name cannot exceed {} characters", MAX_KEY_NAME_LEN),
            "key_name",
        ));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_name_is_trimmed() {
        assert_eq!(validate_key_name("  db-password  ").unwrap(), "db-password");
    }

    #[test]
    fn empty_key_name_is_rejected() {
        assert!(matches!(
            validate_key_name("   "),
            Err(Error::Validation { .. })
        ));
    }

    #[test]
    fn oversized_key_name_is_rejected() {
        let name = "x".repeat(MAX_KEY_NAME_LEN + 1);
        assert!(matches!(
            validate_key_name(&name),
            Err(Error::Validation { .. })
        ));
    }

    #[test]
    fn key_name_limit_counts_characters_not_bytes() {
        // Two bytes per character; at the limit in characters, over it in bytes.
        let name = "ü".repeat(MAX_KEY_NAME_LEN);
        assert!(validate_key_name(&name).is_ok());

        let name = "ü".repeat(MAX_KEY_NAME_LEN + 1);
        assert!(matches!(
            validate_key_name(&name),
            Err(Error::Validation { .. })
        ));
    }
}
