//! # Record Repository
//!
//! One sum-typed repository over the three stored record kinds (opaque
//! secrets, symmetric keys, asymmetric key pairs), so the uniqueness and
//! atomicity invariants live in one place. Records are write-once: there is
//! no update or delete, and a duplicate `key_name` within a kind fails
//! without mutating existing state.

use crate::errors::{Error, Result};
use crate::storage::DbPool;
use sqlx::FromRow;
use uuid::Uuid;

/// The three kinds of stored records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Secret,
    SymmetricKey,
    AsymmetricKeyPair,
}

impl RecordKind {
    /// Table backing this kind.
    fn table(&self) -> &'static str {
        match self {
            RecordKind::Secret => "secrets",
            RecordKind::SymmetricKey => "symmetric_keys",
            RecordKind::AsymmetricKeyPair => "asymmetric_key_pairs",
        }
    }

    /// Human-readable resource type used in error messages.
    pub fn resource_type(&self) -> &'static str {
        match self {
            RecordKind::Secret => "secret",
            RecordKind::SymmetricKey => "symmetric_key",
            RecordKind::AsymmetricKeyPair => "asymmetric_key_pair",
        }
    }
}

/// A record to insert. Both halves of an asymmetric pair travel together;
/// the repository can never persist half a pair.
#[derive(Debug)]
pub enum NewRecord {
    Secret {
        key_name: String,
        ciphertext: Vec<u8>,
    },
    SymmetricKey {
        key_name: String,
        ciphertext: Vec<u8>,
    },
    AsymmetricKeyPair {
        key_name: String,
        public_key_pem: String,
        private_key_ciphertext: Vec<u8>,
    },
}

impl NewRecord {
    fn kind(&self) -> RecordKind {
        match self {
            NewRecord::Secret { .. } => RecordKind::Secret,
            NewRecord::SymmetricKey { .. } => RecordKind::SymmetricKey,
            NewRecord::AsymmetricKeyPair { .. } => RecordKind::AsymmetricKeyPair,
        }
    }
}

/// Stored row for secrets and symmetric keys (identical shape).
#[derive(Debug, Clone, FromRow)]
pub struct OpaqueRecord {
    pub id: String,
    pub key_name: String,
    pub ciphertext: Vec<u8>,
    pub master_key_version: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Stored row for asymmetric key pairs. The public key is plaintext
/// reference data; only the private half is ciphertext.
#[derive(Debug, Clone, FromRow)]
pub struct KeyPairRecord {
    pub id: String,
    pub key_name: String,
    pub public_key: String,
    pub private_key_ciphertext: Vec<u8>,
    pub master_key_version: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// A fetched record, discriminated by kind.
#[derive(Debug, Clone)]
pub enum StoredRecord {
    Secret(OpaqueRecord),
    SymmetricKey(OpaqueRecord),
    AsymmetricKeyPair(KeyPairRecord),
}

/// Repository over the encrypted record tables.
#[derive(Debug, Clone)]
pub struct SecretsRepository {
    pool: DbPool,
}

impl SecretsRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Insert a new record. The database's unique index on `key_name` is the
    /// arbiter for concurrent creates: exactly one creator succeeds, the rest
    /// observe [`Error::Conflict`].
    pub async fn create(&self, record: NewRecord, master_key_version: i64) -> Result<StoredRecord> {
        let kind = record.kind();
        let id = Uuid::new_v4().to_string();
        let created_at = chrono::Utc::now();

        match record {
            NewRecord::Secret {
                key_name,
                ciphertext,
            }
            | NewRecord::SymmetricKey {
                key_name,
                ciphertext,
            } => {
                let query = format!(
                    "INSERT INTO {} (id, key_name, ciphertext, master_key_version, created_at) VALUES ($1, $2, $3, $4, $5)",
                    kind.table()
                );
                sqlx::query(&query)
                    .bind(&id)
                    .bind(&key_name)
                    .bind(&ciphertext)
                    .bind(master_key_version)
                    .bind(created_at)
                    .execute(&self.pool)
                    .await
                    .map_err(|e| Self::map_insert_error(e, kind, &key_name))?;

                tracing::info!(
                    kind = kind.resource_type(),
                    key_name = %key_name,
                    id = %id,
                    "Created record"
                );

                let row = OpaqueRecord {
                    id,
                    key_name,
                    ciphertext,
                    master_key_version,
                    created_at,
                };
                Ok(match kind {
                    RecordKind::Secret => StoredRecord::Secret(row),
                    _ => StoredRecord::SymmetricKey(row),
                })
            }
            NewRecord::AsymmetricKeyPair {
                key_name,
                public_key_pem,
                private_key_ciphertext,
            } => {
                // Both halves land in a single row, so the insert is atomic.
                sqlx::query(
                    "INSERT INTO asymmetric_key_pairs (id, key_name, public_key, private_key_ciphertext, master_key_version, created_at) VALUES ($1, $2, $3, $4, $5, $6)"
                )
                .bind(&id)
                .bind(&key_name)
                .bind(&public_key_pem)
                .bind(&private_key_ciphertext)
                .bind(master_key_version)
                .bind(created_at)
                .execute(&self.pool)
                .await
                .map_err(|e| Self::map_insert_error(e, kind, &key_name))?;

                tracing::info!(
                    kind = kind.resource_type(),
                    key_name = %key_name,
                    id = %id,
                    "Created record"
                );

                Ok(StoredRecord::AsymmetricKeyPair(KeyPairRecord {
                    id,
                    key_name,
                    public_key: public_key_pem,
                    private_key_ciphertext,
                    master_key_version,
                    created_at,
                }))
            }
        }
    }

    /// Fetch a record by name within a kind. Fails [`Error::NotFound`] when
    /// absent; never returns a partially-populated record.
    pub async fn get_by_name(&self, kind: RecordKind, key_name: &str) -> Result<StoredRecord> {
        match kind {
            RecordKind::Secret | RecordKind::SymmetricKey => {
                let query = format!(
                    "SELECT id, key_name, ciphertext, master_key_version, created_at FROM {} WHERE key_name = $1",
                    kind.table()
                );
                let row: Option<OpaqueRecord> = sqlx::query_as(&query)
                    .bind(key_name)
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(|e| {
                        tracing::error!(error = %e, kind = kind.resource_type(), key_name = %key_name, "Failed to fetch record");
                        Error::database(e, format!("Failed to fetch {}", kind.resource_type()))
                    })?;

                let row = row.ok_or_else(|| Error::not_found(kind.resource_type(), key_name))?;
                Ok(match kind {
                    RecordKind::Secret => StoredRecord::Secret(row),
                    _ => StoredRecord::SymmetricKey(row),
                })
            }
            RecordKind::AsymmetricKeyPair => {
                let row: Option<KeyPairRecord> = sqlx::query_as(
                    "SELECT id, key_name, public_key, private_key_ciphertext, master_key_version, created_at FROM asymmetric_key_pairs WHERE key_name = $1"
                )
                .bind(key_name)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    tracing::error!(error = %e, kind = kind.resource_type(), key_name = %key_name, "Failed to fetch record");
                    Error::database(e, format!("Failed to fetch {}", kind.resource_type()))
                })?;

                let row = row.ok_or_else(|| Error::not_found(kind.resource_type(), key_name))?;
                Ok(StoredRecord::AsymmetricKeyPair(row))
            }
        }
    }

    fn map_insert_error(e: sqlx::Error, kind: RecordKind, key_name: &str) -> Error {
        if let Some(db_err) = e.as_database_error() {
            if db_err.is_unique_violation() {
                tracing::warn!(
                    kind = kind.resource_type(),
                    key_name = %key_name,
                    "Duplicate key_name on create"
                );
                return Error::conflict(kind.resource_type(), key_name);
            }
        }
        tracing::error!(error = %e, kind = kind.resource_type(), key_name = %key_name, "Failed to insert record");
        Error::database(e, format!("Failed to create {}", kind.resource_type()))
    }
}
