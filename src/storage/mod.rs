//! # Storage Layer
//!
//! Connection pooling, schema migrations, and the record repository. The
//! storage layer stores ciphertext verbatim and has no cryptographic
//! knowledge; it can be tested purely against byte-equality of stored vs.
//! retrieved ciphertext.

pub mod migrations;
pub mod pool;
pub mod repository;

pub use pool::{create_pool, DbPool};
pub use repository::{
    KeyPairRecord, NewRecord, OpaqueRecord, RecordKind, SecretsRepository, StoredRecord,
};
