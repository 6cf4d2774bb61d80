//! Master key loading and validation.
//!
//! The master key is a 256-bit root key stored in a JSON file
//! (`{"version": 1, "key": "<64 hex chars>"}`), loaded exactly once at
//! process startup. Losing this key makes every stored ciphertext permanently
//! unrecoverable, so the loader never regenerates or mutates the file.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// On-disk structure of the master key file.
#[derive(Deserialize)]
struct MasterKeyFile {
    #[serde(default = "default_version")]
    version: i64,
    key: String,
}

fn default_version() -> i64 {
    1
}

/// The process-wide master key. Immutable after load; key bytes are zeroed
/// when the handle is dropped.
///
/// Error messages and `Debug` output never contain key material.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct MasterKey {
    key: [u8; 32],
    #[zeroize(skip)]
    version: i64,
    #[zeroize(skip)]
    source_path: PathBuf,
}

impl MasterKey {
    /// Load and validate the master key from a JSON key file.
    ///
    /// Fails with [`Error::MasterKey`] when the file is missing, unparseable,
    /// or does not decode to exactly 32 bytes. Callers treat this as fatal;
    /// there is no degraded mode.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::master_key(format!(
                "Failed to read master key file {}: {}",
                path.display(),
                e
            ))
        })?;

        let parsed: MasterKeyFile = serde_json::from_str(&content).map_err(|_| {
            // The parse error could quote file content, so it is not included.
            Error::master_key(format!(
                "Master key file {} is not valid JSON with a 'key' field",
                path.display()
            ))
        })?;

        let mut decoded = hex::decode(&parsed.key).map_err(|_| {
            Error::master_key(format!(
                "Master key file {} does not contain valid hex under 'key'",
                path.display()
            ))
        })?;

        if decoded.len() != 32 {
            decoded.zeroize();
            return Err(Error::master_key(format!(
                "Master key must be 32 bytes (256 bits), got {} bytes",
                parsed.key.len() / 2
            )));
        }

        let mut key = [0u8; 32];
        key.copy_from_slice(&decoded);
        decoded.zeroize();

        tracing::info!(
            path = %path.display(),
            version = parsed.version,
            "Master key loaded"
        );

        Ok(Self {
            key,
            version: parsed.version,
            source_path: path.to_path_buf(),
        })
    }

    /// Build a master key from raw bytes (tests and tooling).
    pub fn from_bytes(key: [u8; 32], version: i64) -> Self {
        Self {
            key,
            version,
            source_path: PathBuf::new(),
        }
    }

    /// The raw key bytes. Only the crypto engine should call this.
    pub(crate) fn expose_bytes(&self) -> &[u8; 32] {
        &self.key
    }

    /// Version recorded in the key file, persisted per row as
    /// `master_key_version` so a future rotation pass can tell envelopes apart.
    pub fn version(&self) -> i64 {
        self.version
    }

    /// Path the key was loaded from.
    pub fn source_path(&self) -> &Path {
        &self.source_path
    }
}

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MasterKey")
            .field("key", &"[REDACTED]")
            .field("version", &self.version)
            .field("source_path", &self.source_path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_key_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn loads_valid_key_file() {
        let hex_key = "ab".repeat(32);
        let file = write_key_file(&format!(r#"{{"version": 3, "key": "{}"}}"#, hex_key));

        let master_key = MasterKey::load(file.path()).unwrap();
        assert_eq!(master_key.version(), 3);
        assert_eq!(master_key.expose_bytes(), &[0xabu8; 32]);
        assert_eq!(master_key.source_path(), file.path());
    }

    #[test]
    fn version_defaults_to_one() {
        let hex_key = "00".repeat(32);
        let file = write_key_file(&format!(r#"{{"key": "{}"}}"#, hex_key));

        let master_key = MasterKey::load(file.path()).unwrap();
        assert_eq!(master_key.version(), 1);
    }

    #[test]
    fn missing_file_fails() {
        let result = MasterKey::load("/nonexistent/master.key");
        assert!(matches!(result, Err(Error::MasterKey(_))));
    }

    #[test]
    fn invalid_json_fails() {
        let file = write_key_file("not json at all");
        assert!(matches!(MasterKey::load(file.path()), Err(Error::MasterKey(_))));
    }

    #[test]
    fn missing_key_field_fails() {
        let file = write_key_file(r#"{"version": 1}"#);
        assert!(matches!(MasterKey::load(file.path()), Err(Error::MasterKey(_))));
    }

    #[test]
    fn non_hex_key_fails() {
        let file = write_key_file(r#"{"version": 1, "key": "zz"}"#);
        assert!(matches!(MasterKey::load(file.path()), Err(Error::MasterKey(_))));
    }

    #[test]
    fn wrong_length_key_fails() {
        let file = write_key_file(&format!(r#"{{"version": 1, "key": "{}"}}"#, "ab".repeat(16)));
        let err = MasterKey::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("32 bytes"));
    }

    #[test]
    fn error_messages_never_contain_key_material() {
        let hex_key = "ab".repeat(16); // wrong length on purpose
        let file = write_key_file(&format!(r#"{{"version": 1, "key": "{}"}}"#, hex_key));
        let err = MasterKey::load(file.path()).unwrap_err();
        assert!(!err.to_string().contains(&hex_key));
    }

    #[test]
    fn debug_output_is_redacted() {
        let master_key = MasterKey::from_bytes([0x42u8; 32], 1);
        let debug = format!("{:?}", master_key);
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("42, 42"));
    }
}
