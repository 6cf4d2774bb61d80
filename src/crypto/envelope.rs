//! Envelope encryption using AES-256-GCM.
//!
//! Every stored item is encrypted independently under the master key. The
//! stored envelope is `nonce || ciphertext || tag`, so each row carries its
//! own cryptographic state and no global nonce counter has to be persisted.

use crate::crypto::MasterKey;
use crate::errors::{Error, Result};
use ring::aead::{self, Aad, BoundKey, Nonce, NonceSequence, UnboundKey, AES_256_GCM};
use ring::rand::{SecureRandom, SystemRandom};
use std::sync::Arc;
use tracing::{debug, error, instrument};
use zeroize::{Zeroize, Zeroizing};

/// Size of AES-256-GCM nonce in bytes
pub const NONCE_SIZE: usize = 12;

/// Size of AES-256-GCM tag in bytes
pub const TAG_SIZE: usize = 16;

/// Single-use nonce sequence for AES-GCM
struct SingleNonce {
    nonce: Option<[u8; NONCE_SIZE]>,
}

impl SingleNonce {
    fn new(nonce_bytes: [u8; NONCE_SIZE]) -> Self {
        Self {
            nonce: Some(nonce_bytes),
        }
    }
}

impl NonceSequence for SingleNonce {
    fn advance(&mut self) -> std::result::Result<Nonce, ring::error::Unspecified> {
        self.nonce
            .take()
            .map(Nonce::assume_unique_for_key)
            .ok_or(ring::error::Unspecified)
    }
}

/// Envelope encryption engine bound to the process-wide master key.
///
/// Cloning is cheap; all clones share the same key handle. Plaintext is never
/// retained beyond the scope of a single call.
#[derive(Clone)]
pub struct EnvelopeCrypto {
    master_key: Arc<MasterKey>,
    rng: Arc<SystemRandom>,
}

impl EnvelopeCrypto {
    /// Create a new engine over the loaded master key.
    pub fn new(master_key: Arc<MasterKey>) -> Self {
        Self {
            master_key,
            rng: Arc::new(SystemRandom::new()),
        }
    }

    /// Version of the master key this engine encrypts under.
    pub fn master_key_version(&self) -> i64 {
        self.master_key.version()
    }

    /// Shared random source, also used for symmetric key generation.
    pub(crate) fn rng(&self) -> &SystemRandom {
        &self.rng
    }

    /// Encrypt a plaintext payload.
    ///
    /// Returns the self-describing envelope `nonce || ciphertext || tag`.
    /// A fresh random nonce is drawn per call; nonce reuse under the same key
    /// would be a critical vulnerability.
    #[instrument(skip(self, plaintext), fields(plaintext_len = plaintext.len()))]
    pub fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        self.rng.fill(&mut nonce_bytes).map_err(|_| {
            error!("Failed to generate random nonce");
            Error::internal("Failed to generate random nonce for encryption")
        })?;

        let unbound_key =
            UnboundKey::new(&AES_256_GCM, self.master_key.expose_bytes()).map_err(|_| {
                error!("Failed to create encryption key");
                Error::internal("Failed to create encryption key")
            })?;

        let nonce_sequence = SingleNonce::new(nonce_bytes);
        let mut sealing_key = aead::SealingKey::new(unbound_key, nonce_sequence);

        // Envelope layout: nonce, then ciphertext with the tag appended.
        let mut envelope = Vec::with_capacity(NONCE_SIZE + plaintext.len() + TAG_SIZE);
        envelope.extend_from_slice(&nonce_bytes);
        envelope.extend_from_slice(plaintext);

        let mut in_out = envelope.split_off(NONCE_SIZE);
        sealing_key
            .seal_in_place_append_tag(Aad::empty(), &mut in_out)
            .map_err(|_| {
                error!("Encryption failed");
                Error::internal("Failed to encrypt payload")
            })?;
        envelope.extend_from_slice(&in_out);

        debug!(envelope_len = envelope.len(), "Sealed payload");

        Ok(envelope)
    }

    /// Decrypt a ciphertext envelope.
    ///
    /// Fails with [`Error::DecryptionFailed`] for any malformed, tampered, or
    /// wrong-key envelope. The failure modes are deliberately
    /// indistinguishable from each other. The returned plaintext and the
    /// internal scratch buffer are both wiped when dropped.
    #[instrument(skip(self, envelope), fields(envelope_len = envelope.len()))]
    pub fn open(&self, envelope: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        if envelope.len() < NONCE_SIZE + TAG_SIZE {
            error!("Envelope too short to contain nonce and authentication tag");
            return Err(Error::DecryptionFailed);
        }

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        nonce_bytes.copy_from_slice(&envelope[..NONCE_SIZE]);

        let unbound_key =
            UnboundKey::new(&AES_256_GCM, self.master_key.expose_bytes()).map_err(|_| {
                error!("Failed to create decryption key");
                Error::internal("Failed to create decryption key")
            })?;

        let nonce_sequence = SingleNonce::new(nonce_bytes);
        let mut opening_key = aead::OpeningKey::new(unbound_key, nonce_sequence);

        let mut in_out = envelope[NONCE_SIZE..].to_vec();

        let plaintext = opening_key
            .open_in_place(Aad::empty(), &mut in_out)
            .map_err(|_| {
                error!("Decryption failed - possible tampering or wrong master key");
                Error::DecryptionFailed
            })?;

        let plaintext = Zeroizing::new(plaintext.to_vec());
        // open_in_place decrypted into the scratch buffer; wipe it.
        in_out.zeroize();

        debug!(plaintext_len = plaintext.len(), "Opened envelope");

        Ok(plaintext)
    }
}

impl std::fmt::Debug for EnvelopeCrypto {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvelopeCrypto")
            .field("master_key_version", &self.master_key.version())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_crypto() -> EnvelopeCrypto {
        EnvelopeCrypto::new(Arc::new(MasterKey::from_bytes([0x42u8; 32], 1)))
    }

    #[test]
    fn seal_open_roundtrip() {
        let crypto = test_crypto();
        let plaintext = b"my-secret-oauth-token";

        let envelope = crypto.seal(plaintext).unwrap();

        // Envelope carries nonce and tag on top of the plaintext.
        assert_eq!(envelope.len(), NONCE_SIZE + plaintext.len() + TAG_SIZE);

        let decrypted = crypto.open(&envelope).unwrap();
        assert_eq!(*decrypted, plaintext);
    }

    #[test]
    fn same_plaintext_yields_different_envelopes() {
        let crypto = test_crypto();
        let plaintext = b"same-plaintext";

        let envelope1 = crypto.seal(plaintext).unwrap();
        let envelope2 = crypto.seal(plaintext).unwrap();

        // Fresh random nonces per call.
        assert_ne!(envelope1[..NONCE_SIZE], envelope2[..NONCE_SIZE]);
        assert_ne!(envelope1, envelope2);

        assert_eq!(*crypto.open(&envelope1).unwrap(), plaintext);
        assert_eq!(*crypto.open(&envelope2).unwrap(), plaintext);
    }

    #[test]
    fn tampered_envelope_fails() {
        let crypto = test_crypto();
        let envelope = crypto.seal(b"sensitive-data").unwrap();

        // Flip one bit in every position; no tampering may go unnoticed.
        for i in 0..envelope.len() {
            let mut tampered = envelope.clone();
            tampered[i] ^= 0x01;
            let result = crypto.open(&tampered);
            assert!(
                matches!(result, Err(Error::DecryptionFailed)),
                "bit flip at offset {} was not detected",
                i
            );
        }
    }

    #[test]
    fn wrong_master_key_fails() {
        let crypto = test_crypto();
        let other = EnvelopeCrypto::new(Arc::new(MasterKey::from_bytes([0x43u8; 32], 1)));

        let envelope = crypto.seal(b"sensitive-data").unwrap();

        let result = other.open(&envelope);
        assert!(matches!(result, Err(Error::DecryptionFailed)));
    }

    #[test]
    fn truncated_envelope_fails() {
        let crypto = test_crypto();
        let envelope = crypto.seal(b"data").unwrap();

        let result = crypto.open(&envelope[..NONCE_SIZE + TAG_SIZE - 1]);
        assert!(matches!(result, Err(Error::DecryptionFailed)));
    }

    #[test]
    fn empty_plaintext_roundtrips() {
        let crypto = test_crypto();

        let envelope = crypto.seal(b"").unwrap();
        assert_eq!(envelope.len(), NONCE_SIZE + TAG_SIZE);

        let decrypted = crypto.open(&envelope).unwrap();
        assert!(decrypted.is_empty());
    }

    #[test]
    fn large_plaintext_roundtrips() {
        let crypto = test_crypto();
        let plaintext = vec![0xAB; 1024 * 1024]; // 1MB

        let envelope = crypto.seal(&plaintext).unwrap();
        let decrypted = crypto.open(&envelope).unwrap();

        assert_eq!(*decrypted, plaintext);
    }

    #[test]
    fn debug_output_has_no_key_material() {
        let crypto = test_crypto();
        let debug = format!("{:?}", crypto);
        assert!(!debug.contains("66")); // 0x42
        assert!(debug.contains("master_key_version"));
    }
}
