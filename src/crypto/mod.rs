//! # Cryptography
//!
//! Envelope encryption, master key loading, and key generation for the
//! sealbox secrets manager. Everything stored in the database is encrypted
//! under the process-wide master key; each ciphertext envelope is
//! self-describing (`nonce || ciphertext || tag`), so no cryptographic state
//! lives outside the row itself.

mod envelope;
mod keygen;
mod master_key;

pub use envelope::{EnvelopeCrypto, NONCE_SIZE, TAG_SIZE};
pub use keygen::{
    generate_rsa_key_pair, generate_symmetric_key, GeneratedKeyPair, RSA_KEY_BITS,
    SYMMETRIC_KEY_SIZE,
};
pub use master_key::MasterKey;
