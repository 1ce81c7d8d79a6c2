//! Key material and password-based key derivation
//!
//! Field keys are 256-bit AES keys. They are either random, derived from a
//! password with PBKDF2-HMAC-SHA256, or loaded from the key file.

use std::fmt;

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::OsRng;
use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{RecordsError, RecordsResult};

/// Length of a field encryption key in bytes (AES-256)
pub const KEY_SIZE: usize = 32;

/// Length of a freshly generated salt in bytes
pub const SALT_SIZE: usize = 16;

/// PBKDF2 iteration count
pub const PBKDF2_ITERATIONS: u32 = 100_000;

/// A symmetric field encryption key, wiped from memory on drop
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct EncryptionKey {
    key: [u8; KEY_SIZE],
}

impl EncryptionKey {
    /// Generate a random key from the OS RNG
    pub fn generate() -> Self {
        let mut key = [0u8; KEY_SIZE];
        OsRng.fill_bytes(&mut key);
        Self { key }
    }

    /// Build a key from raw bytes
    pub fn from_bytes(bytes: &[u8]) -> RecordsResult<Self> {
        let key: [u8; KEY_SIZE] = bytes.try_into().map_err(|_| {
            RecordsError::Crypto(format!(
                "Invalid key length: expected {} bytes, got {}",
                KEY_SIZE,
                bytes.len()
            ))
        })?;
        Ok(Self { key })
    }

    /// Get the key bytes
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.key
    }
}

// Never print key material
impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptionKey").finish_non_exhaustive()
    }
}

/// Generate a random salt for key derivation
pub fn generate_salt() -> Vec<u8> {
    let mut salt = vec![0u8; SALT_SIZE];
    OsRng.fill_bytes(&mut salt);
    salt
}

/// Derive a key from a password
///
/// Uses the supplied salt, or a fresh random one when `salt` is `None`.
/// Returns the key together with the salt that produced it so the caller can
/// persist the salt and re-derive the same key later.
pub fn derive_key(password: &str, salt: Option<&[u8]>) -> RecordsResult<(EncryptionKey, Vec<u8>)> {
    let salt = match salt {
        Some(salt) if salt.is_empty() => {
            return Err(RecordsError::Crypto("Salt cannot be empty".into()));
        }
        Some(salt) => salt.to_vec(),
        None => generate_salt(),
    };

    let mut key = [0u8; KEY_SIZE];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, PBKDF2_ITERATIONS, &mut key);

    let derived = EncryptionKey { key };
    key.zeroize();

    Ok((derived, salt))
}
