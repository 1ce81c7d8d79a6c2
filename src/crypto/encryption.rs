//! AES-256-GCM field encryption
//!
//! Each value is encrypted under a fresh random nonce and stored as a single
//! base64 text token: `version || nonce || ciphertext-with-tag`.

use std::cell::OnceCell;
use std::path::{Path, PathBuf};

use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Key, Nonce,
};
use aes_gcm::aead::rand_core::RngCore;
use base64::{engine::general_purpose::STANDARD, Engine};
use serde_json::Value;

use crate::error::{RecordsError, RecordsResult};
use crate::models::Record;

use super::key_derivation::EncryptionKey;
use super::key_file::load_or_create_key;

/// Size of the AES-GCM nonce in bytes (96 bits)
const NONCE_SIZE: usize = 12;

/// Size of the AES-GCM authentication tag in bytes
const TAG_SIZE: usize = 16;

/// Token format version, bumped on algorithm changes
const TOKEN_VERSION: u8 = 1;

/// Suffix of the column holding the encrypted form of a field
pub const ENCRYPTED_SUFFIX: &str = "_encrypted";

/// Name of the column holding the encrypted form of `field`
pub fn encrypted_field_name(field: &str) -> String {
    format!("{}{}", field, ENCRYPTED_SUFFIX)
}

/// Encrypts and decrypts individual record fields with one key
pub struct FieldEncryptor {
    cipher: Aes256Gcm,
}

impl FieldEncryptor {
    /// Create an encryptor for the given key
    pub fn new(key: &EncryptionKey) -> Self {
        Self {
            cipher: Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes())),
        }
    }

    /// Create an encryptor from a key file, creating the file if missing
    pub fn from_key_file(path: &Path) -> RecordsResult<Self> {
        let (key, _) = load_or_create_key(path, None)?;
        Ok(Self::new(&key))
    }

    /// Encrypt a string into a printable token
    pub fn encrypt(&self, plaintext: &str) -> RecordsResult<String> {
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|e| RecordsError::Crypto(format!("Encryption failed: {}", e)))?;

        let mut token = Vec::with_capacity(1 + NONCE_SIZE + ciphertext.len());
        token.push(TOKEN_VERSION);
        token.extend_from_slice(&nonce_bytes);
        token.extend_from_slice(&ciphertext);

        Ok(STANDARD.encode(token))
    }

    /// Decrypt a token produced by [`FieldEncryptor::encrypt`]
    ///
    /// An empty token means "no data" and yields `Ok(None)`. Corrupted,
    /// tampered, or foreign tokens are errors.
    pub fn decrypt(&self, token: &str) -> RecordsResult<Option<String>> {
        if token.is_empty() {
            return Ok(None);
        }

        let bytes = STANDARD
            .decode(token)
            .map_err(|e| RecordsError::Crypto(format!("Invalid token encoding: {}", e)))?;

        if bytes.len() < 1 + NONCE_SIZE + TAG_SIZE {
            return Err(RecordsError::Crypto(format!(
                "Token too short: {} bytes",
                bytes.len()
            )));
        }

        let (version, rest) = bytes.split_at(1);
        if version[0] != TOKEN_VERSION {
            return Err(RecordsError::Crypto(format!(
                "Unsupported token version: {}",
                version[0]
            )));
        }

        let (nonce_bytes, ciphertext) = rest.split_at(NONCE_SIZE);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| {
                RecordsError::Crypto("Decryption failed: invalid key or corrupted data".into())
            })?;

        String::from_utf8(plaintext)
            .map(Some)
            .map_err(|e| RecordsError::Crypto(format!("Invalid UTF-8 in decrypted data: {}", e)))
    }

    /// Encrypt the named fields of a record
    ///
    /// Each named field holding a non-empty value is replaced by
    /// `<field>_encrypted`. Absent, null and empty fields are left untouched.
    pub fn encrypt_fields(&self, record: &Record, fields: &[&str]) -> RecordsResult<Record> {
        let mut result = record.clone();

        for field in fields {
            let Some(plaintext) = result.get(*field).and_then(field_text) else {
                continue;
            };

            let token = self.encrypt(&plaintext)?;
            result.insert(encrypted_field_name(field), Value::String(token));
            result.remove(*field);
        }

        Ok(result)
    }

    /// Decrypt the named fields of a record
    ///
    /// For each name whose `<field>_encrypted` value is present and
    /// non-empty, the plaintext is written back under the plain name.
    pub fn decrypt_fields(&self, record: &Record, fields: &[&str]) -> RecordsResult<Record> {
        let mut result = record.clone();

        for field in fields {
            let token = match result.get(&encrypted_field_name(field)) {
                Some(Value::String(token)) if !token.is_empty() => token.clone(),
                _ => continue,
            };

            if let Some(plaintext) = self.decrypt(&token)? {
                result.insert((*field).to_string(), Value::String(plaintext));
            }
        }

        Ok(result)
    }
}

/// Text form of a field value, or `None` when there is nothing to encrypt
fn field_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// A field encryptor whose key is loaded on first use
///
/// Constructed with a key file path and handed to whoever needs field
/// encryption. The key file is read (or created) on the first call to
/// [`LazyEncryptor::get`] and the encryptor is reused afterwards.
pub struct LazyEncryptor {
    key_file: PathBuf,
    encryptor: OnceCell<FieldEncryptor>,
}

impl LazyEncryptor {
    /// Create a handle for the given key file
    pub fn new(key_file: impl Into<PathBuf>) -> Self {
        Self {
            key_file: key_file.into(),
            encryptor: OnceCell::new(),
        }
    }

    /// Path of the backing key file
    pub fn key_file(&self) -> &Path {
        &self.key_file
    }

    /// Whether the key has been loaded yet
    pub fn is_loaded(&self) -> bool {
        self.encryptor.get().is_some()
    }

    /// Get the encryptor, loading or creating the key on first access
    pub fn get(&self) -> RecordsResult<&FieldEncryptor> {
        if let Some(encryptor) = self.encryptor.get() {
            return Ok(encryptor);
        }

        let encryptor = FieldEncryptor::from_key_file(&self.key_file)?;
        Ok(self.encryptor.get_or_init(|| encryptor))
    }
}
