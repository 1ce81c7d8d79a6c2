//! Cryptographic functions for student-records
//!
//! Provides AES-256-GCM field encryption with PBKDF2 key derivation for the
//! sensitive student columns, plus Argon2id hashing of login passwords.

pub mod encryption;
pub mod key_derivation;
pub mod key_file;
pub mod password;
pub mod secure_memory;

pub use encryption::{encrypted_field_name, FieldEncryptor, LazyEncryptor, ENCRYPTED_SUFFIX};
pub use key_derivation::{derive_key, EncryptionKey, KEY_SIZE, PBKDF2_ITERATIONS};
pub use key_file::{generate_key_file, load_key, load_or_create_key, save_key};
pub use password::{hash_password, verify_password};
pub use secure_memory::SecureString;
