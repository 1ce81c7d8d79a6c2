//! Key file persistence
//!
//! The key file holds the 32 raw key bytes. Files holding the base64 text
//! form of a 32-byte key are accepted on load as well.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use base64::Engine;

use crate::error::{RecordsError, RecordsResult};

use super::key_derivation::{derive_key, EncryptionKey, KEY_SIZE};

/// Parse key material read from a key file
fn parse_key_bytes(bytes: &[u8]) -> RecordsResult<EncryptionKey> {
    if bytes.len() == KEY_SIZE {
        return EncryptionKey::from_bytes(bytes);
    }

    let text = std::str::from_utf8(bytes)
        .map(str::trim)
        .map_err(|_| malformed(bytes.len()))?;

    let decoded = URL_SAFE
        .decode(text)
        .or_else(|_| STANDARD.decode(text))
        .map_err(|_| malformed(bytes.len()))?;

    EncryptionKey::from_bytes(&decoded)
}

fn malformed(len: usize) -> RecordsError {
    RecordsError::Crypto(format!(
        "Key file does not contain a {}-byte key ({} bytes found)",
        KEY_SIZE, len
    ))
}

/// Read a key from an existing key file
pub fn load_key(path: &Path) -> RecordsResult<EncryptionKey> {
    let bytes = fs::read(path).map_err(|e| {
        RecordsError::Io(format!("Failed to read key file {}: {}", path.display(), e))
    })?;
    parse_key_bytes(&bytes)
}

/// Write a key to disk, replacing any existing file
pub fn save_key(path: &Path, key: &EncryptionKey) -> RecordsResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            RecordsError::Io(format!(
                "Failed to create directory {}: {}",
                parent.display(),
                e
            ))
        })?;
    }

    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path).map_err(|e| {
        RecordsError::Io(format!("Failed to create key file {}: {}", path.display(), e))
    })?;

    file.write_all(key.as_bytes())
        .and_then(|_| file.sync_all())
        .map_err(|e| {
            RecordsError::Io(format!("Failed to write key file {}: {}", path.display(), e))
        })?;

    tracing::info!(path = %path.display(), "Encryption key saved");
    Ok(())
}

/// Load the key from `path`, creating and persisting a new one if needed
///
/// Returns the key and whether it was newly created. A new key is derived
/// from `password` when one is given, otherwise it is random. When the file
/// exists but cannot be read, the failure is logged and a replacement key is
/// generated. Malformed key material is an error and the file is left alone.
pub fn load_or_create_key(
    path: &Path,
    password: Option<&str>,
) -> RecordsResult<(EncryptionKey, bool)> {
    if path.exists() {
        match fs::read(path) {
            Ok(bytes) => {
                let key = parse_key_bytes(&bytes)?;
                tracing::info!(path = %path.display(), "Encryption key loaded");
                return Ok((key, false));
            }
            Err(e) => {
                tracing::error!(
                    path = %path.display(),
                    error = %e,
                    "Failed to read key file, generating a new key"
                );
            }
        }
    }

    let key = match password {
        Some(password) => derive_key(password, None)?.0,
        None => EncryptionKey::generate(),
    };

    save_key(path, &key)?;
    tracing::info!(path = %path.display(), "Created new encryption key");

    Ok((key, true))
}

/// Generate a fresh key file
///
/// With a password the key is derived from it under a random salt that is
/// not kept, so the password adds entropy but cannot recreate the key. The
/// key file is the only copy either way.
///
/// Refuses to replace an existing file unless `force` is set, since data
/// encrypted under the old key becomes unreadable.
pub fn generate_key_file(
    path: &Path,
    force: bool,
    password: Option<&str>,
) -> RecordsResult<EncryptionKey> {
    if path.exists() && !force {
        return Err(RecordsError::Validation(format!(
            "Key file {} already exists (use --force to overwrite)",
            path.display()
        )));
    }

    let key = match password {
        Some(password) => derive_key(password, None)?.0,
        None => EncryptionKey::generate(),
    };
    save_key(path, &key)?;
    Ok(key)
}
