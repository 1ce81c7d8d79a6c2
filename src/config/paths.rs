//! Path management for student-records
//!
//! Relative paths from the configuration (key file, database file, export
//! directory) are resolved against a base directory.
//!
//! ## Base Directory Resolution Order
//!
//! 1. `STUDENT_RECORDS_HOME` environment variable (if set)
//! 2. The current working directory

use std::path::{Path, PathBuf};

use crate::error::RecordsError;

/// Manages the paths used by student-records
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Base directory that relative paths are resolved against
    base_dir: PathBuf,
}

impl AppPaths {
    /// Create a new AppPaths instance
    ///
    /// # Errors
    ///
    /// Returns an error if no override is set and the current directory
    /// cannot be determined.
    pub fn new() -> Result<Self, RecordsError> {
        let base_dir = match std::env::var("STUDENT_RECORDS_HOME") {
            Ok(custom) if !custom.is_empty() => PathBuf::from(custom),
            _ => std::env::current_dir().map_err(|e| {
                RecordsError::Config(format!("Could not determine current directory: {}", e))
            })?,
        };

        Ok(Self { base_dir })
    }

    /// Create AppPaths with a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Get the base directory
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Default location of the environment file
    pub fn env_file(&self) -> PathBuf {
        self.base_dir.join(".env")
    }

    /// Get the log directory
    pub fn log_dir(&self) -> PathBuf {
        self.base_dir.join("logs")
    }

    /// Get the path to the application log
    pub fn log_file(&self) -> PathBuf {
        self.log_dir().join("app.log")
    }

    /// Resolve a possibly relative path against the base directory
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    /// Ensure the log directory and the given extra directories exist
    pub fn ensure_directories(&self, extra: &[&Path]) -> Result<(), RecordsError> {
        std::fs::create_dir_all(self.log_dir())
            .map_err(|e| RecordsError::Io(format!("Failed to create log directory: {}", e)))?;

        for dir in extra {
            std::fs::create_dir_all(dir).map_err(|e| {
                RecordsError::Io(format!(
                    "Failed to create directory {}: {}",
                    dir.display(),
                    e
                ))
            })?;
        }

        Ok(())
    }
}
