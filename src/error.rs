//! Custom error types for student-records
//!
//! This module defines the error hierarchy for the application using thiserror
//! for ergonomic error definitions.

use thiserror::Error;

/// The main error type for student-records operations
#[derive(Error, Debug)]
pub enum RecordsError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// The database could not be opened or reopened
    #[error("Connection error: {0}")]
    Connection(String),

    /// A statement failed and its transaction was rolled back
    #[error("Query error: {0}")]
    Query(String),

    /// Key handling, encryption or decryption failures
    #[error("Encryption error: {0}")]
    Crypto(String),

    /// Validation errors for operator input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// Login rejected
    #[error("Authentication failed: {0}")]
    Auth(String),
}

impl RecordsError {
    /// Create a "not found" error for students
    pub fn student_not_found(identifier: impl ToString) -> Self {
        Self::NotFound {
            entity_type: "Student",
            identifier: identifier.to_string(),
        }
    }

    /// Create a "not found" error for departments
    pub fn department_not_found(identifier: impl ToString) -> Self {
        Self::NotFound {
            entity_type: "Department",
            identifier: identifier.to_string(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this is a cryptographic failure
    pub fn is_crypto(&self) -> bool {
        matches!(self, Self::Crypto(_))
    }
}

impl From<std::io::Error> for RecordsError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for RecordsError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

impl From<rusqlite::Error> for RecordsError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Query(err.to_string())
    }
}

/// Result type alias for student-records operations
pub type RecordsResult<T> = Result<T, RecordsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RecordsError::Config("test error".into());
        assert_eq!(err.to_string(), "Configuration error: test error");
    }

    #[test]
    fn test_not_found_error() {
        let err = RecordsError::student_not_found(42);
        assert_eq!(err.to_string(), "Student not found: 42");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: RecordsError = io_err.into();
        assert!(matches!(err, RecordsError::Io(_)));
    }

    #[test]
    fn test_from_sqlite_error() {
        let err: RecordsError = rusqlite::Error::InvalidQuery.into();
        assert!(matches!(err, RecordsError::Query(_)));
    }
}
