//! Configuration module for student-records
//!
//! This module provides configuration management including:
//! - Base directory and path resolution
//! - Settings loaded from an environment file and the process environment

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{AppSettings, DatabaseConfig, EncryptionSettings, Settings};
