//! student-records - Student records management with field-level encryption
//!
//! This library provides the core functionality for a student records
//! application backed by SQLite. Sensitive student fields (phone number and
//! record-book number) are encrypted with AES-256-GCM before they are stored
//! and decrypted only when a record is shown.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Settings from environment files and path management
//! - `crypto`: Key handling, field encryption and password hashing
//! - `error`: Custom error types
//! - `logging`: tracing subscriber setup
//! - `models`: Students, departments and operator accounts
//! - `storage`: The database gateway
//! - `services`: Business logic layer
//! - `cli`, `display`: Command handlers and terminal formatting
//!
//! # Example
//!
//! ```rust,ignore
//! use student_records::config::{AppPaths, Settings};
//! use student_records::crypto::LazyEncryptor;
//! use student_records::storage::initialize_storage;
//!
//! let paths = AppPaths::new()?;
//! let settings = Settings::load(&paths, None)?;
//! let mut db = initialize_storage(settings.database.clone())?;
//! let encryptor = LazyEncryptor::new(&settings.encryption.key_file);
//! let students = db.get_students(10)?;
//! ```

pub mod cli;
pub mod config;
pub mod crypto;
pub mod display;
pub mod error;
pub mod logging;
pub mod models;
pub mod services;
pub mod storage;

pub use error::{RecordsError, RecordsResult};
