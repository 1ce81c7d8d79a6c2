//! Storage layer for student-records
//!
//! A single [`Database`] gateway owns the SQLite connection. Table-specific
//! operations live in their own modules as further `impl Database` blocks.

pub mod database;
pub mod departments;
pub mod schema;
pub mod students;
pub mod users;

pub use database::Database;
pub use schema::SCHEMA_VERSION;

use crate::config::DatabaseConfig;
use crate::error::{RecordsError, RecordsResult};

/// Connect to the configured database and bring its schema up to date
pub fn initialize_storage(config: DatabaseConfig) -> RecordsResult<Database> {
    let mut db = Database::new(config);
    if !db.connect() {
        return Err(RecordsError::Connection(format!(
            "Could not connect to {}",
            db.config().target()
        )));
    }
    db.migrate()?;
    Ok(db)
}
