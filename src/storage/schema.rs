//! Schema creation and versioning

use crate::error::RecordsResult;

use super::Database;

/// Latest schema version
pub const SCHEMA_VERSION: i64 = 1;

const SCHEMA_V1: &str = r#"
    CREATE TABLE IF NOT EXISTS institutes (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        code TEXT NOT NULL UNIQUE,
        name TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS departments (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        institute_id INTEGER NOT NULL REFERENCES institutes(id),
        code TEXT NOT NULL,
        name TEXT NOT NULL,
        UNIQUE (institute_id, code)
    );

    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        login TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        full_name TEXT,
        is_active INTEGER NOT NULL DEFAULT 1,
        created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
    );

    CREATE TABLE IF NOT EXISTS students (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        last_name TEXT NOT NULL,
        initials TEXT NOT NULL,
        birth_year INTEGER NOT NULL,
        phone_encrypted TEXT,
        record_book_number_encrypted TEXT,
        admission_year INTEGER NOT NULL,
        group_name TEXT NOT NULL,
        department_id INTEGER NOT NULL REFERENCES departments(id),
        city_before TEXT,
        created_by INTEGER REFERENCES users(id),
        created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
    );

    CREATE INDEX IF NOT EXISTS idx_students_last_name ON students(last_name);
    CREATE INDEX IF NOT EXISTS idx_students_department ON students(department_id);

    INSERT OR REPLACE INTO schema_version (version) VALUES (1);
"#;

impl Database {
    /// Current schema version, 0 for an empty database
    pub fn schema_version(&mut self) -> RecordsResult<i64> {
        let conn = self.connection()?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER PRIMARY KEY);",
        )?;
        let version = conn.query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |row| row.get(0),
        )?;
        Ok(version)
    }

    /// Bring the schema up to date; safe to run repeatedly
    pub fn migrate(&mut self) -> RecordsResult<()> {
        let version = self.schema_version()?;

        if version < 1 {
            let conn = self.connection()?;
            let tx = conn.transaction()?;
            tx.execute_batch(SCHEMA_V1)?;
            tx.commit()?;
            tracing::info!(version = 1, "Applied schema migration");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrate_creates_tables() {
        let mut db = Database::open_in_memory().unwrap();
        assert_eq!(db.schema_version().unwrap(), SCHEMA_VERSION);

        let tables = db.table_names().unwrap();
        for table in ["departments", "institutes", "schema_version", "students", "users"] {
            assert!(tables.iter().any(|t| t == table), "missing table {}", table);
        }
    }

    #[test]
    fn test_migrate_is_idempotent() {
        let mut db = Database::open_in_memory().unwrap();
        db.migrate().unwrap();
        db.migrate().unwrap();
        assert_eq!(db.schema_version().unwrap(), SCHEMA_VERSION);
    }
}
