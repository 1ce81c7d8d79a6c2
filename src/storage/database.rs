//! Database gateway
//!
//! Owns the SQLite connection, opens it on demand, and runs every statement
//! inside its own transaction: committed on success, rolled back on failure.

use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine};
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{Connection, ErrorCode, Params, Row};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::DatabaseConfig;
use crate::error::{RecordsError, RecordsResult};
use crate::models::Record;

/// How long to wait on a locked database before failing
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Gateway to the records database
///
/// State is either disconnected (`conn` is `None`) or connected. Any query
/// issued while disconnected first tries to connect.
pub struct Database {
    config: DatabaseConfig,
    conn: Option<Connection>,
    acting_user: Option<i64>,
}

impl Database {
    /// Create a gateway; no connection is opened yet
    pub fn new(config: DatabaseConfig) -> Self {
        Self {
            config,
            conn: None,
            acting_user: None,
        }
    }

    /// Create a gateway and connect to a fresh in-memory database with the
    /// schema applied (useful for testing)
    pub fn open_in_memory() -> RecordsResult<Self> {
        let mut db = Self::new(DatabaseConfig::in_memory());
        if !db.connect() {
            return Err(RecordsError::Connection(
                "Failed to open in-memory database".into(),
            ));
        }
        db.migrate()?;
        Ok(db)
    }

    /// Get the connection settings
    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Whether a connection is currently open
    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    /// The user recorded as creator of new students
    pub fn acting_user(&self) -> Option<i64> {
        self.acting_user
    }

    /// Set the user recorded as creator of new students
    pub fn set_acting_user(&mut self, user_id: Option<i64>) {
        self.acting_user = user_id;
    }

    fn open(&self) -> RecordsResult<Connection> {
        let conn = match self.config.database_path() {
            Some(path) => Connection::open(&path).map_err(|e| {
                RecordsError::Connection(format!("{}: {}", path.display(), e))
            })?,
            None => Connection::open_in_memory()
                .map_err(|e| RecordsError::Connection(e.to_string()))?,
        };

        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .and_then(|_| conn.busy_timeout(BUSY_TIMEOUT))
            .map_err(|e| RecordsError::Connection(e.to_string()))?;

        Ok(conn)
    }

    /// Open the connection
    ///
    /// Returns `false` and logs the cause on failure. Calling this while
    /// already connected keeps the existing connection.
    pub fn connect(&mut self) -> bool {
        if self.conn.is_some() {
            return true;
        }

        match self.open() {
            Ok(conn) => {
                self.conn = Some(conn);
                tracing::info!(target = %self.config.target(), "Connected to database");
                true
            }
            Err(e) => {
                tracing::error!(target = %self.config.target(), error = %e, "Database connection failed");
                false
            }
        }
    }

    /// Close the connection; does nothing when already disconnected
    pub fn disconnect(&mut self) {
        if let Some(conn) = self.conn.take() {
            if let Err((_, e)) = conn.close() {
                tracing::warn!(error = %e, "Error while closing database connection");
            }
            tracing::info!("Database connection closed");
        }
    }

    /// Get the open connection, connecting first if needed
    pub(crate) fn connection(&mut self) -> RecordsResult<&mut Connection> {
        if self.conn.is_none() && !self.connect() {
            return Err(RecordsError::Connection(format!(
                "Could not connect to {}",
                self.config.target()
            )));
        }

        self.conn
            .as_mut()
            .ok_or_else(|| RecordsError::Connection("Not connected".into()))
    }

    /// Execute one SQL statement
    ///
    /// With `fetch` set, rows produced by the statement are returned as
    /// records keyed by column name (`None` if the statement has no result
    /// columns). Without `fetch` the statement is treated as a mutation and
    /// `None` is returned. On failure the transaction is rolled back and the
    /// error returned; the connection stays open unless it was lost.
    pub fn execute_query<P: Params>(
        &mut self,
        sql: &str,
        params: P,
        fetch: bool,
    ) -> RecordsResult<Option<Vec<Record>>> {
        let conn = self.connection()?;

        match run_in_transaction(conn, sql, params, fetch) {
            Ok(rows) => Ok(rows),
            Err(e) => {
                tracing::error!(error = %e, "Query failed, transaction rolled back");
                if is_connection_lost(&e) {
                    self.disconnect();
                }
                Err(RecordsError::Query(e.to_string()))
            }
        }
    }

    /// Execute a query and deserialize each row
    pub fn query_as<T, P>(&mut self, sql: &str, params: P) -> RecordsResult<Vec<T>>
    where
        T: DeserializeOwned,
        P: Params,
    {
        let rows = self.execute_query(sql, params, true)?.unwrap_or_default();
        rows.into_iter()
            .map(|row| serde_json::from_value(Value::Object(row)).map_err(RecordsError::from))
            .collect()
    }

    /// Version string of the database engine
    pub fn server_version(&mut self) -> RecordsResult<String> {
        let rows = self
            .execute_query("SELECT sqlite_version() AS version", [], true)?
            .unwrap_or_default();

        rows.first()
            .and_then(|row| row.get("version"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| RecordsError::Query("Engine did not report a version".into()))
    }

    /// Names of the tables in the database
    pub fn table_names(&mut self) -> RecordsResult<Vec<String>> {
        let rows = self
            .execute_query(
                "SELECT name FROM sqlite_master \
                 WHERE type = 'table' AND name NOT LIKE 'sqlite_%' \
                 ORDER BY name",
                [],
                true,
            )?
            .unwrap_or_default();

        Ok(rows
            .iter()
            .filter_map(|row| row.get("name").and_then(Value::as_str))
            .map(str::to_string)
            .collect())
    }

    /// Check that the database can be reached
    ///
    /// Connects, logs the engine version and table count, then disconnects.
    pub fn test_connection(&mut self) -> bool {
        if !self.connect() {
            return false;
        }

        let result = self
            .server_version()
            .and_then(|version| Ok((version, self.table_names()?)));

        let ok = match result {
            Ok((version, tables)) => {
                tracing::info!(version = %version, tables = tables.len(), "Database connection test passed");
                true
            }
            Err(e) => {
                tracing::error!(error = %e, "Database connection test failed");
                false
            }
        };

        self.disconnect();
        ok
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        self.disconnect();
    }
}

fn run_in_transaction<P: Params>(
    conn: &mut Connection,
    sql: &str,
    params: P,
    fetch: bool,
) -> rusqlite::Result<Option<Vec<Record>>> {
    let tx = conn.transaction()?;

    let rows = {
        let mut stmt = tx.prepare(sql)?;
        let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        if names.is_empty() {
            stmt.execute(params)?;
            None
        } else {
            let mut rows = stmt.query(params)?;
            let mut records = Vec::new();
            while let Some(row) = rows.next()? {
                if fetch {
                    records.push(row_to_record(row, &names)?);
                }
            }
            fetch.then_some(records)
        }
    };

    tx.commit()?;
    Ok(rows)
}

fn row_to_record(row: &Row<'_>, names: &[String]) -> rusqlite::Result<Record> {
    let mut record = Record::new();
    for (i, name) in names.iter().enumerate() {
        record.insert(name.clone(), value_to_json(row.get_ref(i)?));
    }
    Ok(record)
}

fn value_to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => Value::from(f),
        ValueRef::Text(t) => Value::String(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::String(STANDARD.encode(b)),
    }
}

/// Convert a record value into an SQL parameter
pub(crate) fn json_to_sql(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => SqlValue::Real(n.as_f64().unwrap_or_default()),
        },
        Value::String(s) => SqlValue::Text(s.clone()),
        other => SqlValue::Text(other.to_string()),
    }
}

fn is_connection_lost(err: &rusqlite::Error) -> bool {
    matches!(
        err.sqlite_error_code(),
        Some(ErrorCode::CannotOpen | ErrorCode::NotADatabase | ErrorCode::SystemIoFailure)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn file_database(dir: &TempDir) -> Database {
        Database::new(DatabaseConfig::with_path(dir.path().join("records.db")))
    }

    #[test]
    fn test_connect_and_disconnect() {
        let temp_dir = TempDir::new().unwrap();
        let mut db = file_database(&temp_dir);

        assert!(!db.is_connected());
        assert!(db.connect());
        assert!(db.is_connected());

        db.disconnect();
        assert!(!db.is_connected());
        db.disconnect();
        assert!(!db.is_connected());
    }

    #[test]
    fn test_connect_failure_returns_false() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing").join("dir").join("records.db");
        let mut db = Database::new(DatabaseConfig::with_path(&path));

        assert!(!db.connect());
        assert!(!db.is_connected());

        let err = db.execute_query("SELECT 1", [], true).unwrap_err();
        assert!(matches!(err, RecordsError::Connection(_)));
    }

    #[test]
    fn test_query_reconnects_implicitly() {
        let temp_dir = TempDir::new().unwrap();
        let mut db = file_database(&temp_dir);

        db.execute_query("CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT)", [], false)
            .unwrap();
        db.disconnect();

        db.execute_query("INSERT INTO t (name) VALUES (?1)", ["alpha"], false)
            .unwrap();
        assert!(db.is_connected());

        let rows = db
            .execute_query("SELECT id, name FROM t", [], true)
            .unwrap()
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["name"], json!("alpha"));
        assert_eq!(rows[0]["id"], json!(1));
    }

    #[test]
    fn test_fetch_false_returns_none() {
        let mut db = Database::open_in_memory().unwrap();
        let result = db.execute_query("SELECT 1 AS one", [], false).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_malformed_query_rolls_back_and_connection_survives() {
        let mut db = Database::open_in_memory().unwrap();
        db.execute_query("CREATE TABLE t (id INTEGER PRIMARY KEY, v INTEGER NOT NULL)", [], false)
            .unwrap();

        let err = db.execute_query("SELEC * FROM t", [], true).unwrap_err();
        assert!(matches!(err, RecordsError::Query(_)));
        assert!(db.is_connected());

        // A failed mutation leaves no partial state behind
        let err = db
            .execute_query("INSERT INTO t (v) VALUES (1), (NULL)", [], false)
            .unwrap_err();
        assert!(matches!(err, RecordsError::Query(_)));

        let rows = db
            .execute_query("SELECT COUNT(*) AS n FROM t", [], true)
            .unwrap()
            .unwrap();
        assert_eq!(rows[0]["n"], json!(0));
    }

    #[test]
    fn test_value_conversion() {
        let mut db = Database::open_in_memory().unwrap();
        let rows = db
            .execute_query(
                "SELECT NULL AS n, 1.5 AS r, 'текст' AS t, x'0102' AS b",
                [],
                true,
            )
            .unwrap()
            .unwrap();

        assert_eq!(rows[0]["n"], Value::Null);
        assert_eq!(rows[0]["r"], json!(1.5));
        assert_eq!(rows[0]["t"], json!("текст"));
        assert_eq!(rows[0]["b"], json!("AQI="));
    }

    #[test]
    fn test_json_to_sql() {
        assert_eq!(json_to_sql(&json!(null)), SqlValue::Null);
        assert_eq!(json_to_sql(&json!(true)), SqlValue::Integer(1));
        assert_eq!(json_to_sql(&json!(42)), SqlValue::Integer(42));
        assert_eq!(json_to_sql(&json!("x")), SqlValue::Text("x".into()));
    }

    #[test]
    fn test_connection_self_test() {
        let temp_dir = TempDir::new().unwrap();
        let mut db = file_database(&temp_dir);
        assert!(db.test_connection());
        assert!(!db.is_connected());
    }

    #[test]
    fn test_server_version() {
        let mut db = Database::open_in_memory().unwrap();
        let version = db.server_version().unwrap();
        assert!(version.starts_with('3'));
    }
}
