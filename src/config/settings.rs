//! Application settings for student-records
//!
//! Settings come from named variables (`DB_HOST`, `DB_PORT`, ...). An
//! environment file is loaded first with dotenvy; variables already present
//! in the process environment take precedence over the file.

use std::path::{Path, PathBuf};

use tracing::Level;

use super::paths::AppPaths;
use crate::crypto::SecureString;
use crate::error::RecordsError;

/// Database name that selects a private in-memory database
pub const IN_MEMORY_DATABASE: &str = ":memory:";

/// File extension given to database names without one
const DATABASE_EXTENSION: &str = "sqlite3";

/// Database connection settings
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    /// Database name, or a path to the database file
    pub name: String,
    pub user: String,
    pub password: SecureString,
    /// Directory a bare database name is placed in
    pub data_dir: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            name: "student_db_2024".to_string(),
            user: "postgres".to_string(),
            password: SecureString::default(),
            data_dir: PathBuf::from("."),
        }
    }
}

impl DatabaseConfig {
    /// Settings for a throwaway in-memory database
    pub fn in_memory() -> Self {
        Self {
            name: IN_MEMORY_DATABASE.to_string(),
            ..Default::default()
        }
    }

    /// Settings for a database stored in the given file
    pub fn with_path(path: impl AsRef<Path>) -> Self {
        Self {
            name: path.as_ref().to_string_lossy().into_owned(),
            ..Default::default()
        }
    }

    /// Whether this configuration names an in-memory database
    pub fn is_in_memory(&self) -> bool {
        self.name == IN_MEMORY_DATABASE
    }

    /// Location of the database file, `None` for in-memory databases
    ///
    /// A bare name such as `student_db_2024` becomes
    /// `<data_dir>/student_db_2024.sqlite3`; anything that already has an
    /// extension or a directory component is used as given.
    pub fn database_path(&self) -> Option<PathBuf> {
        if self.is_in_memory() {
            return None;
        }

        let name = Path::new(&self.name);
        let path = if name.extension().is_some() || name.components().count() > 1 {
            name.to_path_buf()
        } else {
            name.with_extension(DATABASE_EXTENSION)
        };

        Some(if path.is_absolute() {
            path
        } else {
            self.data_dir.join(path)
        })
    }

    /// Human-readable connection target, without the password
    pub fn target(&self) -> String {
        format!("{}@{}:{}/{}", self.user, self.host, self.port, self.name)
    }
}

/// Encryption settings
#[derive(Debug, Clone)]
pub struct EncryptionSettings {
    /// Path of the field encryption key file
    pub key_file: PathBuf,
}

impl Default for EncryptionSettings {
    fn default() -> Self {
        Self {
            key_file: PathBuf::from("secret.key"),
        }
    }
}

/// General application settings
#[derive(Debug, Clone)]
pub struct AppSettings {
    /// Minimum level of log events to record
    pub log_level: Level,
    /// Directory for exported documents
    pub export_dir: PathBuf,
    /// Application log file
    pub log_file: PathBuf,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            log_level: Level::INFO,
            export_dir: PathBuf::from("exports"),
            log_file: PathBuf::from("logs").join("app.log"),
        }
    }
}

/// All settings for student-records
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub database: DatabaseConfig,
    pub encryption: EncryptionSettings,
    pub app: AppSettings,
    /// Environment file the settings were read from, if one was found
    pub env_file: Option<PathBuf>,
}

impl Settings {
    /// Load settings from an environment file and the process environment
    ///
    /// `env_file` defaults to `.env` in the base directory. A missing file is
    /// not an error: defaults and process variables are used instead.
    pub fn load(paths: &AppPaths, env_file: Option<&Path>) -> Result<Self, RecordsError> {
        let env_path = env_file
            .map(|p| paths.resolve(p))
            .unwrap_or_else(|| paths.env_file());

        let loaded = if env_path.exists() {
            dotenvy::from_path(&env_path).map_err(|e| {
                RecordsError::Config(format!(
                    "Failed to load environment file {}: {}",
                    env_path.display(),
                    e
                ))
            })?;
            Some(env_path)
        } else {
            None
        };

        let mut settings = Self::from_lookup(paths, |key| std::env::var(key).ok())?;
        settings.env_file = loaded;
        Ok(settings)
    }

    /// Build settings from a variable lookup function
    pub fn from_lookup<F>(paths: &AppPaths, lookup: F) -> Result<Self, RecordsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Settings::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match get("DB_PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|_| {
                RecordsError::Config(format!("DB_PORT must be a port number, got '{}'", raw))
            })?,
            None => defaults.database.port,
        };

        let log_level = match get("LOG_LEVEL") {
            Some(raw) => parse_log_level(&raw)?,
            None => defaults.app.log_level,
        };

        let database = DatabaseConfig {
            host: get("DB_HOST").unwrap_or(defaults.database.host),
            port,
            name: get("DB_NAME").unwrap_or(defaults.database.name),
            user: get("DB_USER").unwrap_or(defaults.database.user),
            password: lookup("DB_PASSWORD").map(SecureString::from).unwrap_or_default(),
            data_dir: paths.base_dir().to_path_buf(),
        };

        let key_file = get("ENCRYPTION_KEY_FILE")
            .map(PathBuf::from)
            .unwrap_or(defaults.encryption.key_file);

        let export_dir = get("EXPORT_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.app.export_dir);

        Ok(Self {
            database,
            encryption: EncryptionSettings {
                key_file: paths.resolve(key_file),
            },
            app: AppSettings {
                log_level,
                export_dir: paths.resolve(export_dir),
                log_file: paths.log_file(),
            },
            env_file: None,
        })
    }
}

/// Parse a log level name
///
/// Accepts the tracing level names plus `WARNING` and `CRITICAL`, which are
/// common in existing environment files.
pub fn parse_log_level(raw: &str) -> Result<Level, RecordsError> {
    match raw.trim().to_ascii_uppercase().as_str() {
        "TRACE" => Ok(Level::TRACE),
        "DEBUG" => Ok(Level::DEBUG),
        "INFO" => Ok(Level::INFO),
        "WARN" | "WARNING" => Ok(Level::WARN),
        "ERROR" | "CRITICAL" => Ok(Level::ERROR),
        other => Err(RecordsError::Config(format!(
            "Unknown LOG_LEVEL '{}'",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let paths = AppPaths::with_base_dir(PathBuf::from("/srv/records"));
        let settings = Settings::from_lookup(&paths, |_| None).unwrap();

        assert_eq!(settings.database.host, "localhost");
        assert_eq!(settings.database.port, 5432);
        assert_eq!(settings.database.name, "student_db_2024");
        assert_eq!(settings.database.user, "postgres");
        assert!(settings.database.password.is_empty());
        assert_eq!(
            settings.encryption.key_file,
            PathBuf::from("/srv/records/secret.key")
        );
        assert_eq!(settings.app.log_level, Level::INFO);
        assert_eq!(settings.app.export_dir, PathBuf::from("/srv/records/exports"));
    }

    #[test]
    fn test_overrides() {
        let paths = AppPaths::with_base_dir(PathBuf::from("/srv/records"));
        let lookup = lookup_from(&[
            ("DB_HOST", "db.internal"),
            ("DB_PORT", "6543"),
            ("DB_NAME", "campus"),
            ("DB_USER", "registrar"),
            ("DB_PASSWORD", "hunter2"),
            ("ENCRYPTION_KEY_FILE", "/etc/records/field.key"),
            ("LOG_LEVEL", "warning"),
            ("EXPORT_DIR", "out"),
        ]);
        let settings = Settings::from_lookup(&paths, lookup).unwrap();

        assert_eq!(settings.database.target(), "registrar@db.internal:6543/campus");
        assert_eq!(settings.database.password.expose(), "hunter2");
        assert_eq!(
            settings.encryption.key_file,
            PathBuf::from("/etc/records/field.key")
        );
        assert_eq!(settings.app.log_level, Level::WARN);
        assert_eq!(settings.app.export_dir, PathBuf::from("/srv/records/out"));
    }

    #[test]
    fn test_invalid_port() {
        let paths = AppPaths::with_base_dir(PathBuf::from("."));
        let result = Settings::from_lookup(&paths, lookup_from(&[("DB_PORT", "abc")]));
        assert!(matches!(result, Err(RecordsError::Config(_))));
    }

    #[test]
    fn test_invalid_log_level() {
        assert!(parse_log_level("loud").is_err());
        assert_eq!(parse_log_level("CRITICAL").unwrap(), Level::ERROR);
    }

    #[test]
    fn test_database_path() {
        let mut config = DatabaseConfig {
            data_dir: PathBuf::from("/data"),
            ..Default::default()
        };
        assert_eq!(
            config.database_path(),
            Some(PathBuf::from("/data/student_db_2024.sqlite3"))
        );

        config.name = "records.db".into();
        assert_eq!(config.database_path(), Some(PathBuf::from("/data/records.db")));

        config.name = "/var/lib/records.db".into();
        assert_eq!(
            config.database_path(),
            Some(PathBuf::from("/var/lib/records.db"))
        );

        assert_eq!(DatabaseConfig::in_memory().database_path(), None);
    }

    #[test]
    fn test_load_reads_env_file() {
        let temp_dir = TempDir::new().unwrap();
        let env_path = temp_dir.path().join("custom.env");
        std::fs::write(
            &env_path,
            "STUDENT_RECORDS_TEST_ONLY=1\nENCRYPTION_KEY_FILE_UNUSED=x\n",
        )
        .unwrap();

        let paths = AppPaths::with_base_dir(temp_dir.path().to_path_buf());
        let settings = Settings::load(&paths, Some(Path::new("custom.env"))).unwrap();

        assert_eq!(settings.env_file, Some(env_path));
        assert_eq!(
            std::env::var("STUDENT_RECORDS_TEST_ONLY").as_deref(),
            Ok("1")
        );
    }

    #[test]
    fn test_load_without_env_file() {
        let temp_dir = TempDir::new().unwrap();
        let paths = AppPaths::with_base_dir(temp_dir.path().to_path_buf());
        let settings = Settings::load(&paths, None).unwrap();
        assert!(settings.env_file.is_none());
    }
}
