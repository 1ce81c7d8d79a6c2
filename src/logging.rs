//! Logging setup
//!
//! Log events go to stderr and, when a log file is given, are appended to it
//! without ANSI colors. `RUST_LOG` overrides the configured level.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{RecordsError, RecordsResult};

/// Build the event filter from `RUST_LOG`, falling back to `level`
pub fn env_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_ascii_lowercase()))
}

/// Install the global subscriber
///
/// Fails if a subscriber is already installed or the log file cannot be
/// opened.
pub fn init(level: Level, log_file: Option<&Path>) -> RecordsResult<()> {
    let file_layer = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(env_filter(level))
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| RecordsError::Config(format!("Failed to initialize logging: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_filter_uses_level() {
        if std::env::var("RUST_LOG").is_err() {
            let filter = env_filter(Level::WARN);
            assert_eq!(
                filter.max_level_hint(),
                Some(tracing_subscriber::filter::LevelFilter::WARN)
            );
        }
    }
}
