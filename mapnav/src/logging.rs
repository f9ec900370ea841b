//! Logging setup.
//!
//! Installs a `tracing` subscriber: an `EnvFilter` (from `RUST_LOG`, or the
//! configured level), a stderr layer, and, when a directory is configured,
//! a daily-rolling log file written off-thread.

use std::path::PathBuf;

use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::fmt::time::LocalTime;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LoggingConfig;

/// File name prefix of rolled log files.
pub const LOG_FILE_PREFIX: &str = "mapnav.log";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoggingError {
    /// A global subscriber is already installed.
    #[error("Logging already initialized")]
    AlreadyInitialized,

    /// The configured level is not a valid filter directive.
    #[error("Invalid log filter '{filter}': {reason}")]
    InvalidFilter { filter: String, reason: String },

    /// The log directory could not be created.
    #[error("Cannot create log directory {}: {reason}", path.display())]
    Directory { path: PathBuf, reason: String },
}

/// Keeps the file writer flushing. Hold it until the program exits.
#[derive(Debug)]
pub struct LoggingGuard {
    _file: Option<WorkerGuard>,
    file_path: Option<PathBuf>,
}

impl LoggingGuard {
    /// Directory receiving log files, if file logging is on.
    pub fn log_dir(&self) -> Option<&PathBuf> {
        self.file_path.as_ref()
    }
}

/// Build the filter: `RUST_LOG` wins over the configured level.
pub fn build_filter(level: &str) -> Result<EnvFilter, LoggingError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(level).map_err(|e| LoggingError::InvalidFilter {
        filter: level.to_string(),
        reason: e.to_string(),
    })
}

/// Install the global subscriber.
///
/// # Errors
///
/// - `LoggingError::InvalidFilter` for a malformed level
/// - `LoggingError::Directory` if the log directory cannot be created
/// - `LoggingError::AlreadyInitialized` on a second call
pub fn init_logging(config: &LoggingConfig) -> Result<LoggingGuard, LoggingError> {
    let filter = build_filter(&config.level)?;
    let stderr = fmt::layer().with_writer(std::io::stderr).with_target(false);

    let Some(dir) = config.directory.clone() else {
        tracing_subscriber::registry()
            .with(filter)
            .with(stderr)
            .try_init()
            .map_err(|_| LoggingError::AlreadyInitialized)?;
        return Ok(LoggingGuard {
            _file: None,
            file_path: None,
        });
    };

    std::fs::create_dir_all(&dir).map_err(|e| LoggingError::Directory {
        path: dir.clone(),
        reason: e.to_string(),
    })?;
    let appender = tracing_appender::rolling::daily(&dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr)
        .with(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_timer(LocalTime::rfc_3339()),
        )
        .try_init()
        .map_err(|_| LoggingError::AlreadyInitialized)?;

    tracing::debug!(dir = %dir.display(), "File logging enabled");
    Ok(LoggingGuard {
        _file: Some(guard),
        file_path: Some(dir),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_level_is_rejected() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let err = build_filter("mapnav=[").unwrap_err();
        assert!(matches!(err, LoggingError::InvalidFilter { .. }));
    }

    #[test]
    fn test_second_init_fails() {
        let dir = tempfile::tempdir().unwrap();
        let config = LoggingConfig {
            level: "debug".to_string(),
            directory: Some(dir.path().join("logs")),
        };

        let guard = init_logging(&config).unwrap();
        assert_eq!(guard.log_dir(), Some(&dir.path().join("logs")));
        assert!(dir.path().join("logs").is_dir());

        let second = init_logging(&LoggingConfig::default());
        assert_eq!(second.unwrap_err(), LoggingError::AlreadyInitialized);
    }
}
