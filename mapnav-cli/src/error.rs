//! CLI error type.

use std::fmt;
use std::path::PathBuf;

use mapnav::config::ConfigError;
use mapnav::logging::LoggingError;
use mapnav::navigation::{ErrorClass, NavigationError};

/// Errors surfaced by CLI commands.
#[derive(Debug)]
pub enum CliError {
    /// Configuration problem described in plain text.
    Config(String),

    /// The config file could not be read or written.
    ConfigFile(ConfigError),

    /// Logging could not be set up.
    Logging(LoggingError),

    /// An input file could not be read.
    Input { path: PathBuf, message: String },

    /// Navigation failed to start.
    Navigation(NavigationError),

    /// Failed to create the Tokio runtime.
    RuntimeCreation(String),
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Navigation(e) => match e.class() {
                ErrorClass::Precondition => 2,
                ErrorClass::Acquisition => 3,
                ErrorClass::Session => 4,
                ErrorClass::Cancelled => 130,
            },
            _ => 1,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::ConfigFile(e) => write!(f, "Config file error: {}", e),
            CliError::Logging(e) => write!(f, "Failed to set up logging: {}", e),
            CliError::Input { path, message } => {
                write!(f, "Cannot read {}: {}", path.display(), message)
            }
            CliError::Navigation(e) => write!(f, "{}", e.user_message()),
            CliError::RuntimeCreation(msg) => write!(f, "Failed to create Tokio runtime: {}", msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::ConfigFile(e) => Some(e),
            CliError::Logging(e) => Some(e),
            CliError::Navigation(e) => Some(e),
            CliError::Config(_) | CliError::Input { .. } | CliError::RuntimeCreation(_) => None,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::ConfigFile(e)
    }
}

impl From<LoggingError> for CliError {
    fn from(e: LoggingError) -> Self {
        CliError::Logging(e)
    }
}

impl From<NavigationError> for CliError {
    fn from(e: NavigationError) -> Self {
        CliError::Navigation(e)
    }
}
