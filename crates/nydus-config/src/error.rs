//! Error types for configuration loading

use std::path::PathBuf;
use thiserror::Error;

/// Configuration error type
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A daemon mode string outside the known set
    #[error("Invalid daemon mode: {0}")]
    InvalidDaemonMode(String),

    /// Config file could not be read
    #[error("Failed to read config file {path:?}: {source}")]
    Io {
        /// File that was read
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for [`crate::DaemonConfig`]
    #[error("Failed to parse config{}: {source}", describe_path(.path))]
    Parse {
        /// Source file, if the input came from disk
        path: Option<PathBuf>,
        /// Underlying TOML error
        #[source]
        source: toml::de::Error,
    },

    /// Loaded values violate a constraint
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

fn describe_path(path: &Option<PathBuf>) -> String {
    path.as_ref().map(|p| format!(" {:?}", p)).unwrap_or_default()
}
