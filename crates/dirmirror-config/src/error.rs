//! Error types for configuration and startup validation

use dirmirror_types::Error as DirmirrorError;
use std::path::PathBuf;
use thiserror::Error;

/// Configuration error type
///
/// Every variant is fatal: the process reports it and exits before any
/// synchronization work is performed.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Missing required configuration
    #[error("Missing required configuration: {key}")]
    MissingRequired {
        /// Configuration key that is missing
        key: String,
    },

    /// Invalid configuration value
    #[error("Invalid value for '{key}': {message}")]
    InvalidValue {
        /// Configuration key
        key: String,
        /// Error message
        message: String,
    },

    /// Source folder does not exist
    #[error("Source folder does not exist: {}", path.display())]
    SourceMissing {
        /// The configured source path
        path: PathBuf,
    },

    /// Source path exists but is not a directory
    #[error("Source path is not a directory: {}", path.display())]
    SourceNotDirectory {
        /// The configured source path
        path: PathBuf,
    },

    /// Source and destination resolve to the same directory
    #[error("Source folder and destination folder cannot be the same: {}", path.display())]
    SamePath {
        /// The shared path
        path: PathBuf,
    },

    /// One tree root lies inside the other
    #[error(
        "Source folder and destination folder cannot be nested: {} / {}",
        source_dir.display(),
        destination.display()
    )]
    NestedPaths {
        /// Normalized source path
        source_dir: PathBuf,
        /// Normalized destination path
        destination: PathBuf,
    },

    /// Log file would be synced away or deleted
    #[error(
        "Log file cannot be in the destination folder: {} is inside {}",
        log_file.display(),
        destination.display()
    )]
    LogFileInDestination {
        /// Normalized log file path
        log_file: PathBuf,
        /// Normalized destination path
        destination: PathBuf,
    },

    /// Log file would be mirrored on every pass
    #[error(
        "Log file cannot be in the source folder: {} is inside {}",
        log_file.display(),
        source_dir.display()
    )]
    LogFileInSource {
        /// Normalized log file path
        log_file: PathBuf,
        /// Normalized source path
        source_dir: PathBuf,
    },

    /// I/O error while resolving a path
    #[error("I/O error resolving '{}': {source}", path.display())]
    Io {
        /// Path being resolved
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },
}

impl From<ConfigError> for DirmirrorError {
    fn from(error: ConfigError) -> Self {
        DirmirrorError::startup(error.to_string())
    }
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

impl ConfigError {
    /// Create a new missing required error
    pub fn missing_required<S: Into<String>>(key: S) -> Self {
        Self::MissingRequired { key: key.into() }
    }

    /// Create a new invalid value error
    pub fn invalid_value<K: Into<String>, M: Into<String>>(key: K, message: M) -> Self {
        Self::InvalidValue {
            key: key.into(),
            message: message.into(),
        }
    }
}
