//! Error types and handling for dirmirror
//!
//! Errors fall into three tiers. Startup errors stop the process before any
//! work is done. I/O errors belong to a single entry and never abort a pass.
//! Filesystem state errors abort the current pass, which is retried on the
//! next interval.

use std::path::{Path, PathBuf};

/// Main error type for dirmirror operations
#[derive(thiserror::Error, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Error {
    /// Invalid arguments or paths detected before syncing starts
    #[error("Startup error: {message}")]
    Startup {
        /// Description of the rejected configuration
        message: String,
    },

    /// I/O operation on a single entry failed
    #[error("I/O error on '{}': {message}", path.display())]
    Io {
        /// Path of the entry being read, written or removed
        path: PathBuf,
        /// Error message from the I/O operation
        message: String,
    },

    /// One of the tree roots is missing or unusable for the whole pass
    #[error("Filesystem state error: {message}")]
    FilesystemState {
        /// Description of the inconsistent state
        message: String,
    },

    /// Generic error with custom message
    #[error("{message}")]
    Other {
        /// Custom error message
        message: String,
    },
}

/// Error kind for categorizing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Startup validation errors
    Startup,
    /// Per-entry I/O errors
    Io,
    /// Pass-level filesystem errors
    FilesystemState,
    /// Other errors
    Other,
}

impl Error {
    /// Get the error kind
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Startup { .. } => ErrorKind::Startup,
            Self::Io { .. } => ErrorKind::Io,
            Self::FilesystemState { .. } => ErrorKind::FilesystemState,
            Self::Other { .. } => ErrorKind::Other,
        }
    }

    /// Create a new startup error
    pub fn startup<S: Into<String>>(message: S) -> Self {
        Self::Startup {
            message: message.into(),
        }
    }

    /// Create a new I/O error for the given path
    pub fn io<P: AsRef<Path>, S: Into<String>>(path: P, message: S) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            message: message.into(),
        }
    }

    /// Create a new filesystem state error
    pub fn filesystem_state<S: Into<String>>(message: S) -> Self {
        Self::FilesystemState {
            message: message.into(),
        }
    }

    /// Create a new generic error
    pub fn other<S: Into<String>>(message: S) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// The path this error refers to, if any
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Io { path, .. } => Some(path),
            _ => None,
        }
    }
}

/// Attach a path to `std::io::Error` results
pub trait IoResultExt<T> {
    /// Convert the I/O error into [`Error::Io`] for `path`
    fn with_path<P: AsRef<Path>>(self, path: P) -> Result<T, Error>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path<P: AsRef<Path>>(self, path: P) -> Result<T, Error> {
        self.map_err(|e| Error::io(path, e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_error_display_keeps_message(message in ".*") {
            let errors = vec![
                Error::Startup { message: message.clone() },
                Error::Io { path: PathBuf::from("x"), message: message.clone() },
                Error::FilesystemState { message: message.clone() },
                Error::Other { message: message.clone() },
            ];

            for error in errors {
                prop_assert!(error.to_string().contains(&message));
                prop_assert_eq!(error.path().is_some(), error.kind() == ErrorKind::Io);
            }
        }
    }

    #[test]
    fn test_error_kind_mapping() {
        assert_eq!(Error::startup("x").kind(), ErrorKind::Startup);
        assert_eq!(Error::io("p", "x").kind(), ErrorKind::Io);
        assert_eq!(Error::filesystem_state("x").kind(), ErrorKind::FilesystemState);
        assert_eq!(Error::other("x").kind(), ErrorKind::Other);
    }

    #[test]
    fn test_io_error_display_includes_path() {
        let error = Error::io("dest/a.txt", "disk full");
        assert_eq!(error.to_string(), "I/O error on 'dest/a.txt': disk full");
        assert_eq!(error.path(), Some(Path::new("dest/a.txt")));
    }

    #[test]
    fn test_with_path_maps_std_errors() {
        let result: std::io::Result<()> = Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "gone",
        ));
        let error = result.with_path("missing.txt").unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Io);
        assert_eq!(error.path(), Some(Path::new("missing.txt")));
    }
}
