//! Configuration and startup validation for dirmirror
//!
//! All runtime settings live in an explicit [`SyncConfig`] that is built and
//! validated once at startup and then handed to the reconciler and the
//! driver. Nothing is read from configuration files or global state.
//!
//! # Examples
//!
//! ```rust,no_run
//! use dirmirror_config::ConfigBuilder;
//!
//! let config = ConfigBuilder::new()
//!     .source("/data/photos")
//!     .destination("/backup/photos")
//!     .interval_secs(60)
//!     .log_file("/var/log/dirmirror.log")
//!     .build()
//!     .expect("invalid configuration");
//!
//! println!("Syncing every {}", config.interval);
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

use dirmirror_types::{ChunkSize, HashAlgorithm, SyncInterval};
use std::path::PathBuf;

pub mod builder;
pub mod error;
pub mod paths;

pub use builder::ConfigBuilder;
pub use error::{ConfigError, ConfigResult};

/// Complete configuration for a dirmirror run
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Tree to mirror from
    pub source: PathBuf,
    /// Tree to mirror into
    pub destination: PathBuf,
    /// Append-only audit log
    pub log_file: PathBuf,
    /// Wait between passes
    pub interval: SyncInterval,
    /// Change detection settings
    pub hash: HashConfig,
    /// Reconciliation behavior
    pub options: SyncOptions,
    /// Stop after this many passes
    pub max_passes: Option<u64>,
}

/// Change detection settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HashConfig {
    /// Digest algorithm
    pub algorithm: HashAlgorithm,
    /// Read chunk size while hashing
    pub chunk_size: ChunkSize,
}

/// Reconciliation behavior switches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOptions {
    /// Report what would change without touching the destination
    pub dry_run: bool,
    /// Follow symbolic links in the source tree
    pub follow_symlinks: bool,
    /// Copy modification times along with file contents
    pub preserve_timestamps: bool,
    /// Delete destination directories that have no source counterpart
    pub prune_orphan_dirs: bool,
    /// Reuse digests of files whose size and mtime are unchanged
    pub digest_cache: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            follow_symlinks: false,
            preserve_timestamps: true,
            prune_orphan_dirs: true,
            digest_cache: false,
        }
    }
}

impl SyncOptions {
    /// Options for a dry run
    pub fn dry_run() -> Self {
        Self {
            dry_run: true,
            ..Self::default()
        }
    }
}
