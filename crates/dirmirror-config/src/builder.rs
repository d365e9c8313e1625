//! Configuration builder with startup validation

use crate::paths::{is_within, normalize};
use crate::{ConfigError, ConfigResult, HashConfig, SyncConfig, SyncOptions};
use dirmirror_types::{ChunkSize, HashAlgorithm, SyncInterval};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Builder collecting command-line values into a validated [`SyncConfig`]
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    source: Option<PathBuf>,
    destination: Option<PathBuf>,
    log_file: Option<PathBuf>,
    interval: Option<IntervalValue>,
    algorithm: HashAlgorithm,
    chunk_size: Option<usize>,
    options: SyncOptions,
    max_passes: Option<u64>,
}

#[derive(Debug, Clone, Copy)]
enum IntervalValue {
    Seconds(u64),
    Exact(Duration),
}

impl ConfigBuilder {
    /// Create a new configuration builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the source directory
    pub fn source<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.source = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set the destination directory
    pub fn destination<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.destination = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set the audit log file
    pub fn log_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.log_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set the interval in whole seconds (must be at least 1)
    pub fn interval_secs(mut self, seconds: u64) -> Self {
        self.interval = Some(IntervalValue::Seconds(seconds));
        self
    }

    /// Set an exact interval; used by embedders and tests that need sub-second waits
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = Some(IntervalValue::Exact(interval));
        self
    }

    /// Set the digest algorithm
    pub fn hash_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Set the hashing chunk size in bytes
    pub fn chunk_size(mut self, bytes: usize) -> Self {
        self.chunk_size = Some(bytes);
        self
    }

    /// Replace all reconciliation options at once
    pub fn options(mut self, options: SyncOptions) -> Self {
        self.options = options;
        self
    }

    /// Enable or disable dry-run mode
    pub fn dry_run(mut self, enabled: bool) -> Self {
        self.options.dry_run = enabled;
        self
    }

    /// Follow symbolic links in the source tree
    pub fn follow_symlinks(mut self, enabled: bool) -> Self {
        self.options.follow_symlinks = enabled;
        self
    }

    /// Copy modification times along with contents
    pub fn preserve_timestamps(mut self, enabled: bool) -> Self {
        self.options.preserve_timestamps = enabled;
        self
    }

    /// Delete destination directories missing from the source
    pub fn prune_orphan_dirs(mut self, enabled: bool) -> Self {
        self.options.prune_orphan_dirs = enabled;
        self
    }

    /// Reuse digests of unchanged files between passes
    pub fn digest_cache(mut self, enabled: bool) -> Self {
        self.options.digest_cache = enabled;
        self
    }

    /// Stop after `passes` passes (`None` runs until stopped)
    pub fn max_passes(mut self, passes: Option<u64>) -> Self {
        self.max_passes = passes;
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> ConfigResult<SyncConfig> {
        let source = self
            .source
            .ok_or_else(|| ConfigError::missing_required("source"))?;
        let destination = self
            .destination
            .ok_or_else(|| ConfigError::missing_required("destination"))?;
        let log_file = self
            .log_file
            .ok_or_else(|| ConfigError::missing_required("log_file"))?;

        let interval = match self.interval {
            Some(IntervalValue::Seconds(seconds)) => SyncInterval::from_secs(seconds),
            Some(IntervalValue::Exact(duration)) => SyncInterval::from_duration(duration),
            None => return Err(ConfigError::missing_required("interval")),
        }
        .map_err(|message| ConfigError::invalid_value("interval", message))?;

        let chunk_size = match self.chunk_size {
            Some(bytes) => ChunkSize::new(bytes)
                .map_err(|message| ConfigError::invalid_value("chunk_size", message))?,
            None => ChunkSize::default(),
        };

        if self.max_passes == Some(0) {
            return Err(ConfigError::invalid_value(
                "max_passes",
                "must be at least 1",
            ));
        }

        Self::validate_paths(&source, &destination, &log_file)?;

        let config = SyncConfig {
            source,
            destination,
            log_file,
            interval,
            hash: HashConfig {
                algorithm: self.algorithm,
                chunk_size,
            },
            options: self.options,
            max_passes: self.max_passes,
        };
        debug!("Validated configuration: {:?}", config);
        Ok(config)
    }

    /// Check the startup preconditions on the three paths
    fn validate_paths(source: &Path, destination: &Path, log_file: &Path) -> ConfigResult<()> {
        if !source.exists() {
            return Err(ConfigError::SourceMissing {
                path: source.to_path_buf(),
            });
        }
        if !source.is_dir() {
            return Err(ConfigError::SourceNotDirectory {
                path: source.to_path_buf(),
            });
        }

        let resolve = |path: &Path| {
            normalize(path).map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })
        };
        let source_dir = resolve(source)?;
        let destination = resolve(destination)?;
        let log_file = resolve(log_file)?;

        if source_dir == destination {
            return Err(ConfigError::SamePath { path: source_dir });
        }
        if is_within(&destination, &source_dir) || is_within(&source_dir, &destination) {
            return Err(ConfigError::NestedPaths {
                source_dir,
                destination,
            });
        }
        if is_within(&log_file, &destination) {
            return Err(ConfigError::LogFileInDestination {
                log_file,
                destination,
            });
        }
        if is_within(&log_file, &source_dir) {
            return Err(ConfigError::LogFileInSource {
                log_file,
                source_dir,
            });
        }

        Ok(())
    }
}
