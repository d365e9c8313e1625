//! In-memory digest cache shared by consecutive passes
//!
//! A cached digest is only trusted while the file's size and modification
//! time are exactly what they were when it was hashed. Entries not touched
//! during a pass are evicted when the pass ends.

use crate::hash::Digest;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::debug;

/// Cache entry for a file digest
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// File size when hashed
    pub size: u64,
    /// Last modified time when hashed
    pub modified: SystemTime,
    /// Digest of the contents
    pub digest: Digest,
}

impl CacheEntry {
    /// Check if this entry is still valid for the given file metadata
    pub fn is_valid(&self, size: u64, modified: SystemTime) -> bool {
        self.size == size && self.modified == modified
    }
}

/// Hit/miss counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from the cache
    pub hits: u64,
    /// Lookups that required hashing
    pub misses: u64,
    /// Entries evicted at pass end
    pub evicted: u64,
}

/// Digest cache keyed by absolute path
#[derive(Debug, Default)]
pub struct DigestCache {
    entries: HashMap<PathBuf, CacheEntry>,
    touched: HashSet<PathBuf>,
    stats: CacheStats,
}

impl DigestCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a digest if the cached entry still matches `size` and `modified`
    pub fn get(&mut self, path: &Path, size: u64, modified: SystemTime) -> Option<Digest> {
        self.touched.insert(path.to_path_buf());
        match self.entries.get(path) {
            Some(entry) if entry.is_valid(size, modified) => {
                self.stats.hits += 1;
                Some(entry.digest.clone())
            }
            _ => {
                self.stats.misses += 1;
                None
            }
        }
    }

    /// Store a freshly computed digest
    pub fn insert(&mut self, path: &Path, size: u64, modified: SystemTime, digest: Digest) {
        self.touched.insert(path.to_path_buf());
        self.entries.insert(
            path.to_path_buf(),
            CacheEntry {
                size,
                modified,
                digest,
            },
        );
    }

    /// Forget `path` and everything below it
    pub fn invalidate(&mut self, path: &Path) {
        self.entries.retain(|cached, _| !cached.starts_with(path));
    }

    /// Start tracking which entries a pass uses
    pub fn begin_pass(&mut self) {
        self.touched.clear();
    }

    /// Drop entries the pass did not look at
    pub fn end_pass(&mut self) {
        let before = self.entries.len();
        let touched = &self.touched;
        self.entries.retain(|path, _| touched.contains(path));
        let evicted = (before - self.entries.len()) as u64;
        self.stats.evicted += evicted;
        if evicted > 0 {
            debug!("Evicted {} stale digest cache entries", evicted);
        }
    }

    /// Number of cached digests
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is cached
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Hit/miss counters since creation
    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}
