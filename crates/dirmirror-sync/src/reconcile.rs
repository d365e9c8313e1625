//! Tree reconciliation: make the destination tree mirror the source tree
//!
//! A pass walks the source top-down. Every source directory is mirrored
//! under the destination root before its children are visited, then its
//! files are reconciled against the mirrored directory:
//!
//! - missing in the destination: copied
//! - present with a different digest: overwritten
//! - present in the destination only: deleted (files and whole directories)
//!
//! Failures on a single entry are recorded as `SkippedWithError` and the
//! pass carries on. Only a missing or unusable tree root aborts a pass.

use crate::cache::DigestCache;
use crate::hash::{ContentHasher, Digest};
use dirmirror_config::{SyncConfig, SyncOptions};
use dirmirror_types::{ChangeKind, ChangeRecord, Error, IoResultExt, Result, SyncReport};
use filetime::FileTime;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, trace, warn};
use walkdir::WalkDir;

/// Receives change records as soon as they happen
pub trait ChangeReporter {
    /// Handle one record
    fn report(&mut self, record: &ChangeRecord);
}

impl ChangeReporter for Vec<ChangeRecord> {
    fn report(&mut self, record: &ChangeRecord) {
        self.push(record.clone());
    }
}

/// Reporter that discards records; the returned [`SyncReport`] still has them
impl ChangeReporter for () {
    fn report(&mut self, _record: &ChangeRecord) {}
}

/// What a directory entry is, without following symlinks in the destination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    File,
    Directory,
    Symlink,
    Other,
}

impl EntryKind {
    fn of(file_type: fs::FileType) -> Self {
        if file_type.is_symlink() {
            Self::Symlink
        } else if file_type.is_dir() {
            Self::Directory
        } else if file_type.is_file() {
            Self::File
        } else {
            Self::Other
        }
    }
}

type Listing = BTreeMap<OsString, EntryKind>;

/// Records and counters for the pass in progress
struct Pass<'a> {
    report: SyncReport,
    reporter: &'a mut dyn ChangeReporter,
}

impl Pass<'_> {
    fn record(&mut self, kind: ChangeKind, path: &Path) {
        let record = ChangeRecord::new(kind, path);
        self.reporter.report(&record);
        self.report.push(record);
    }

    fn skip(&mut self, fallback: &Path, error: Error) {
        let record = match error {
            Error::Io { path, message } => ChangeRecord::skipped(path, message),
            other => ChangeRecord::skipped(fallback, other),
        };
        warn!("{}", record.message());
        self.reporter.report(&record);
        self.report.push(record);
    }
}

/// Brings a destination tree into content and structure parity with a source tree
#[derive(Debug)]
pub struct TreeReconciler {
    hasher: ContentHasher,
    options: SyncOptions,
    cache: Option<DigestCache>,
}

impl TreeReconciler {
    /// Create a reconciler
    pub fn new(hasher: ContentHasher, options: SyncOptions) -> Self {
        let cache = options.digest_cache.then(DigestCache::new);
        Self {
            hasher,
            options,
            cache,
        }
    }

    /// Create a reconciler from a validated configuration
    pub fn from_config(config: &SyncConfig) -> Self {
        Self::new(ContentHasher::new(config.hash), config.options)
    }

    /// Options in effect
    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    /// The digest cache, when enabled
    pub fn cache(&self) -> Option<&DigestCache> {
        self.cache.as_ref()
    }

    /// Run one full reconciliation pass
    ///
    /// Returns `Err` only when a tree root is missing or unusable; every
    /// per-entry failure is part of the returned report instead.
    pub fn sync(
        &mut self,
        source_root: &Path,
        dest_root: &Path,
        reporter: &mut dyn ChangeReporter,
    ) -> Result<SyncReport> {
        let start_time = Instant::now();
        info!(
            "Starting pass: {} -> {}",
            source_root.display(),
            dest_root.display()
        );

        if !source_root.is_dir() {
            return Err(Error::filesystem_state(format!(
                "Source folder is missing or not a directory: {}",
                source_root.display()
            )));
        }

        let mut pass = Pass {
            report: SyncReport::new(),
            reporter,
        };
        self.prepare_destination_root(dest_root, &mut pass)?;

        if let Some(cache) = &mut self.cache {
            cache.begin_pass();
        }

        let mut walker = WalkDir::new(source_root)
            .follow_links(self.options.follow_symlinks)
            .sort_by_file_name()
            .into_iter();

        while let Some(entry) = walker.next() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().unwrap_or(source_root).to_path_buf();
                    if e.loop_ancestor().is_none() && is_symlink(&path) {
                        // Broken links are reported by list_source
                        trace!("Walk error on link already reported: {}", path.display());
                    } else {
                        pass.skip(&path, Error::io(&path, e.to_string()));
                    }
                    continue;
                }
            };
            if !entry.file_type().is_dir() {
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(source_root)
                .unwrap_or_else(|_| Path::new(""));
            let dest_dir = if relative.as_os_str().is_empty() {
                dest_root.to_path_buf()
            } else {
                dest_root.join(relative)
            };

            if entry.depth() > 0 {
                if let Err(e) = self.ensure_directory(&dest_dir, &mut pass) {
                    if !dest_root.is_dir() {
                        return Err(Error::filesystem_state(format!(
                            "Destination folder vanished during pass: {}",
                            dest_root.display()
                        )));
                    }
                    pass.skip(&dest_dir, e);
                    walker.skip_current_dir();
                    continue;
                }
            }

            if let Err(e) = self.reconcile_directory(entry.path(), &dest_dir, &mut pass) {
                pass.skip(entry.path(), e);
                walker.skip_current_dir();
            }
        }

        if let Some(cache) = &mut self.cache {
            cache.end_pass();
        }

        let mut report = pass.report;
        report.stats.duration = start_time.elapsed();
        info!(
            "Pass completed: {} copied, {} updated, {} deleted, {} errors in {:?}",
            report.stats.files_copied,
            report.stats.files_updated,
            report.stats.entries_deleted,
            report.stats.errors,
            report.stats.duration
        );
        Ok(report)
    }

    /// Make sure the destination root is a directory before walking
    fn prepare_destination_root(&self, dest_root: &Path, pass: &mut Pass<'_>) -> Result<()> {
        match fs::metadata(dest_root) {
            Ok(metadata) if metadata.is_dir() => Ok(()),
            Ok(_) => Err(Error::filesystem_state(format!(
                "Destination is not a directory: {}",
                dest_root.display()
            ))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                if self.options.dry_run {
                    debug!("DRY RUN: Would create {}", dest_root.display());
                } else {
                    fs::create_dir_all(dest_root).map_err(|e| {
                        Error::filesystem_state(format!(
                            "Failed to create destination folder '{}': {}",
                            dest_root.display(),
                            e
                        ))
                    })?;
                    info!("Recreated destination folder: {}", dest_root.display());
                }
                pass.record(ChangeKind::CreatedDestination, dest_root);
                Ok(())
            }
            Err(e) => Err(Error::filesystem_state(format!(
                "Cannot access destination folder '{}': {}",
                dest_root.display(),
                e
            ))),
        }
    }

    /// Mirror one source directory; its parent is guaranteed to exist already
    fn ensure_directory(&mut self, dest_dir: &Path, pass: &mut Pass<'_>) -> Result<()> {
        match fs::symlink_metadata(dest_dir) {
            Ok(metadata) if metadata.is_dir() => return Ok(()),
            Ok(_) if self.options.dry_run => {
                // Removal was already reported while reconciling the parent
                trace!("DRY RUN: {} would be replaced", dest_dir.display());
            }
            Ok(metadata) => {
                // A file or symlink occupies the directory's path
                let kind = EntryKind::of(metadata.file_type());
                self.remove_entry(dest_dir, kind)?;
                pass.record(ChangeKind::Deleted, dest_dir);
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(Error::io(dest_dir, e.to_string())),
        }

        if self.options.dry_run {
            debug!("DRY RUN: Would create directory {}", dest_dir.display());
        } else {
            fs::create_dir(dest_dir).with_path(dest_dir)?;
            debug!("Created directory: {}", dest_dir.display());
        }
        pass.report.stats.directories_created += 1;
        Ok(())
    }

    /// Reconcile the direct children of one mirrored directory pair
    fn reconcile_directory(
        &mut self,
        source_dir: &Path,
        dest_dir: &Path,
        pass: &mut Pass<'_>,
    ) -> Result<()> {
        let source_entries = self.list_source(source_dir, pass)?;
        let dest_entries = Self::list_destination(dest_dir)?;

        for (name, &dest_kind) in &dest_entries {
            let dest_path = dest_dir.join(name);
            let keep = match source_entries.get(name) {
                Some(&EntryKind::File) => dest_kind == EntryKind::File,
                Some(&EntryKind::Directory) => dest_kind == EntryKind::Directory,
                _ => false,
            };
            if keep {
                continue;
            }

            if dest_kind == EntryKind::Directory
                && !source_entries.contains_key(name)
                && !self.options.prune_orphan_dirs
            {
                warn!(
                    "Orphan directory left in destination: {}",
                    dest_path.display()
                );
                continue;
            }

            match self.remove_entry(&dest_path, dest_kind) {
                Ok(()) => pass.record(ChangeKind::Deleted, &dest_path),
                Err(e) => pass.skip(&dest_path, e),
            }
        }

        for (name, &source_kind) in &source_entries {
            if source_kind != EntryKind::File {
                continue;
            }
            let source_path = source_dir.join(name);
            let dest_path = dest_dir.join(name);

            if dest_entries.get(name) == Some(&EntryKind::File) {
                self.update_file(&source_path, &dest_path, pass);
            } else {
                self.copy_file(&source_path, &dest_path, ChangeKind::Copied, pass);
            }
        }

        Ok(())
    }

    /// Children of a source directory, classified; skipped symlinks are left out
    fn list_source(&self, source_dir: &Path, pass: &mut Pass<'_>) -> Result<Listing> {
        let mut listing = Listing::new();
        for entry in fs::read_dir(source_dir).with_path(source_dir)? {
            let entry = entry.with_path(source_dir)?;
            let path = entry.path();
            let file_type = entry.file_type().with_path(&path)?;

            let kind = match EntryKind::of(file_type) {
                EntryKind::Symlink if self.options.follow_symlinks => {
                    match fs::metadata(&path) {
                        Ok(target) => EntryKind::of(target.file_type()),
                        Err(e) => {
                            pass.skip(&path, Error::io(&path, e.to_string()));
                            continue;
                        }
                    }
                }
                EntryKind::Symlink => {
                    debug!("Skipping symlink: {}", path.display());
                    continue;
                }
                kind => kind,
            };

            if kind == EntryKind::Other {
                debug!("Skipping special file: {}", path.display());
                continue;
            }
            listing.insert(entry.file_name(), kind);
        }
        Ok(listing)
    }

    /// Children of a destination directory; empty when it does not exist (dry runs)
    fn list_destination(dest_dir: &Path) -> Result<Listing> {
        let mut listing = Listing::new();
        match fs::symlink_metadata(dest_dir) {
            Ok(metadata) if metadata.is_dir() => {}
            Ok(_) => return Ok(listing),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(listing),
            Err(e) => return Err(Error::io(dest_dir, e.to_string())),
        }

        for entry in fs::read_dir(dest_dir).with_path(dest_dir)? {
            let entry = entry.with_path(dest_dir)?;
            let file_type = entry.file_type().with_path(entry.path())?;
            listing.insert(entry.file_name(), EntryKind::of(file_type));
        }
        Ok(listing)
    }

    /// Compare digests and overwrite the destination when they differ
    fn update_file(&mut self, source: &Path, destination: &Path, pass: &mut Pass<'_>) {
        let source_digest = match self.digest_of(source) {
            Ok(digest) => digest,
            Err(e) => return pass.skip(source, e),
        };
        let dest_digest = match self.digest_of(destination) {
            Ok(digest) => digest,
            Err(e) => return pass.skip(destination, e),
        };

        if source_digest == dest_digest {
            trace!("Unchanged: {}", destination.display());
            pass.report.stats.files_unchanged += 1;
            return;
        }

        debug!(
            "Digest mismatch for {}: {} != {}",
            destination.display(),
            source_digest,
            dest_digest
        );
        self.copy_file(source, destination, ChangeKind::Updated, pass);
    }

    /// Copy contents (and mtime) and record the change as `kind`
    fn copy_file(
        &mut self,
        source: &Path,
        destination: &Path,
        kind: ChangeKind,
        pass: &mut Pass<'_>,
    ) {
        if self.options.dry_run {
            debug!(
                "DRY RUN: Would copy {} -> {}",
                source.display(),
                destination.display()
            );
            pass.record(kind, destination);
            return;
        }

        match self.copy_contents(source, destination) {
            Ok(bytes) => {
                pass.report.stats.bytes_copied += bytes;
                pass.record(kind, destination);
            }
            Err(e) => pass.skip(destination, e),
        }
    }

    fn copy_contents(&mut self, source: &Path, destination: &Path) -> Result<u64> {
        if let Some(cache) = &mut self.cache {
            cache.invalidate(destination);
        }

        let bytes = fs::copy(source, destination).map_err(|e| {
            Error::io(
                destination,
                format!("Failed to copy from '{}': {}", source.display(), e),
            )
        })?;

        if self.options.preserve_timestamps {
            let metadata = fs::metadata(source).with_path(source)?;
            filetime::set_file_times(
                destination,
                FileTime::from_last_access_time(&metadata),
                FileTime::from_last_modification_time(&metadata),
            )
            .map_err(|e| {
                Error::io(
                    destination,
                    format!("Failed to set modification time: {}", e),
                )
            })?;
        }

        trace!(
            "Copied {} bytes: {} -> {}",
            bytes,
            source.display(),
            destination.display()
        );
        Ok(bytes)
    }

    /// Delete a destination entry of the given kind
    fn remove_entry(&mut self, path: &Path, kind: EntryKind) -> Result<()> {
        if self.options.dry_run {
            debug!("DRY RUN: Would delete {}", path.display());
            return Ok(());
        }

        match kind {
            EntryKind::Directory => fs::remove_dir_all(path),
            _ => fs::remove_file(path),
        }
        .with_path(path)?;

        if let Some(cache) = &mut self.cache {
            cache.invalidate(path);
        }
        debug!("Deleted: {}", path.display());
        Ok(())
    }

    fn digest_of(&mut self, path: &Path) -> Result<Digest> {
        let Some(cache) = &mut self.cache else {
            return self.hasher.digest(path);
        };

        let metadata = fs::metadata(path).with_path(path)?;
        let modified = metadata.modified().with_path(path)?;
        if let Some(digest) = cache.get(path, metadata.len(), modified) {
            return Ok(digest);
        }

        let digest = self.hasher.digest(path)?;
        cache.insert(path, metadata.len(), modified, digest.clone());
        Ok(digest)
    }
}

fn is_symlink(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok_and(|metadata| metadata.file_type().is_symlink())
}

/// Relative paths of every entry under `root`, for comparing trees
pub fn relative_entries(root: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = Vec::new();
    for entry in WalkDir::new(root).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            Error::io(path, e.to_string())
        })?;
        if let Ok(relative) = entry.path().strip_prefix(root) {
            entries.push(relative.to_path_buf());
        }
    }
    Ok(entries)
}
