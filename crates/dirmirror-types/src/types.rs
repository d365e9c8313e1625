//! Core data types for dirmirror
//!
//! Change records describe a single action taken on the destination tree;
//! statistics and reports aggregate them per reconciliation pass.

use chrono::{DateTime, Local};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Kind of action a reconciliation pass took for one entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ChangeKind {
    /// File was absent from the destination and has been copied
    Copied,
    /// File content differed and the destination copy was overwritten
    Updated,
    /// Entry had no source counterpart and was removed
    Deleted,
    /// Entry could not be processed; the pass moved on
    SkippedWithError,
    /// The destination root was missing and has been recreated
    CreatedDestination,
}

impl ChangeKind {
    /// Label used in the audit log
    pub fn label(self) -> &'static str {
        match self {
            Self::Copied => "Copied",
            Self::Updated => "Updated",
            Self::Deleted => "Deleted",
            Self::SkippedWithError => "Skipped with error",
            Self::CreatedDestination => "Created destination folder",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One action reported by a reconciliation pass
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ChangeRecord {
    /// When the action happened
    pub timestamp: DateTime<Local>,
    /// What happened
    pub kind: ChangeKind,
    /// Path acted on (destination path, or source path for walk errors)
    pub path: PathBuf,
    /// Error text for skipped entries
    pub detail: Option<String>,
}

impl ChangeRecord {
    /// Create a record stamped with the current local time
    pub fn new<P: AsRef<Path>>(kind: ChangeKind, path: P) -> Self {
        Self {
            timestamp: Local::now(),
            kind,
            path: path.as_ref().to_path_buf(),
            detail: None,
        }
    }

    /// Create a `SkippedWithError` record
    pub fn skipped<P: AsRef<Path>>(path: P, error: impl fmt::Display) -> Self {
        Self {
            detail: Some(error.to_string()),
            ..Self::new(ChangeKind::SkippedWithError, path)
        }
    }

    /// Audit log message without the timestamp prefix
    pub fn message(&self) -> String {
        match &self.detail {
            Some(detail) => format!("{}: {}: {}", self.kind, self.path.display(), detail),
            None => format!("{}: {}", self.kind, self.path.display()),
        }
    }
}

/// Counters for one reconciliation pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SyncStats {
    /// Files copied because they were missing
    pub files_copied: u64,
    /// Files overwritten because their digest differed
    pub files_updated: u64,
    /// Files and directories removed from the destination
    pub entries_deleted: u64,
    /// Directories created under the destination root
    pub directories_created: u64,
    /// Files whose digests matched
    pub files_unchanged: u64,
    /// Bytes written by copies and updates
    pub bytes_copied: u64,
    /// Entries skipped because of an error
    pub errors: u64,
    /// Wall time of the pass
    pub duration: Duration,
}

impl SyncStats {
    /// Create a new empty statistics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of modifications made to the destination
    pub fn changes(&self) -> u64 {
        self.files_copied + self.files_updated + self.entries_deleted
    }

    /// Merge statistics from another instance
    pub fn merge(&mut self, other: &SyncStats) {
        self.files_copied += other.files_copied;
        self.files_updated += other.files_updated;
        self.entries_deleted += other.entries_deleted;
        self.directories_created += other.directories_created;
        self.files_unchanged += other.files_unchanged;
        self.bytes_copied += other.bytes_copied;
        self.errors += other.errors;
        self.duration += other.duration;
    }
}

/// Outcome of one reconciliation pass
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SyncReport {
    /// Every action in the order it was taken
    pub records: Vec<ChangeRecord>,
    /// Aggregated counters
    pub stats: SyncStats,
}

impl SyncReport {
    /// Create an empty report
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record and update the matching counter
    pub fn push(&mut self, record: ChangeRecord) {
        match record.kind {
            ChangeKind::Copied => self.stats.files_copied += 1,
            ChangeKind::Updated => self.stats.files_updated += 1,
            ChangeKind::Deleted => self.stats.entries_deleted += 1,
            ChangeKind::SkippedWithError => self.stats.errors += 1,
            ChangeKind::CreatedDestination => self.stats.directories_created += 1,
        }
        self.records.push(record);
    }

    /// True when no entry was skipped because of an error
    pub fn is_success(&self) -> bool {
        self.stats.errors == 0
    }

    /// True when the pass neither changed anything nor hit an error
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records of a given kind
    pub fn records_of(&self, kind: ChangeKind) -> impl Iterator<Item = &ChangeRecord> {
        self.records.iter().filter(move |r| r.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_message_format() {
        let record = ChangeRecord::new(ChangeKind::Copied, "dest/a/b.txt");
        assert_eq!(record.message(), "Copied: dest/a/b.txt");

        let skipped = ChangeRecord::skipped("dest/c.txt", "permission denied");
        assert_eq!(
            skipped.message(),
            "Skipped with error: dest/c.txt: permission denied"
        );

        let created = ChangeRecord::new(ChangeKind::CreatedDestination, "dest");
        assert_eq!(created.message(), "Created destination folder: dest");
    }

    #[test]
    fn test_report_counts_by_kind() {
        let mut report = SyncReport::new();
        report.push(ChangeRecord::new(ChangeKind::Copied, "a"));
        report.push(ChangeRecord::new(ChangeKind::Updated, "b"));
        report.push(ChangeRecord::new(ChangeKind::Deleted, "c"));
        report.push(ChangeRecord::skipped("d", "boom"));
        report.push(ChangeRecord::new(ChangeKind::CreatedDestination, "e"));

        assert_eq!(report.stats.files_copied, 1);
        assert_eq!(report.stats.directories_created, 1);
        assert_eq!(report.stats.files_updated, 1);
        assert_eq!(report.stats.entries_deleted, 1);
        assert_eq!(report.stats.errors, 1);
        assert!(!report.is_success());
        assert_eq!(report.records_of(ChangeKind::Deleted).count(), 1);
    }

    #[test]
    fn test_empty_report_is_success() {
        let report = SyncReport::new();
        assert!(report.is_empty());
        assert!(report.is_success());
    }
}
