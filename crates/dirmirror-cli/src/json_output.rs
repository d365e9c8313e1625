//! JSON output structures for the dirmirror CLI

use dirmirror_types::{ChangeRecord, Result, SyncReport, SyncStats};
use serde::Serialize;
use tracing::error;

/// One line of `--json` output, emitted after every pass
#[derive(Debug, Serialize)]
pub struct PassResultJson {
    /// Pass number, starting at 1
    pub pass: u64,
    /// When the pass finished
    pub timestamp: String,
    /// False when the pass aborted or skipped entries
    pub success: bool,
    /// Pass-level error, if the pass aborted
    pub error: Option<String>,
    /// Counters for this pass
    pub stats: PassStatsJson,
    /// Changes applied during this pass
    pub changes: Vec<ChangeRecord>,
}

/// Pass statistics in JSON format
#[derive(Debug, Default, Serialize)]
pub struct PassStatsJson {
    pub files_copied: u64,
    pub files_updated: u64,
    pub entries_deleted: u64,
    pub directories_created: u64,
    pub files_unchanged: u64,
    pub bytes_copied: u64,
    pub errors: u64,
    pub duration_ms: f64,
}

impl From<&SyncStats> for PassStatsJson {
    fn from(stats: &SyncStats) -> Self {
        Self {
            files_copied: stats.files_copied,
            files_updated: stats.files_updated,
            entries_deleted: stats.entries_deleted,
            directories_created: stats.directories_created,
            files_unchanged: stats.files_unchanged,
            bytes_copied: stats.bytes_copied,
            errors: stats.errors,
            duration_ms: stats.duration.as_secs_f64() * 1000.0,
        }
    }
}

impl PassResultJson {
    pub fn new(pass: u64, outcome: &Result<SyncReport>) -> Self {
        let timestamp = chrono::Local::now().to_rfc3339();
        match outcome {
            Ok(report) => Self {
                pass,
                timestamp,
                success: report.is_success(),
                error: None,
                stats: PassStatsJson::from(&report.stats),
                changes: report.records.clone(),
            },
            Err(e) => Self {
                pass,
                timestamp,
                success: false,
                error: Some(e.to_string()),
                stats: PassStatsJson::default(),
                changes: Vec::new(),
            },
        }
    }
}

pub fn print_pass(pass: u64, outcome: &Result<SyncReport>) {
    match serde_json::to_string(&PassResultJson::new(pass, outcome)) {
        Ok(line) => println!("{}", line),
        Err(e) => error!("Failed to serialize pass #{}: {}", pass, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dirmirror_types::{ChangeKind, Error};

    #[test]
    fn test_successful_pass_json() {
        let mut report = SyncReport::new();
        report.push(ChangeRecord::new(ChangeKind::Copied, "/dst/a.txt"));

        let json = serde_json::to_value(PassResultJson::new(3, &Ok(report))).unwrap();

        assert_eq!(json["pass"], 3);
        assert_eq!(json["success"], true);
        assert!(json["error"].is_null());
        assert_eq!(json["stats"]["files_copied"], 1);
        assert_eq!(json["changes"][0]["kind"], "copied");
    }

    #[test]
    fn test_failed_pass_json() {
        let outcome = Err(Error::filesystem_state("source folder vanished"));

        let json = serde_json::to_value(PassResultJson::new(1, &outcome)).unwrap();

        assert_eq!(json["success"], false);
        assert!(json["error"]
            .as_str()
            .unwrap()
            .contains("source folder vanished"));
        assert_eq!(json["changes"].as_array().unwrap().len(), 0);
    }
}
