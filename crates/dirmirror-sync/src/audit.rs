//! Append-only audit log
//!
//! One line per event: `<timestamp>: <message>`. Every line is optionally
//! echoed to stdout as well.

use crate::reconcile::ChangeReporter;
use chrono::{DateTime, Local};
use dirmirror_types::{ChangeRecord, Error, IoResultExt, Result};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::error;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Render a timestamp the way audit lines carry it
pub fn format_timestamp(timestamp: &DateTime<Local>) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

/// Append-only text log of everything the driver did
#[derive(Debug, Clone)]
pub struct AuditLog {
    path: PathBuf,
    echo: bool,
}

impl AuditLog {
    /// Log to `path`, echoing each line to stdout
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            echo: true,
        }
    }

    /// Enable or disable the stdout echo
    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    /// Path of the log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the parent directory if needed and check the file is writable
    pub fn open(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_path(parent)?;
            }
        }
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_path(&self.path)?;
        Ok(())
    }

    /// Append a message stamped with the current time
    pub fn append(&self, message: &str) -> Result<()> {
        self.append_at(&Local::now(), message)
    }

    /// Append a message with an explicit timestamp
    pub fn append_at(&self, timestamp: &DateTime<Local>, message: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_path(&self.path)?;
        writeln!(file, "{}: {}", format_timestamp(timestamp), message).with_path(&self.path)?;

        if self.echo {
            println!("{}", message);
        }
        Ok(())
    }

    /// Append a change record using its own timestamp
    pub fn record(&self, record: &ChangeRecord) -> Result<()> {
        self.append_at(&record.timestamp, &record.message())
    }

    /// Startup line
    pub fn started(&self, source: &Path, destination: &Path) -> Result<()> {
        self.append(&format!(
            "Started: {} -> {}",
            source.display(),
            destination.display()
        ))
    }

    /// The destination root did not exist and was created
    pub fn created_destination(&self, destination: &Path) -> Result<()> {
        self.append(&format!(
            "Created destination folder: {}",
            destination.display()
        ))
    }

    /// A whole pass was aborted
    pub fn pass_failed(&self, error: &Error) -> Result<()> {
        self.append(&format!("Pass failed: {}", error))
    }

    /// The driver stopped
    pub fn terminated(&self) -> Result<()> {
        self.append("Terminated")
    }
}

impl ChangeReporter for AuditLog {
    fn report(&mut self, record: &ChangeRecord) {
        if let Err(e) = self.record(record) {
            error!("Failed to write audit log '{}': {}", self.path.display(), e);
        }
    }
}
