//! Periodic driver: one reconciliation pass per interval until stopped

use crate::audit::AuditLog;
use crate::reconcile::TreeReconciler;
use dirmirror_config::SyncConfig;
use dirmirror_types::{Error, Result, SyncReport, SyncStats};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Totals over every pass the driver ran
#[derive(Debug, Clone, Default)]
pub struct DriverSummary {
    /// Passes started
    pub passes: u64,
    /// Passes aborted by a pass-level error
    pub failed_passes: u64,
    /// Statistics summed over all completed passes
    pub stats: SyncStats,
}

/// Everything a pass needs, moved onto a blocking thread and back
struct PassWorker {
    reconciler: TreeReconciler,
    audit: AuditLog,
    source: PathBuf,
    destination: PathBuf,
}

impl PassWorker {
    fn run_pass(&mut self) -> Result<SyncReport> {
        self.reconciler
            .sync(&self.source, &self.destination, &mut self.audit)
    }
}

/// Runs [`TreeReconciler`] passes on a fixed interval
#[derive(Debug)]
pub struct SyncDriver {
    config: SyncConfig,
    reconciler: TreeReconciler,
    audit: AuditLog,
}

impl SyncDriver {
    /// Create a driver writing its audit log to the configured file
    pub fn new(config: SyncConfig) -> Self {
        let reconciler = TreeReconciler::from_config(&config);
        let audit = AuditLog::new(&config.log_file);
        Self {
            config,
            reconciler,
            audit,
        }
    }

    /// Replace the audit log (e.g. to disable the stdout echo)
    pub fn with_audit_log(mut self, audit: AuditLog) -> Self {
        self.audit = audit;
        self
    }

    /// Configuration in use
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Write the startup lines and create the destination root if absent
    pub fn prepare(&self) -> Result<()> {
        self.audit.open()?;
        self.audit
            .started(&self.config.source, &self.config.destination)?;

        let destination = &self.config.destination;
        if destination.exists() {
            return Ok(());
        }
        if self.config.options.dry_run {
            info!(
                "DRY RUN: Destination folder would be created: {}",
                destination.display()
            );
            return Ok(());
        }

        fs::create_dir_all(destination).map_err(|e| {
            Error::startup(format!(
                "Failed to create destination folder '{}': {}",
                destination.display(),
                e
            ))
        })?;
        self.audit.created_destination(destination)?;
        Ok(())
    }

    /// Run until `token` is cancelled or `max_passes` is reached
    pub async fn run(self, token: CancellationToken) -> Result<DriverSummary> {
        self.run_with(token, |_, _| {}).await
    }

    /// Like [`run`](Self::run), calling `on_pass(pass_number, outcome)` after every pass
    ///
    /// The stop signal is only honored between passes; a pass that has
    /// started always runs to completion.
    pub async fn run_with<F>(self, token: CancellationToken, mut on_pass: F) -> Result<DriverSummary>
    where
        F: FnMut(u64, &Result<SyncReport>),
    {
        self.prepare()?;

        let interval = self.config.interval.get();
        let max_passes = self.config.max_passes;
        let mut worker = PassWorker {
            reconciler: self.reconciler,
            audit: self.audit,
            source: self.config.source,
            destination: self.config.destination,
        };
        let mut summary = DriverSummary::default();

        loop {
            summary.passes += 1;
            let pass_number = summary.passes;
            debug!("Starting pass #{}", pass_number);

            let (returned, outcome) = tokio::task::spawn_blocking(move || {
                let outcome = worker.run_pass();
                (worker, outcome)
            })
            .await
            .map_err(|e| Error::other(format!("Sync pass #{} panicked: {}", pass_number, e)))?;
            worker = returned;

            match &outcome {
                Ok(report) => {
                    summary.stats.merge(&report.stats);
                    if !report.is_success() {
                        warn!(
                            "Pass #{} skipped {} entries because of errors",
                            pass_number, report.stats.errors
                        );
                    }
                }
                Err(e) => {
                    summary.failed_passes += 1;
                    error!("Pass #{} failed: {}", pass_number, e);
                    if let Err(log_error) = worker.audit.pass_failed(e) {
                        error!("Failed to write audit log: {}", log_error);
                    }
                }
            }
            on_pass(pass_number, &outcome);

            if max_passes.is_some_and(|max| pass_number >= max) {
                info!("Reached {} passes, stopping", pass_number);
                break;
            }
            if wait_for_next_pass(&token, interval).await {
                info!("Stop requested, exiting after pass #{}", pass_number);
                break;
            }
        }

        worker.audit.terminated()?;
        Ok(summary)
    }
}

/// Sleep for `interval`; true when the token was cancelled instead
async fn wait_for_next_pass(token: &CancellationToken, interval: Duration) -> bool {
    tokio::select! {
        () = token.cancelled() => true,
        () = tokio::time::sleep(interval) => token.is_cancelled(),
    }
}
