//! One-way directory mirroring for dirmirror
//!
//! This crate keeps a destination tree identical to a source tree:
//!
//! - **Content Hashing**: files are compared by digest, never by timestamp
//! - **Tree Reconciliation**: a top-down walk that copies, updates and deletes
//! - **Audit Log**: every change is appended to a plain text log
//! - **Periodic Driver**: repeats the reconciliation on a fixed interval until stopped
//!
//! # Examples
//!
//! ```rust,no_run
//! use dirmirror_sync::{ContentHasher, TreeReconciler};
//! use dirmirror_config::SyncOptions;
//! use std::path::Path;
//!
//! # fn example() -> dirmirror_types::Result<()> {
//! let mut reconciler = TreeReconciler::new(ContentHasher::default(), SyncOptions::default());
//! let report = reconciler.sync(Path::new("source_dir"), Path::new("dest_dir"), &mut ())?;
//! println!(
//!     "{} copied, {} updated, {} deleted",
//!     report.stats.files_copied, report.stats.files_updated, report.stats.entries_deleted
//! );
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod audit;
pub mod cache;
pub mod driver;
pub mod hash;
pub mod reconcile;

pub use audit::AuditLog;
pub use cache::{CacheEntry, CacheStats, DigestCache};
pub use driver::{DriverSummary, SyncDriver};
pub use hash::{ContentHasher, Digest};
pub use reconcile::{relative_entries, ChangeReporter, TreeReconciler};
pub use tokio_util::sync::CancellationToken;
