//! Core type system and error handling for dirmirror
//!
//! This crate provides the foundational types shared by every dirmirror crate:
//!
//! - **Error handling**: startup, per-entry and pass-level error tiers
//! - **Change records**: what a reconciliation pass did to the destination tree
//! - **Statistics**: per-pass counters and the pass-level report
//! - **Configuration**: validated newtypes for chunk sizes and sync intervals
//!
//! # Features
//!
//! - `serde`: Enable serialization support
//!
//! # Examples
//!
//! ```rust
//! use dirmirror_types::{ChangeKind, ChangeRecord, SyncReport};
//!
//! let mut report = SyncReport::new();
//! report.push(ChangeRecord::new(ChangeKind::Copied, "dest/a/b.txt"));
//! assert_eq!(report.stats.files_copied, 1);
//! assert!(report.is_success());
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod result;
pub mod types;

// Re-export commonly used types
pub use config::{ChunkSize, HashAlgorithm, SyncInterval};
pub use error::{Error, ErrorKind, IoResultExt};
pub use result::Result;
pub use types::*;
