//! dirmirror integration test suite
//!
//! Shared fixtures live in [`test_utils`]; the scenarios themselves are in
//! `tests/integration_tests.rs`.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Unified test utilities
///
/// Temporary source/destination layouts and helpers to compare trees.
pub mod test_utils;
