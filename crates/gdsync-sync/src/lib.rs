//! gdsync Sync - Synchronization driver
//!
//! Provides:
//! - The pass driver: scan, reconcile, propagate, advance the baseline
//! - The local tree scanner diffing the sync root against the baseline
//! - In-memory baseline and identity stores for ephemeral runs and tests
//!
//! ## Modules
//!
//! - [`driver`] - [`SyncDriver`] and its [`PassReport`]
//! - [`scanner`] - [`LocalTreeScanner`] (`ILocalScanner`, SHA-256)
//! - [`memory`] - [`InMemoryBaselineStore`], [`InMemoryPendingIdentityStore`]

pub mod driver;
pub mod memory;
pub mod scanner;

pub use driver::{ConflictedChange, DriverOptions, FailedChange, PassReport, SyncDriver};
pub use memory::{InMemoryBaselineStore, InMemoryPendingIdentityStore};
pub use scanner::LocalTreeScanner;

use thiserror::Error;

/// Errors that abort a whole synchronization pass
///
/// Failures of individual changes never abort a pass; they are reported in
/// the [`PassReport`].
#[derive(Debug, Error)]
pub enum SyncError {
    /// The local tree could not be scanned
    #[error("Local scan failed: {0:#}")]
    Scan(#[source] anyhow::Error),

    /// A reconciliation worker stopped unexpectedly
    #[error("Worker failed: {0}")]
    Worker(String),
}
