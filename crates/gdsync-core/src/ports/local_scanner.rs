//! Local scanner port (driving side of a sync pass)
//!
//! A scanner compares the local tree against the sync baseline and reports
//! one [`Change`] per file that differs. The sequence is finite and covers a
//! single pass; identities are distinct within it. New files that cannot get
//! an identity are reported as postponed instead of failing the scan.

use crate::domain::LocalScan;

/// Port trait for discovering local changes
#[async_trait::async_trait]
pub trait ILocalScanner: Send + Sync {
    /// Scans the local tree and returns the changes of one pass
    ///
    /// Every returned change has a distinct identity. `Deleted` changes carry
    /// the last known checksum of the removed content.
    ///
    /// # Errors
    /// Only failures that leave nothing to reconcile (unreadable root,
    /// unreadable baseline) are errors.
    async fn scan(&self) -> anyhow::Result<LocalScan>;
}
