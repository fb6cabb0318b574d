//! Conflict domain entities
//!
//! A [`ConflictRecord`] pairs a local change with the incompatible remote
//! change observed for the same identity. Records are keyed by identity:
//! at most one open record exists per file.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{change::Change, newtypes::FileIdentity};

/// A detected conflict between a local and a remote change
///
/// The reconciliation engine creates these and never deletes them.
/// Resolution is an external act that removes or supersedes the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictRecord {
    /// The change observed in the local tree
    local_change: Change,
    /// The change the oracle reported for the remote copy
    remote_change: Change,
    /// When the conflict was detected
    detected_at: DateTime<Utc>,
}

impl ConflictRecord {
    /// Creates a new conflict record stamped with the current time
    ///
    /// # Example
    ///
    /// ```
    /// use gdsync_core::domain::{Change, ChangeKind, Checksum, ConflictRecord, FileIdentity, FileSnapshot};
    /// use chrono::Utc;
    ///
    /// let id = FileIdentity::new("f1").unwrap();
    /// let local = Change::modified(FileSnapshot::new(id.clone(), Checksum::new("abc").unwrap(), Utc::now()));
    /// let remote = Change::modified(FileSnapshot::new(id, Checksum::new("xyz").unwrap(), Utc::now()));
    ///
    /// let record = ConflictRecord::new(local, remote);
    /// assert_eq!(record.identity().as_str(), "f1");
    /// assert_eq!(record.remote_change().kind(), ChangeKind::Modified);
    /// ```
    pub fn new(local_change: Change, remote_change: Change) -> Self {
        Self::at(local_change, remote_change, Utc::now())
    }

    /// Creates a conflict record with an explicit detection time
    pub fn at(local_change: Change, remote_change: Change, detected_at: DateTime<Utc>) -> Self {
        Self {
            local_change,
            remote_change,
            detected_at,
        }
    }

    /// Returns the identity the record is keyed by (the local change's)
    pub fn identity(&self) -> &FileIdentity {
        self.local_change.identity()
    }

    /// Returns the local side of the conflict
    pub fn local_change(&self) -> &Change {
        &self.local_change
    }

    /// Returns the remote side of the conflict
    pub fn remote_change(&self) -> &Change {
        &self.remote_change
    }

    /// Returns when the conflict was detected
    pub fn detected_at(&self) -> DateTime<Utc> {
        self.detected_at
    }
}
