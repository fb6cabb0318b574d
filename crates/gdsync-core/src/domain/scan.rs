//! Local scan results
//!
//! A file seen locally for the first time has no remote identity yet. The
//! scanner reserves one and keeps it as a [`PendingIdentity`] until the
//! driver commits the file to the baseline, so a retried upload reuses the
//! same identity instead of creating a second remote file.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    baseline::validate_relative_path, change::Change, errors::DomainError,
    newtypes::FileIdentity,
};

/// A remote identity reserved for a local path not yet in the baseline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingIdentity {
    path: String,
    identity: FileIdentity,
    reserved_at: DateTime<Utc>,
}

impl PendingIdentity {
    /// # Errors
    /// Returns `DomainError::InvalidPath` for a path that is not relative
    /// to the sync root
    pub fn new(path: impl Into<String>, identity: FileIdentity) -> Result<Self, DomainError> {
        let path = path.into();
        validate_relative_path(&path)?;
        Ok(Self {
            path,
            identity,
            reserved_at: Utc::now(),
        })
    }

    /// Overrides the reservation time (used when loading from storage)
    pub fn with_reserved_at(mut self, reserved_at: DateTime<Utc>) -> Self {
        self.reserved_at = reserved_at;
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn identity(&self) -> &FileIdentity {
        &self.identity
    }

    pub fn reserved_at(&self) -> DateTime<Utc> {
        self.reserved_at
    }
}

/// A new local file left for a later pass because it got no identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostponedFile {
    /// Path relative to the sync root
    pub path: String,
    pub reason: String,
}

/// Everything one scan found
#[derive(Debug, Clone, Default, Serialize)]
pub struct LocalScan {
    /// Changes to reconcile, identities distinct
    pub changes: Vec<Change>,
    /// New files that could not be turned into changes this time
    pub postponed: Vec<PostponedFile>,
}

impl From<Vec<Change>> for LocalScan {
    fn from(changes: Vec<Change>) -> Self {
        Self {
            changes,
            postponed: Vec::new(),
        }
    }
}
