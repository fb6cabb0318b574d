//! Sync baseline
//!
//! The baseline is the last snapshot both sides are known to have agreed on.
//! The local scanner diffs the tree against it, the remote oracle diffs the
//! remote copy against it, and the driver advances it after a successful
//! propagation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    change::FileSnapshot,
    errors::DomainError,
    newtypes::FileIdentity,
};

/// The last agreed state of one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaselineEntry {
    /// Path relative to the sync root, `/`-separated
    path: String,
    /// Agreed snapshot (its `path` mirrors the field above)
    snapshot: FileSnapshot,
    /// When the baseline was last advanced
    synced_at: DateTime<Utc>,
}

impl BaselineEntry {
    /// Creates a baseline entry for a relative path
    ///
    /// # Errors
    /// Returns `DomainError::InvalidPath` if the path is empty, absolute,
    /// or escapes the sync root through `..`
    pub fn new(path: impl Into<String>, snapshot: FileSnapshot) -> Result<Self, DomainError> {
        let path = path.into();
        validate_relative_path(&path)?;

        Ok(Self {
            snapshot: snapshot.with_path(path.clone()),
            path,
            synced_at: Utc::now(),
        })
    }

    /// Overrides the sync timestamp (used when loading from storage)
    pub fn with_synced_at(mut self, synced_at: DateTime<Utc>) -> Self {
        self.synced_at = synced_at;
        self
    }

    /// Returns the identity of the file
    pub fn identity(&self) -> &FileIdentity {
        self.snapshot.identity()
    }

    /// Returns the relative path
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the agreed snapshot
    pub fn snapshot(&self) -> &FileSnapshot {
        &self.snapshot
    }

    /// Returns when the baseline was last advanced
    pub fn synced_at(&self) -> DateTime<Utc> {
        self.synced_at
    }
}

/// Validates a `/`-separated path relative to the sync root
pub fn validate_relative_path(path: &str) -> Result<(), DomainError> {
    if path.is_empty() {
        return Err(DomainError::InvalidPath("Path cannot be empty".to_string()));
    }
    if path.starts_with('/') || path.contains('\\') {
        return Err(DomainError::InvalidPath(format!(
            "Path must be relative and '/'-separated: {path}"
        )));
    }
    if path.split('/').any(|c| c.is_empty() || c == "." || c == "..") {
        return Err(DomainError::InvalidPath(format!(
            "Path contains an empty, '.' or '..' component: {path}"
        )));
    }
    Ok(())
}
