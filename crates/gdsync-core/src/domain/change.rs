//! Snapshots and changes
//!
//! A [`FileSnapshot`] is the observed state of one file at one moment, on
//! either side of the sync. A [`Change`] pairs a snapshot with the
//! [`ChangeKind`] describing how it differs from the last agreed baseline.
//! Both types are immutable after construction: they expose accessors only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::newtypes::{Checksum, FileIdentity};

/// How a snapshot differs from its baseline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// No baseline existed; the file is new on this side
    Added,
    /// Content differs from the baseline
    Modified,
    /// The file existed at the baseline and is now gone
    Deleted,
}

impl ChangeKind {
    /// Returns the kind name as a static string
    pub fn name(&self) -> &'static str {
        match self {
            ChangeKind::Added => "added",
            ChangeKind::Modified => "modified",
            ChangeKind::Deleted => "deleted",
        }
    }
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The observed state of a file at one moment
///
/// Two snapshots of the same identity are content-equal iff their checksums
/// match. `path` is descriptive only: the path relative to the sync root for
/// local snapshots, or the remote file name for remote snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSnapshot {
    identity: FileIdentity,
    checksum: Checksum,
    last_modified: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    path: Option<String>,
}

impl FileSnapshot {
    /// Creates a new snapshot
    ///
    /// # Example
    ///
    /// ```
    /// use gdsync_core::domain::{Checksum, FileIdentity, FileSnapshot};
    /// use chrono::Utc;
    ///
    /// let snapshot = FileSnapshot::new(
    ///     FileIdentity::new("f1").unwrap(),
    ///     Checksum::new("abc").unwrap(),
    ///     Utc::now(),
    /// )
    /// .with_path("notes/todo.txt");
    ///
    /// assert_eq!(snapshot.path(), Some("notes/todo.txt"));
    /// ```
    pub fn new(identity: FileIdentity, checksum: Checksum, last_modified: DateTime<Utc>) -> Self {
        Self {
            identity,
            checksum,
            last_modified,
            path: None,
        }
    }

    /// Attaches the descriptive path
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Returns the file identity
    pub fn identity(&self) -> &FileIdentity {
        &self.identity
    }

    /// Returns the content checksum
    pub fn checksum(&self) -> &Checksum {
        &self.checksum
    }

    /// Returns when this version was last modified
    pub fn last_modified(&self) -> DateTime<Utc> {
        self.last_modified
    }

    /// Returns the descriptive path, if known
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Returns true if both snapshots carry the same content
    pub fn content_equals(&self, other: &FileSnapshot) -> bool {
        self.checksum == other.checksum
    }
}

/// A change observed on one side of the sync
///
/// For [`ChangeKind::Deleted`] the snapshot carries the last known checksum
/// of the deleted content, so deletions can still be compared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    kind: ChangeKind,
    snapshot: FileSnapshot,
}

impl Change {
    /// Creates a change of the given kind
    pub fn new(kind: ChangeKind, snapshot: FileSnapshot) -> Self {
        Self { kind, snapshot }
    }

    /// A file that has no baseline on this side
    pub fn added(snapshot: FileSnapshot) -> Self {
        Self::new(ChangeKind::Added, snapshot)
    }

    /// A file whose content diverged from its baseline
    pub fn modified(snapshot: FileSnapshot) -> Self {
        Self::new(ChangeKind::Modified, snapshot)
    }

    /// A file that existed at the baseline and is gone now
    pub fn deleted(snapshot: FileSnapshot) -> Self {
        Self::new(ChangeKind::Deleted, snapshot)
    }

    /// Returns the change kind
    pub fn kind(&self) -> ChangeKind {
        self.kind
    }

    /// Returns the snapshot
    pub fn snapshot(&self) -> &FileSnapshot {
        &self.snapshot
    }

    /// Shortcut for `snapshot().identity()`
    pub fn identity(&self) -> &FileIdentity {
        self.snapshot.identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(id: &str, sum: &str) -> FileSnapshot {
        FileSnapshot::new(
            FileIdentity::new(id).unwrap(),
            Checksum::new(sum).unwrap(),
            Utc::now(),
        )
    }

    #[test]
    fn test_change_kind_display() {
        assert_eq!(ChangeKind::Added.to_string(), "added");
        assert_eq!(ChangeKind::Modified.to_string(), "modified");
        assert_eq!(ChangeKind::Deleted.to_string(), "deleted");
    }

    #[test]
    fn test_change_kind_serialization() {
        let json = serde_json::to_string(&ChangeKind::Deleted).unwrap();
        assert_eq!(json, "\"deleted\"");

        let kind: ChangeKind = serde_json::from_str("\"modified\"").unwrap();
        assert_eq!(kind, ChangeKind::Modified);
    }

    #[test]
    fn test_content_equality_ignores_time_and_path() {
        let a = snapshot("f1", "abc").with_path("a.txt");
        let b = FileSnapshot::new(
            FileIdentity::new("f1").unwrap(),
            Checksum::new("abc").unwrap(),
            Utc::now() - chrono::Duration::hours(1),
        );
        let c = snapshot("f1", "xyz");

        assert!(a.content_equals(&b));
        assert!(!a.content_equals(&c));
    }

    #[test]
    fn test_change_constructors() {
        let s = snapshot("f1", "abc");

        assert_eq!(Change::added(s.clone()).kind(), ChangeKind::Added);
        assert_eq!(Change::modified(s.clone()).kind(), ChangeKind::Modified);

        let deleted = Change::deleted(s.clone());
        assert_eq!(deleted.kind(), ChangeKind::Deleted);
        assert_eq!(deleted.snapshot().checksum().as_str(), "abc");
        assert_eq!(deleted.identity(), s.identity());
    }

    #[test]
    fn test_path_not_serialized_when_absent() {
        let json = serde_json::to_value(snapshot("f1", "abc")).unwrap();
        assert!(json.get("path").is_none());

        let json = serde_json::to_value(snapshot("f1", "abc").with_path("x/y.txt")).unwrap();
        assert_eq!(json["path"], "x/y.txt");
    }

    #[test]
    fn test_change_serialization() {
        let change = Change::modified(snapshot("f2", "def").with_path("doc.md"));
        let json = serde_json::to_string(&change).unwrap();
        let parsed: Change = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, change);
    }
}
