//! Domain entities
//!
//! This module contains the core domain types for gdsync:
//! - Newtypes for validated identifiers and checksums
//! - Snapshots and changes observed on either side of a sync
//! - Conflict records produced by reconciliation
//! - Baseline entries describing the last agreed state
//! - Scan results and identities reserved for files not yet synced
//! - Domain-specific error types

pub mod baseline;
pub mod change;
pub mod conflict;
pub mod errors;
pub mod newtypes;
pub mod scan;

// Re-export commonly used types
pub use baseline::BaselineEntry;
pub use change::{Change, ChangeKind, FileSnapshot};
pub use conflict::ConflictRecord;
pub use errors::{DomainError, OracleError};
pub use newtypes::*;
pub use scan::{LocalScan, PendingIdentity, PostponedFile};
