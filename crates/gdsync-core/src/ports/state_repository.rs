//! State persistence ports (driven/secondary ports)
//!
//! This module defines the interfaces for persisting conflict records, the
//! sync baseline, and identities reserved for files not yet synced.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because storage errors are adapter-specific
//!   (SQLite, memory) and don't need domain-level classification.
//! - Both stores are keyed by [`FileIdentity`]; `save`/`upsert` replace any
//!   existing entry for the same identity.
//! - Durability beyond the process lifetime is the adapter's concern.

use crate::domain::{BaselineEntry, ConflictRecord, FileIdentity, PendingIdentity};

/// Port trait backing the conflict register
///
/// ## Implementation Notes
///
/// - `save` must replace the open record for the same identity atomically;
///   concurrent `save`/`list_open` calls must be safe.
/// - `list_open` ordering is left to the implementation; the register sorts.
#[async_trait::async_trait]
pub trait IConflictStore: Send + Sync {
    /// Saves a conflict record, replacing any open record for its identity
    async fn save(&self, record: &ConflictRecord) -> anyhow::Result<()>;

    /// Retrieves the open record for an identity
    async fn get(&self, identity: &FileIdentity) -> anyhow::Result<Option<ConflictRecord>>;

    /// Retrieves all open records
    async fn list_open(&self) -> anyhow::Result<Vec<ConflictRecord>>;

    /// Removes the open record for an identity
    ///
    /// Returns `true` if a record was removed.
    async fn remove(&self, identity: &FileIdentity) -> anyhow::Result<bool>;
}

/// Port trait for the sync baseline
#[async_trait::async_trait]
pub trait IBaselineStore: Send + Sync {
    /// Retrieves the baseline entry for an identity
    async fn get(&self, identity: &FileIdentity) -> anyhow::Result<Option<BaselineEntry>>;

    /// Retrieves every baseline entry
    async fn list(&self) -> anyhow::Result<Vec<BaselineEntry>>;

    /// Inserts or replaces the entry for its identity
    async fn upsert(&self, entry: &BaselineEntry) -> anyhow::Result<()>;

    /// Removes the entry for an identity
    async fn remove(&self, identity: &FileIdentity) -> anyhow::Result<()>;
}

/// Port trait for identities reserved for new local files
///
/// A reservation lives from the scan that allocated it until the file
/// reaches the baseline. At most one reservation exists per path.
#[async_trait::async_trait]
pub trait IPendingIdentityStore: Send + Sync {
    /// Retrieves the reservation holding an identity
    async fn get(&self, identity: &FileIdentity) -> anyhow::Result<Option<PendingIdentity>>;

    /// Retrieves every reservation
    async fn list(&self) -> anyhow::Result<Vec<PendingIdentity>>;

    /// Stores a reservation, replacing any other one for the same path
    async fn reserve(&self, pending: &PendingIdentity) -> anyhow::Result<()>;

    /// Drops the reservation holding an identity, if any
    async fn release(&self, identity: &FileIdentity) -> anyhow::Result<()>;
}
