//! Conflict register
//!
//! Durable set of open conflicts, at most one per identity. The
//! reconciliation engine records into it; resolution is an external act
//! (a user command or a future policy) that removes the record.

use std::sync::Arc;

use gdsync_core::{
    domain::{ConflictRecord, FileIdentity},
    ports::IConflictStore,
};
use tracing::{debug, info};

use crate::error::RegisterError;

/// Register of open conflicts backed by an [`IConflictStore`]
///
/// Concurrent `record`/`list_open` calls are safe as long as the backing
/// store is; the driver guarantees a single writer per identity.
pub struct ConflictRegister {
    store: Arc<dyn IConflictStore>,
}

impl ConflictRegister {
    /// Creates a register over the given store
    pub fn new(store: Arc<dyn IConflictStore>) -> Self {
        Self { store }
    }

    /// Records a conflict, replacing any open record for the same identity
    ///
    /// Last detection wins for the record only; it says nothing about how
    /// the conflict will be resolved.
    pub async fn record(&self, conflict: ConflictRecord) -> Result<(), RegisterError> {
        let replaced = self.store.get(conflict.identity()).await?.is_some();
        self.store.save(&conflict).await?;

        info!(
            identity = %conflict.identity(),
            local = %conflict.local_change().kind(),
            remote = %conflict.remote_change().kind(),
            replaced,
            "Conflict recorded"
        );
        Ok(())
    }

    /// Returns the open record for one identity
    pub async fn get(&self, identity: &FileIdentity) -> Result<Option<ConflictRecord>, RegisterError> {
        Ok(self.store.get(identity).await?)
    }

    /// Lists open conflicts, oldest detection first
    ///
    /// Ties are broken by identity so the order is stable.
    pub async fn list_open(&self) -> Result<Vec<ConflictRecord>, RegisterError> {
        let mut records = self.store.list_open().await?;
        records.sort_by(|a, b| {
            a.detected_at()
                .cmp(&b.detected_at())
                .then_with(|| a.identity().cmp(b.identity()))
        });
        debug!(count = records.len(), "Listed open conflicts");
        Ok(records)
    }

    /// Marks the conflict for `identity` as resolved by removing it
    ///
    /// # Errors
    /// Returns `RegisterError::NotFound` if no conflict is open for `identity`
    pub async fn resolve(&self, identity: &FileIdentity) -> Result<(), RegisterError> {
        if !self.store.remove(identity).await? {
            return Err(RegisterError::NotFound(identity.clone()));
        }
        info!(identity = %identity, "Conflict resolved");
        Ok(())
    }
}
