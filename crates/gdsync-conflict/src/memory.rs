//! In-memory conflict store
//!
//! A `DashMap`-backed [`IConflictStore`]. Sharded locking gives the
//! per-identity mutual exclusion the register needs without a global lock.
//! Nothing survives the process.

use dashmap::DashMap;
use gdsync_core::{
    domain::{ConflictRecord, FileIdentity},
    ports::IConflictStore,
};

/// Conflict store that keeps open records in memory
#[derive(Debug, Default)]
pub struct InMemoryConflictStore {
    records: DashMap<FileIdentity, ConflictRecord>,
}

impl InMemoryConflictStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of open records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if no record is open
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait::async_trait]
impl IConflictStore for InMemoryConflictStore {
    async fn save(&self, record: &ConflictRecord) -> anyhow::Result<()> {
        self.records
            .insert(record.identity().clone(), record.clone());
        Ok(())
    }

    async fn get(&self, identity: &FileIdentity) -> anyhow::Result<Option<ConflictRecord>> {
        Ok(self.records.get(identity).map(|r| r.value().clone()))
    }

    async fn list_open(&self) -> anyhow::Result<Vec<ConflictRecord>> {
        Ok(self.records.iter().map(|r| r.value().clone()).collect())
    }

    async fn remove(&self, identity: &FileIdentity) -> anyhow::Result<bool> {
        Ok(self.records.remove(identity).is_some())
    }
}
