//! In-memory state stores

use dashmap::DashMap;
use gdsync_core::{
    domain::{BaselineEntry, FileIdentity, PendingIdentity},
    ports::{IBaselineStore, IPendingIdentityStore},
};

/// Baseline kept in a `DashMap`; nothing survives the process
#[derive(Debug, Default)]
pub struct InMemoryBaselineStore {
    entries: DashMap<FileIdentity, BaselineEntry>,
}

impl InMemoryBaselineStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-filled with `entries`
    pub fn with_entries(entries: impl IntoIterator<Item = BaselineEntry>) -> Self {
        let store = Self::new();
        for entry in entries {
            store.entries.insert(entry.identity().clone(), entry);
        }
        store
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait::async_trait]
impl IBaselineStore for InMemoryBaselineStore {
    async fn get(&self, identity: &FileIdentity) -> anyhow::Result<Option<BaselineEntry>> {
        Ok(self.entries.get(identity).map(|e| e.value().clone()))
    }

    async fn list(&self) -> anyhow::Result<Vec<BaselineEntry>> {
        let mut entries: Vec<BaselineEntry> =
            self.entries.iter().map(|e| e.value().clone()).collect();
        entries.sort_by(|a, b| a.path().cmp(b.path()));
        Ok(entries)
    }

    async fn upsert(&self, entry: &BaselineEntry) -> anyhow::Result<()> {
        self.entries.insert(entry.identity().clone(), entry.clone());
        Ok(())
    }

    async fn remove(&self, identity: &FileIdentity) -> anyhow::Result<()> {
        self.entries.remove(identity);
        Ok(())
    }
}

/// Identity reservations kept in a `DashMap`
#[derive(Debug, Default)]
pub struct InMemoryPendingIdentityStore {
    reserved: DashMap<FileIdentity, PendingIdentity>,
}

impl InMemoryPendingIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.reserved.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reserved.is_empty()
    }
}

#[async_trait::async_trait]
impl IPendingIdentityStore for InMemoryPendingIdentityStore {
    async fn get(&self, identity: &FileIdentity) -> anyhow::Result<Option<PendingIdentity>> {
        Ok(self.reserved.get(identity).map(|p| p.value().clone()))
    }

    async fn list(&self) -> anyhow::Result<Vec<PendingIdentity>> {
        let mut reserved: Vec<PendingIdentity> =
            self.reserved.iter().map(|p| p.value().clone()).collect();
        reserved.sort_by(|a, b| a.path().cmp(b.path()));
        Ok(reserved)
    }

    async fn reserve(&self, pending: &PendingIdentity) -> anyhow::Result<()> {
        // One reservation per path
        self.reserved.retain(|_, p| p.path() != pending.path());
        self.reserved.insert(pending.identity().clone(), pending.clone());
        Ok(())
    }

    async fn release(&self, identity: &FileIdentity) -> anyhow::Result<()> {
        self.reserved.remove(identity);
        Ok(())
    }
}
