//! Remote store ports (driven/secondary ports)
//!
//! This module defines the interfaces used to talk to the remote file store.
//! The primary implementation targets Google Drive v3, but nothing here is
//! Drive-specific.
//!
//! ## Design Notes
//!
//! - [`IRemoteOracle`] returns a classified [`OracleError`] because the
//!   reconciliation engine must distinguish a transient outage from an
//!   unusable answer.
//! - [`IRemoteWriter`] and [`IIdentityAllocator`] use `anyhow::Result`:
//!   their failures are adapter-specific and only ever mean "try again on
//!   the next pass".
//! - Implementations receive an already-authorized transport; credential
//!   lifecycle is not part of these contracts.

use crate::domain::{Change, FileIdentity, FileSnapshot, OracleError};

/// Port trait answering "what, if anything, changed remotely since baseline"
///
/// ## Contract
///
/// - `Ok(None)`: the remote copy is unchanged since the last sync baseline.
/// - `Ok(Some(change))`: how the remote copy diverged from that baseline.
/// - `Err(OracleError::RemoteUnavailable)`: network or authorization failure.
///
/// Results reflect the remote state at query time. Callers must not assume
/// two calls for the same identity return the same answer. Queries are
/// read-only against the remote service.
#[async_trait::async_trait]
pub trait IRemoteOracle: Send + Sync {
    /// Queries the remote state for the identity of `local`
    ///
    /// # Arguments
    /// * `local` - The local snapshot; only its identity is used to look up
    ///   the remote copy and the baseline
    async fn query_remote_change(&self, local: &FileSnapshot)
        -> Result<Option<Change>, OracleError>;
}

/// Port trait for applying a local change to the remote store
///
/// Re-invoking `propagate` for the same change must be safe: delivery is
/// at-least-once.
#[async_trait::async_trait]
pub trait IRemoteWriter: Send + Sync {
    /// Applies `change` to the remote store
    async fn propagate(&self, change: &Change) -> anyhow::Result<()>;
}

/// Port trait for reserving identities for files first seen locally
///
/// Remote identities are assigned by the remote service. A local file that
/// has never been synced needs one before it can be reconciled.
#[async_trait::async_trait]
pub trait IIdentityAllocator: Send + Sync {
    /// Reserves `count` fresh identities
    async fn allocate(&self, count: usize) -> anyhow::Result<Vec<FileIdentity>>;
}
