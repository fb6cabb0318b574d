//! Port definitions (hexagonal architecture interfaces)
//!
//! This module defines the port traits that form the boundaries of the
//! hexagonal architecture. Ports are interfaces that the reconciliation
//! core depends on, but whose implementations live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`IRemoteOracle`] - What changed remotely since the baseline
//! - [`IRemoteWriter`] - Applies a local change to the remote store
//! - [`IIdentityAllocator`] - Reserves remote identities for new local files
//! - [`ILocalScanner`] - Produces the local changes of one sync pass
//! - [`IConflictStore`] - Persistence backing the conflict register
//! - [`IBaselineStore`] - Persistence for the last agreed snapshots
//! - [`IPendingIdentityStore`] - Identities reserved for files not yet synced

pub mod local_scanner;
pub mod remote;
pub mod state_repository;

pub use local_scanner::ILocalScanner;
pub use remote::{IIdentityAllocator, IRemoteOracle, IRemoteWriter};
pub use state_repository::{IBaselineStore, IConflictStore, IPendingIdentityStore};
