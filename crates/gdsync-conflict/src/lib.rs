//! gdsync Conflict - Change reconciliation and conflict tracking
//!
//! Provides:
//! - The reconciliation engine deciding, per local change, whether to
//!   propagate, do nothing, or flag a conflict
//! - The conflict register holding open conflicts keyed by file identity
//! - An in-memory conflict store for tests and ephemeral runs
//!
//! ## Modules
//!
//! - [`reconciler`] - [`ReconciliationEngine`] and its [`Reconciliation`] outcome
//! - [`register`] - [`ConflictRegister`] over an `IConflictStore`
//! - [`memory`] - [`InMemoryConflictStore`] backed by a `DashMap`

pub mod error;
pub mod memory;
pub mod reconciler;
pub mod register;

pub use error::{ReconcileError, RegisterError};
pub use memory::InMemoryConflictStore;
pub use reconciler::{Reconciliation, ReconciliationEngine};
pub use register::ConflictRegister;
