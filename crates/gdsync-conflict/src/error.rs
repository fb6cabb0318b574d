//! Error types for reconciliation and the conflict register

use gdsync_core::domain::{ChangeKind, FileIdentity};
use thiserror::Error;

/// Errors that can occur while reconciling a single local change
///
/// A detected conflict is not an error: it is reported as
/// [`Reconciliation::Conflict`](crate::Reconciliation::Conflict).
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The oracle could not reach the remote; retry on the next pass
    #[error("remote unavailable for {identity}: {reason}")]
    RemoteUnavailable { identity: FileIdentity, reason: String },

    /// The oracle reported a remote kind that cannot follow the local kind
    #[error("protocol violation for {identity}: remote reported {remote} for a locally {local} file")]
    ProtocolViolation {
        identity: FileIdentity,
        local: ChangeKind,
        remote: ChangeKind,
    },

    /// The oracle answered, but the answer is unusable
    #[error("malformed remote answer for {identity}: {reason}")]
    MalformedRemote { identity: FileIdentity, reason: String },

    /// The pass was cancelled while the oracle query was in flight
    #[error("reconciliation of {identity} cancelled")]
    Cancelled { identity: FileIdentity },

    /// The conflict could not be recorded
    #[error("failed to record conflict for {identity}: {source}")]
    Register {
        identity: FileIdentity,
        #[source]
        source: RegisterError,
    },
}

impl ReconcileError {
    /// Returns true if the change should simply be retried on a later pass
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ReconcileError::RemoteUnavailable { .. }
                | ReconcileError::Cancelled { .. }
                | ReconcileError::Register { .. }
        )
    }

    /// Returns the identity of the change that failed
    pub fn identity(&self) -> &FileIdentity {
        match self {
            ReconcileError::RemoteUnavailable { identity, .. }
            | ReconcileError::ProtocolViolation { identity, .. }
            | ReconcileError::MalformedRemote { identity, .. }
            | ReconcileError::Cancelled { identity }
            | ReconcileError::Register { identity, .. } => identity,
        }
    }
}

/// Errors that can occur in the conflict register
#[derive(Debug, Error)]
pub enum RegisterError {
    /// No open conflict exists for the identity
    #[error("no open conflict for {0}")]
    NotFound(FileIdentity),

    /// Storage error
    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),
}
