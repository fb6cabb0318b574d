//! Reconciliation engine
//!
//! Decides, for one local change, whether to propagate it, drop it, or flag
//! a conflict. The decision table per local kind:
//!
//! | local    | remote `None` | remote Added | remote Modified | remote Deleted |
//! |----------|---------------|--------------|-----------------|----------------|
//! | Added    | propagate     | conflict     | violation       | violation      |
//! | Modified | propagate     | violation    | conflict        | conflict       |
//! | Deleted  | propagate     | violation    | conflict        | no-op          |
//!
//! Conflicts are recorded in the [`ConflictRegister`] before the outcome is
//! returned. The oracle query is the only suspension point that honours
//! cancellation; once the oracle has answered, the record is always written.

use std::sync::Arc;

use gdsync_core::{
    domain::{Change, ChangeKind, ConflictRecord, FileIdentity, FileSnapshot, OracleError},
    ports::IRemoteOracle,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::{error::ReconcileError, register::ConflictRegister};

/// Outcome of reconciling one local change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    /// No remote divergence; the local change should be written remotely
    Propagate(ChangeKind),
    /// Both sides already agree; nothing to do
    NoOp,
    /// Local and remote changes are incompatible and a record was written
    Conflict {
        /// Kind of the remote change that conflicted
        remote: ChangeKind,
    },
}

impl Reconciliation {
    /// Returns the kind that describes the file after reconciliation
    ///
    /// `Propagate(k)` yields `k`, a conflict yields the remote kind and a
    /// no-op yields `None`.
    pub fn effective_kind(&self) -> Option<ChangeKind> {
        match self {
            Reconciliation::Propagate(kind) => Some(*kind),
            Reconciliation::Conflict { remote } => Some(*remote),
            Reconciliation::NoOp => None,
        }
    }

    /// Returns true if the change should be written to the remote
    pub fn should_propagate(&self) -> bool {
        matches!(self, Reconciliation::Propagate(_))
    }
}

/// Stateless decision logic over an oracle and a conflict register
pub struct ReconciliationEngine {
    oracle: Arc<dyn IRemoteOracle>,
    register: Arc<ConflictRegister>,
}

impl ReconciliationEngine {
    /// Creates an engine over the given oracle and register
    pub fn new(oracle: Arc<dyn IRemoteOracle>, register: Arc<ConflictRegister>) -> Self {
        Self { oracle, register }
    }

    /// Returns the register conflicts are recorded into
    pub fn register(&self) -> &Arc<ConflictRegister> {
        &self.register
    }

    /// Reconciles a locally added file
    pub async fn check_added(&self, local: &FileSnapshot) -> Result<Reconciliation, ReconcileError> {
        self.reconcile(&Change::added(local.clone()), &CancellationToken::new())
            .await
    }

    /// Reconciles a locally modified file
    pub async fn check_modified(
        &self,
        local: &FileSnapshot,
    ) -> Result<Reconciliation, ReconcileError> {
        self.reconcile(&Change::modified(local.clone()), &CancellationToken::new())
            .await
    }

    /// Reconciles a locally deleted file
    ///
    /// `local` carries the last known checksum of the deleted file.
    pub async fn check_deleted(
        &self,
        local: &FileSnapshot,
    ) -> Result<Reconciliation, ReconcileError> {
        self.reconcile(&Change::deleted(local.clone()), &CancellationToken::new())
            .await
    }

    /// Reconciles `change`, dispatching on its kind
    ///
    /// If `cancel` fires while the oracle query is in flight, returns
    /// `ReconcileError::Cancelled` and records nothing.
    #[tracing::instrument(skip(self, change, cancel), fields(identity = %change.identity(), local = %change.kind()))]
    pub async fn reconcile(
        &self,
        change: &Change,
        cancel: &CancellationToken,
    ) -> Result<Reconciliation, ReconcileError> {
        let remote = self.query(change.snapshot(), cancel).await?;

        let outcome = match (change.kind(), remote) {
            (kind, None) => Reconciliation::Propagate(kind),

            (ChangeKind::Added, Some(remote)) if remote.kind() == ChangeKind::Added => {
                self.record(change, remote).await?
            }
            (ChangeKind::Modified, Some(remote))
                if matches!(remote.kind(), ChangeKind::Modified | ChangeKind::Deleted) =>
            {
                self.record(change, remote).await?
            }
            (ChangeKind::Deleted, Some(remote)) if remote.kind() == ChangeKind::Modified => {
                // The local delete is held back: the remote edit wins until
                // someone resolves the record.
                self.record(change, remote).await?
            }
            (ChangeKind::Deleted, Some(remote)) if remote.kind() == ChangeKind::Deleted => {
                Reconciliation::NoOp
            }

            (local, Some(remote)) => {
                warn!(remote = %remote.kind(), "Oracle reported an impossible remote change");
                return Err(ReconcileError::ProtocolViolation {
                    identity: change.identity().clone(),
                    local,
                    remote: remote.kind(),
                });
            }
        };

        debug!(outcome = ?outcome, "Change reconciled");
        Ok(outcome)
    }

    async fn query(
        &self,
        local: &FileSnapshot,
        cancel: &CancellationToken,
    ) -> Result<Option<Change>, ReconcileError> {
        let identity = local.identity();

        let answer = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(identity = %identity, "Oracle query cancelled");
                return Err(ReconcileError::Cancelled { identity: identity.clone() });
            }
            answer = self.oracle.query_remote_change(local) => answer,
        };

        match answer {
            Ok(Some(remote)) if remote.identity() != identity => {
                Err(ReconcileError::MalformedRemote {
                    identity: identity.clone(),
                    reason: format!("oracle answered for {}", remote.identity()),
                })
            }
            Ok(remote) => Ok(remote),
            Err(OracleError::RemoteUnavailable(reason)) => {
                warn!(identity = %identity, %reason, "Remote unavailable");
                Err(ReconcileError::RemoteUnavailable {
                    identity: identity.clone(),
                    reason,
                })
            }
            Err(OracleError::Protocol(reason)) => {
                warn!(identity = %identity, %reason, "Unusable oracle response");
                Err(ReconcileError::MalformedRemote {
                    identity: identity.clone(),
                    reason,
                })
            }
        }
    }

    async fn record(
        &self,
        local: &Change,
        remote: Change,
    ) -> Result<Reconciliation, ReconcileError> {
        let remote_kind = remote.kind();
        let identity: FileIdentity = local.identity().clone();

        self.register
            .record(ConflictRecord::new(local.clone(), remote))
            .await
            .map_err(|source| ReconcileError::Register {
                identity: identity.clone(),
                source,
            })?;

        warn!(
            identity = %identity,
            local = %local.kind(),
            remote = %remote_kind,
            "Conflict detected"
        );
        Ok(Reconciliation::Conflict {
            remote: remote_kind,
        })
    }
}
