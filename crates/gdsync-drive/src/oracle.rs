//! Remote state oracle over Google Drive
//!
//! Answers "how has the Drive copy diverged from the baseline" by fetching
//! file metadata and comparing `sha256Checksum` to the baseline checksum.
//!
//! | Drive state                  | Baseline | Answer                      |
//! |------------------------------|----------|-----------------------------|
//! | 404 or trashed               | yes      | `Deleted(baseline snapshot)`|
//! | 404 or trashed               | no       | `None`                      |
//! | exists, identity reserved    | no       | `None`                      |
//! | exists                       | no       | `Added(remote snapshot)`    |
//! | exists, same checksum        | yes      | `None`                      |
//! | exists, different checksum   | yes      | `Modified(remote snapshot)` |
//! | exists, no `sha256Checksum`  | any      | `Protocol` error            |
//!
//! A file under an identity we reserved ourselves is the leftover of an
//! interrupted create, not a remote addition.

use std::sync::Arc;

use chrono::Utc;
use gdsync_core::{
    domain::{Change, Checksum, FileIdentity, FileSnapshot, OracleError},
    ports::{IBaselineStore, IPendingIdentityStore, IRemoteOracle},
};
use tracing::debug;

use crate::{
    client::{DriveClient, DriveFile},
    DriveError,
};

/// `IRemoteOracle` backed by Drive metadata and the local baseline store
pub struct DriveOracle {
    client: Arc<DriveClient>,
    baseline: Arc<dyn IBaselineStore>,
    pending: Option<Arc<dyn IPendingIdentityStore>>,
}

impl DriveOracle {
    /// Creates an oracle reading Drive through `client`
    pub fn new(client: Arc<DriveClient>, baseline: Arc<dyn IBaselineStore>) -> Self {
        Self {
            client,
            baseline,
            pending: None,
        }
    }

    /// Recognizes files created under identities reserved in `pending`
    pub fn with_pending(mut self, pending: Arc<dyn IPendingIdentityStore>) -> Self {
        self.pending = Some(pending);
        self
    }

    async fn is_reserved(&self, identity: &FileIdentity) -> Result<bool, OracleError> {
        let Some(pending) = &self.pending else {
            return Ok(false);
        };
        let reserved = pending
            .get(identity)
            .await
            .map_err(|e| OracleError::RemoteUnavailable(format!("reservation lookup: {e:#}")))?;
        Ok(reserved.is_some())
    }

    fn remote_snapshot(file: &DriveFile) -> Result<FileSnapshot, OracleError> {
        let checksum = file
            .sha256_checksum
            .as_deref()
            .ok_or_else(|| {
                OracleError::Protocol(format!("{} has no sha256Checksum", file.id))
            })
            .and_then(|sum| {
                Checksum::new(sum.to_ascii_lowercase())
                    .map_err(|e| OracleError::Protocol(e.to_string()))
            })?;

        let identity = FileIdentity::new(file.id.clone())
            .map_err(|e| OracleError::Protocol(e.to_string()))?;

        let snapshot = FileSnapshot::new(
            identity,
            checksum,
            file.modified_time.unwrap_or_else(Utc::now),
        );
        Ok(if file.name.is_empty() {
            snapshot
        } else {
            snapshot.with_path(file.name.clone())
        })
    }
}

fn classify(err: DriveError) -> OracleError {
    if err.is_transient() {
        OracleError::RemoteUnavailable(err.to_string())
    } else {
        OracleError::Protocol(err.to_string())
    }
}

#[async_trait::async_trait]
impl IRemoteOracle for DriveOracle {
    async fn query_remote_change(
        &self,
        local: &FileSnapshot,
    ) -> Result<Option<Change>, OracleError> {
        let identity = local.identity();

        let baseline = self
            .baseline
            .get(identity)
            .await
            .map_err(|e| OracleError::RemoteUnavailable(format!("baseline lookup: {e:#}")))?;

        let remote = self.client.get_file(identity).await.map_err(classify)?;

        let answer = match (remote, baseline) {
            (None, Some(base)) => Some(Change::deleted(base.snapshot().clone())),
            (Some(file), Some(base)) if file.trashed => {
                Some(Change::deleted(base.snapshot().clone()))
            }
            (None, None) => None,
            (Some(file), None) if file.trashed => None,

            (Some(file), None) => {
                if self.is_reserved(identity).await? {
                    debug!(identity = %identity, "Remote file is our own unfinished create");
                    None
                } else {
                    Some(Change::added(Self::remote_snapshot(&file)?))
                }
            }
            (Some(file), Some(base)) => {
                let remote = Self::remote_snapshot(&file)?;
                if remote.content_equals(base.snapshot()) {
                    None
                } else {
                    Some(Change::modified(remote))
                }
            }
        };

        debug!(
            identity = %identity,
            remote = answer.as_ref().map(|c| c.kind().name()).unwrap_or("unchanged"),
            "Remote state queried"
        );
        Ok(answer)
    }
}
