//! Remote writer over Google Drive
//!
//! Applies one local change to Drive:
//! - `Added`: create the file under the configured folder with its
//!   pre-allocated ID, then upload the content
//! - `Modified`: upload the content over the existing file
//! - `Deleted`: delete the file
//!
//! Every step tolerates having already happened, so re-running a change
//! after a partial failure is safe.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use gdsync_core::{
    domain::{Change, ChangeKind, Checksum, FileSnapshot},
    ports::IRemoteWriter,
};
use tracing::{debug, info, warn};

use crate::client::DriveClient;

/// `IRemoteWriter` that mirrors the local sync root into one Drive folder
pub struct DriveWriter {
    client: Arc<DriveClient>,
    root: PathBuf,
    folder_id: String,
}

impl DriveWriter {
    /// Creates a writer reading content below `root`
    ///
    /// # Arguments
    /// * `root` - The local sync root; snapshot paths are relative to it
    /// * `folder_id` - The Drive folder new files are created in
    pub fn new(client: Arc<DriveClient>, root: impl Into<PathBuf>, folder_id: impl Into<String>) -> Self {
        Self {
            client,
            root: root.into(),
            folder_id: folder_id.into(),
        }
    }

    /// Returns the local sync root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Reads the content a snapshot describes and checks it is still that content
    async fn read_content(&self, snapshot: &FileSnapshot) -> Result<(String, Vec<u8>)> {
        let relative = snapshot
            .path()
            .with_context(|| format!("{} carries no local path", snapshot.identity()))?;
        let full = self.root.join(relative);

        let content = tokio::fs::read(&full)
            .await
            .with_context(|| format!("Failed to read {}", full.display()))?;

        let actual = Checksum::sha256(&content);
        if &actual != snapshot.checksum() {
            bail!(
                "{} changed since it was scanned (expected {}, found {})",
                relative,
                snapshot.checksum(),
                actual
            );
        }

        Ok((relative.to_string(), content))
    }

    async fn upload(&self, snapshot: &FileSnapshot, content: Vec<u8>) -> Result<()> {
        let uploaded = self
            .client
            .upload_media(snapshot.identity(), content)
            .await
            .with_context(|| format!("Failed to upload {}", snapshot.identity()))?;

        if let Some(remote) = uploaded.sha256_checksum.as_deref() {
            if !remote.eq_ignore_ascii_case(snapshot.checksum().as_str()) {
                warn!(
                    identity = %snapshot.identity(),
                    local = %snapshot.checksum(),
                    remote,
                    "Drive reports a different checksum after upload"
                );
            }
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl IRemoteWriter for DriveWriter {
    #[tracing::instrument(skip(self, change), fields(identity = %change.identity(), kind = %change.kind()))]
    async fn propagate(&self, change: &Change) -> Result<()> {
        let snapshot = change.snapshot();

        match change.kind() {
            ChangeKind::Added => {
                let (relative, content) = self.read_content(snapshot).await?;
                let name = relative.rsplit('/').next().unwrap_or(relative.as_str());

                let created = self
                    .client
                    .create_file(snapshot.identity(), name, &self.folder_id, &relative)
                    .await
                    .with_context(|| format!("Failed to create {}", relative))?;
                if !created {
                    debug!("File existed from an earlier attempt");
                }

                self.upload(snapshot, content).await?;
                info!(path = %relative, "Created remote file");
            }
            ChangeKind::Modified => {
                let (relative, content) = self.read_content(snapshot).await?;
                self.upload(snapshot, content).await?;
                info!(path = %relative, "Updated remote file");
            }
            ChangeKind::Deleted => {
                let deleted = self
                    .client
                    .delete_file(snapshot.identity())
                    .await
                    .with_context(|| format!("Failed to delete {}", snapshot.identity()))?;
                info!(already_gone = !deleted, "Deleted remote file");
            }
        }

        Ok(())
    }
}
