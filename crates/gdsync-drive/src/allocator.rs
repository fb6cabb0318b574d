//! Identity allocation through `files.generateIds`

use std::sync::Arc;

use anyhow::Context;
use gdsync_core::{domain::FileIdentity, ports::IIdentityAllocator};

use crate::client::DriveClient;

/// Reserves Drive file IDs for files first seen locally
pub struct DriveIdentityAllocator {
    client: Arc<DriveClient>,
}

impl DriveIdentityAllocator {
    pub fn new(client: Arc<DriveClient>) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl IIdentityAllocator for DriveIdentityAllocator {
    async fn allocate(&self, count: usize) -> anyhow::Result<Vec<FileIdentity>> {
        if count == 0 {
            return Ok(Vec::new());
        }

        let ids = self
            .client
            .generate_ids(count)
            .await
            .context("Failed to reserve file IDs")?;

        ids.into_iter()
            .map(|id| FileIdentity::new(id).context("Drive generated an invalid file ID"))
            .collect()
    }
}
