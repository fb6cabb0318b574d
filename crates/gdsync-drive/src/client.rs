//! Google Drive v3 client
//!
//! Typed wrapper over `reqwest` for the Drive endpoints gdsync uses:
//! file metadata, ID generation, metadata creation, media upload and
//! deletion. Every request carries the bearer token given at construction.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use gdsync_drive::client::DriveClient;
//! use gdsync_core::domain::FileIdentity;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = DriveClient::new("access-token-here");
//! let id = FileIdentity::new("1a2b3c")?;
//! if let Some(file) = client.get_file(&id).await? {
//!     println!("{} {:?}", file.name, file.sha256_checksum);
//! }
//! # Ok(())
//! # }
//! ```

use chrono::{DateTime, Utc};
use gdsync_core::domain::FileIdentity;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::DriveError;

/// Default Drive API host
const DRIVE_BASE_URL: &str = "https://www.googleapis.com";

/// Metadata fields requested for every file lookup
const FILE_FIELDS: &str = "id,name,sha256Checksum,modifiedTime,trashed";

/// Drive caps `generateIds` at this many IDs per call
const MAX_IDS_PER_CALL: usize = 1000;

// ============================================================================
// Drive API types
// ============================================================================

/// File metadata as returned by `files.get`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    /// Drive file ID
    pub id: String,
    /// File name (not a path)
    #[serde(default)]
    pub name: String,
    /// Lowercase hex SHA-256 of the content; absent for Google-native docs
    pub sha256_checksum: Option<String>,
    /// Last modification time
    pub modified_time: Option<DateTime<Utc>>,
    /// Whether the file sits in the trash
    #[serde(default)]
    pub trashed: bool,
}

#[derive(Debug, Deserialize)]
struct GeneratedIds {
    ids: Vec<String>,
}

/// Metadata body for `files.create`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NewFile<'a> {
    id: &'a str,
    name: &'a str,
    parents: [&'a str; 1],
    app_properties: AppProperties<'a>,
}

#[derive(Debug, Serialize)]
struct AppProperties<'a> {
    /// Path relative to the sync root, so the tree can be rebuilt remotely
    gdsync_path: &'a str,
}

// ============================================================================
// DriveClient
// ============================================================================

/// HTTP client for the Google Drive v3 API
pub struct DriveClient {
    client: Client,
    base_url: String,
    access_token: String,
}

impl DriveClient {
    /// Creates a client against the public Drive API
    pub fn new(access_token: impl Into<String>) -> Self {
        Self::with_base_url(access_token, DRIVE_BASE_URL)
    }

    /// Creates a client against a custom host (tests, proxies)
    ///
    /// `/drive/v3` and `/upload/drive/v3` are appended to `base_url`.
    pub fn with_base_url(access_token: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
        }
    }

    /// Returns the API host
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Creates an authenticated request for a path relative to the host
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.client
            .request(method, &url)
            .bearer_auth(&self.access_token)
    }

    /// Fetches file metadata
    ///
    /// Returns `Ok(None)` if Drive answers 404. A trashed file is returned
    /// as-is with `trashed: true`.
    pub async fn get_file(&self, id: &FileIdentity) -> Result<Option<DriveFile>, DriveError> {
        let path = format!("/drive/v3/files/{}", id.as_str());
        debug!(id = %id, "Fetching file metadata");

        let response = self
            .request(Method::GET, &path)
            .query(&[("fields", FILE_FIELDS)])
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let file: DriveFile = check(response)
            .await?
            .json()
            .await
            .map_err(|e| DriveError::InvalidResponse(format!("file metadata: {e}")))?;

        if file.id != id.as_str() {
            return Err(DriveError::InvalidResponse(format!(
                "asked for {} but Drive returned {}",
                id, file.id
            )));
        }
        Ok(Some(file))
    }

    /// Reserves `count` file IDs for later `create_file` calls
    pub async fn generate_ids(&self, count: usize) -> Result<Vec<String>, DriveError> {
        let mut ids = Vec::with_capacity(count);

        while ids.len() < count {
            let batch = (count - ids.len()).min(MAX_IDS_PER_CALL);
            let batch_param = batch.to_string();
            let generated: GeneratedIds = check(
                self.request(Method::GET, "/drive/v3/files/generateIds")
                    .query(&[
                        ("count", batch_param.as_str()),
                        ("space", "drive"),
                        ("type", "files"),
                    ])
                    .send()
                    .await?,
            )
            .await?
            .json()
            .await
            .map_err(|e| DriveError::InvalidResponse(format!("generateIds: {e}")))?;

            if generated.ids.is_empty() {
                return Err(DriveError::InvalidResponse(
                    "generateIds returned no IDs".to_string(),
                ));
            }
            ids.extend(generated.ids.into_iter().take(batch));
        }

        debug!(count = ids.len(), "Generated file IDs");
        Ok(ids)
    }

    /// Creates an empty file with a pre-generated ID
    ///
    /// Returns `Ok(false)` if a file with that ID already exists, which
    /// happens when a previous attempt got as far as creation.
    pub async fn create_file(
        &self,
        id: &FileIdentity,
        name: &str,
        parent: &str,
        relative_path: &str,
    ) -> Result<bool, DriveError> {
        let body = NewFile {
            id: id.as_str(),
            name,
            parents: [parent],
            app_properties: AppProperties {
                gdsync_path: relative_path,
            },
        };

        let response = self
            .request(Method::POST, "/drive/v3/files")
            .query(&[("fields", "id")])
            .json(&body)
            .send()
            .await?;

        if response.status() == StatusCode::CONFLICT {
            debug!(id = %id, "File already created");
            return Ok(false);
        }

        check(response).await?;
        debug!(id = %id, name, "Created file");
        Ok(true)
    }

    /// Replaces the content of an existing file
    pub async fn upload_media(
        &self,
        id: &FileIdentity,
        content: Vec<u8>,
    ) -> Result<DriveFile, DriveError> {
        let path = format!("/upload/drive/v3/files/{}", id.as_str());
        let size = content.len();

        let file: DriveFile = check(
            self.request(Method::PATCH, &path)
                .query(&[("uploadType", "media"), ("fields", FILE_FIELDS)])
                .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
                .body(content)
                .send()
                .await?,
        )
        .await?
        .json()
        .await
        .map_err(|e| DriveError::InvalidResponse(format!("upload response: {e}")))?;

        debug!(id = %id, size, "Uploaded content");
        Ok(file)
    }

    /// Permanently deletes a file
    ///
    /// Returns `Ok(false)` if the file was already gone.
    pub async fn delete_file(&self, id: &FileIdentity) -> Result<bool, DriveError> {
        let path = format!("/drive/v3/files/{}", id.as_str());

        let response = self.request(Method::DELETE, &path).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            debug!(id = %id, "File already deleted");
            return Ok(false);
        }

        check(response).await?;
        debug!(id = %id, "Deleted file");
        Ok(true)
    }
}

/// Turns a non-success response into a classified error
async fn check(response: Response) -> Result<Response, DriveError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(DriveError::from_status(status, body))
}
