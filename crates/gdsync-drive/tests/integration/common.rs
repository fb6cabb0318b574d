//! Shared helpers for Drive integration tests

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use gdsync_core::domain::{BaselineEntry, Checksum, FileIdentity, FileSnapshot, PendingIdentity};
use gdsync_core::ports::{IBaselineStore, IPendingIdentityStore};
use gdsync_drive::client::DriveClient;

pub const TOKEN: &str = "test-access-token";

/// Starts a mock server and returns a client pointed at it
pub async fn setup_drive_mock() -> (MockServer, Arc<DriveClient>) {
    let server = MockServer::start().await;
    let client = Arc::new(DriveClient::with_base_url(TOKEN, server.uri()));
    (server, client)
}

/// Mounts `GET /drive/v3/files/{id}` answering with `body`
pub async fn mount_file(server: &MockServer, id: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(format!("/drive/v3/files/{id}")))
        .and(query_param("fields", "id,name,sha256Checksum,modifiedTime,trashed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Mounts `GET /drive/v3/files/{id}` answering with a bare status
pub async fn mount_file_status(server: &MockServer, id: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(format!("/drive/v3/files/{id}")))
        .respond_with(ResponseTemplate::new(status).set_body_json(serde_json::json!({
            "error": {"code": status, "message": "mocked"}
        })))
        .mount(server)
        .await;
}

pub fn file_json(id: &str, name: &str, sha256: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "name": name,
        "sha256Checksum": sha256,
        "modifiedTime": "2026-10-19T08:30:00.000Z",
        "trashed": false
    })
}

pub fn snapshot(id: &str, checksum: &str) -> FileSnapshot {
    FileSnapshot::new(
        FileIdentity::new(id).unwrap(),
        Checksum::new(checksum).unwrap(),
        Utc::now(),
    )
}

/// Baseline store kept in a map
#[derive(Default)]
pub struct MapBaseline {
    entries: Mutex<HashMap<FileIdentity, BaselineEntry>>,
}

impl MapBaseline {
    pub fn with(entries: &[(&str, &str, &str)]) -> Arc<Self> {
        let store = Self::default();
        {
            let mut map = store.entries.lock().unwrap();
            for (id, path, checksum) in entries {
                let entry = BaselineEntry::new(*path, snapshot(id, checksum)).unwrap();
                map.insert(entry.identity().clone(), entry);
            }
        }
        Arc::new(store)
    }
}

#[async_trait::async_trait]
impl IBaselineStore for MapBaseline {
    async fn get(&self, identity: &FileIdentity) -> anyhow::Result<Option<BaselineEntry>> {
        Ok(self.entries.lock().unwrap().get(identity).cloned())
    }

    async fn list(&self) -> anyhow::Result<Vec<BaselineEntry>> {
        Ok(self.entries.lock().unwrap().values().cloned().collect())
    }

    async fn upsert(&self, entry: &BaselineEntry) -> anyhow::Result<()> {
        self.entries
            .lock()
            .unwrap()
            .insert(entry.identity().clone(), entry.clone());
        Ok(())
    }

    async fn remove(&self, identity: &FileIdentity) -> anyhow::Result<()> {
        self.entries.lock().unwrap().remove(identity);
        Ok(())
    }
}

/// Identity reservations kept in a map
#[derive(Default)]
pub struct MapPending {
    reserved: Mutex<HashMap<FileIdentity, PendingIdentity>>,
}

impl MapPending {
    pub fn with(entries: &[(&str, &str)]) -> Arc<Self> {
        let store = Self::default();
        {
            let mut map = store.reserved.lock().unwrap();
            for (id, path) in entries {
                let pending = PendingIdentity::new(*path, FileIdentity::new(*id).unwrap()).unwrap();
                map.insert(pending.identity().clone(), pending);
            }
        }
        Arc::new(store)
    }
}

#[async_trait::async_trait]
impl IPendingIdentityStore for MapPending {
    async fn get(&self, identity: &FileIdentity) -> anyhow::Result<Option<PendingIdentity>> {
        Ok(self.reserved.lock().unwrap().get(identity).cloned())
    }

    async fn list(&self) -> anyhow::Result<Vec<PendingIdentity>> {
        Ok(self.reserved.lock().unwrap().values().cloned().collect())
    }

    async fn reserve(&self, pending: &PendingIdentity) -> anyhow::Result<()> {
        let mut map = self.reserved.lock().unwrap();
        map.retain(|_, p| p.path() != pending.path());
        map.insert(pending.identity().clone(), pending.clone());
        Ok(())
    }

    async fn release(&self, identity: &FileIdentity) -> anyhow::Result<()> {
        self.reserved.lock().unwrap().remove(identity);
        Ok(())
    }
}
