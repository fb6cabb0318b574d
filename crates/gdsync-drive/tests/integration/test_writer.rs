//! DriveWriter against a mocked Drive

use gdsync_core::domain::{Change, Checksum};
use gdsync_core::ports::IRemoteWriter;
use gdsync_drive::writer::DriveWriter;
use wiremock::matchers::{body_bytes, body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{self, file_json, snapshot};

const CONTENT: &[u8] = b"quarterly numbers";

fn write_local(root: &std::path::Path, relative: &str, content: &[u8]) -> Checksum {
    let full = root.join(relative);
    std::fs::create_dir_all(full.parent().unwrap()).unwrap();
    std::fs::write(full, content).unwrap();
    Checksum::sha256(content)
}

async fn mount_upload(server: &MockServer, id: &str, sum: &Checksum) {
    Mock::given(method("PATCH"))
        .and(path(format!("/upload/drive/v3/files/{id}")))
        .and(query_param("uploadType", "media"))
        .and(body_bytes(CONTENT))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(file_json(id, "report.txt", sum.as_str())),
        )
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_added_creates_then_uploads() {
    let (server, client) = common::setup_drive_mock().await;
    let root = tempfile::tempdir().unwrap();
    let sum = write_local(root.path(), "docs/report.txt", CONTENT);

    Mock::given(method("POST"))
        .and(path("/drive/v3/files"))
        .and(body_partial_json(serde_json::json!({
            "id": "new1",
            "name": "report.txt",
            "parents": ["folder9"],
            "appProperties": {"gdsync_path": "docs/report.txt"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "new1"})))
        .expect(1)
        .mount(&server)
        .await;
    mount_upload(&server, "new1", &sum).await;

    let writer = DriveWriter::new(client, root.path(), "folder9");
    let change = Change::added(snapshot("new1", sum.as_str()).with_path("docs/report.txt"));

    writer.propagate(&change).await.unwrap();
}

#[tokio::test]
async fn test_added_tolerates_existing_file() {
    let (server, client) = common::setup_drive_mock().await;
    let root = tempfile::tempdir().unwrap();
    let sum = write_local(root.path(), "report.txt", CONTENT);

    Mock::given(method("POST"))
        .and(path("/drive/v3/files"))
        .respond_with(ResponseTemplate::new(409))
        .mount(&server)
        .await;
    mount_upload(&server, "new1", &sum).await;

    let writer = DriveWriter::new(client, root.path(), "root");
    let change = Change::added(snapshot("new1", sum.as_str()).with_path("report.txt"));

    writer.propagate(&change).await.unwrap();
}

#[tokio::test]
async fn test_modified_uploads_content() {
    let (server, client) = common::setup_drive_mock().await;
    let root = tempfile::tempdir().unwrap();
    let sum = write_local(root.path(), "report.txt", CONTENT);
    mount_upload(&server, "f1", &sum).await;

    let writer = DriveWriter::new(client, root.path(), "root");
    let change = Change::modified(snapshot("f1", sum.as_str()).with_path("report.txt"));

    writer.propagate(&change).await.unwrap();
}

#[tokio::test]
async fn test_content_changed_since_scan_is_rejected_before_upload() {
    let (server, client) = common::setup_drive_mock().await;
    let root = tempfile::tempdir().unwrap();
    write_local(root.path(), "report.txt", b"edited again");
    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let writer = DriveWriter::new(client, root.path(), "root");
    let stale = Checksum::sha256(CONTENT);
    let change = Change::modified(snapshot("f1", stale.as_str()).with_path("report.txt"));

    let err = writer.propagate(&change).await.unwrap_err();
    assert!(err.to_string().contains("changed since it was scanned"));
}

#[tokio::test]
async fn test_missing_path_is_an_error() {
    let (_server, client) = common::setup_drive_mock().await;
    let root = tempfile::tempdir().unwrap();
    let writer = DriveWriter::new(client, root.path(), "root");

    let change = Change::modified(snapshot("f1", "abc"));
    assert!(writer.propagate(&change).await.is_err());
}

#[tokio::test]
async fn test_deleted_is_idempotent() {
    let (server, client) = common::setup_drive_mock().await;
    let root = tempfile::tempdir().unwrap();

    Mock::given(method("DELETE"))
        .and(path("/drive/v3/files/f1"))
        .respond_with(ResponseTemplate::new(204))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/drive/v3/files/f1"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let writer = DriveWriter::new(client, root.path(), "root");
    let change = Change::deleted(snapshot("f1", "abc"));

    writer.propagate(&change).await.unwrap();
    writer.propagate(&change).await.unwrap();
}

#[tokio::test]
async fn test_delete_server_error_propagates() {
    let (server, client) = common::setup_drive_mock().await;
    let root = tempfile::tempdir().unwrap();
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let writer = DriveWriter::new(client, root.path(), "root");
    assert!(writer
        .propagate(&Change::deleted(snapshot("f1", "abc")))
        .await
        .is_err());
}
