//! DriveOracle against a mocked Drive

use gdsync_core::domain::{ChangeKind, OracleError};
use gdsync_core::ports::IRemoteOracle;
use gdsync_drive::oracle::DriveOracle;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::common::{self, file_json, snapshot, MapBaseline, MapPending};

const SUM_A: &str = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";
const SUM_B: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

#[tokio::test]
async fn test_unchanged_remote_is_none() {
    let (server, client) = common::setup_drive_mock().await;
    common::mount_file(&server, "f1", file_json("f1", "a.txt", SUM_A)).await;
    let oracle = DriveOracle::new(client, MapBaseline::with(&[("f1", "a.txt", SUM_A)]));

    let answer = oracle.query_remote_change(&snapshot("f1", SUM_B)).await.unwrap();

    assert!(answer.is_none());
}

#[tokio::test]
async fn test_checksum_difference_is_modified() {
    let (server, client) = common::setup_drive_mock().await;
    common::mount_file(&server, "f1", file_json("f1", "a.txt", SUM_B)).await;
    let oracle = DriveOracle::new(client, MapBaseline::with(&[("f1", "a.txt", SUM_A)]));

    let change = oracle
        .query_remote_change(&snapshot("f1", SUM_A))
        .await
        .unwrap()
        .expect("remote diverged");

    assert_eq!(change.kind(), ChangeKind::Modified);
    assert_eq!(change.snapshot().checksum().as_str(), SUM_B);
    assert_eq!(change.snapshot().path(), Some("a.txt"));
}

#[tokio::test]
async fn test_uppercase_remote_checksum_is_normalized() {
    let (server, client) = common::setup_drive_mock().await;
    common::mount_file(&server, "f1", file_json("f1", "a.txt", &SUM_A.to_uppercase())).await;
    let oracle = DriveOracle::new(client, MapBaseline::with(&[("f1", "a.txt", SUM_A)]));

    assert!(oracle
        .query_remote_change(&snapshot("f1", SUM_A))
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_missing_remote_with_baseline_is_deleted() {
    let (server, client) = common::setup_drive_mock().await;
    common::mount_file_status(&server, "f2", 404).await;
    let oracle = DriveOracle::new(client, MapBaseline::with(&[("f2", "b.txt", SUM_A)]));

    let change = oracle
        .query_remote_change(&snapshot("f2", SUM_A))
        .await
        .unwrap()
        .expect("remote deleted");

    assert_eq!(change.kind(), ChangeKind::Deleted);
    assert_eq!(change.snapshot().checksum().as_str(), SUM_A);
}

#[tokio::test]
async fn test_trashed_remote_is_deleted() {
    let (server, client) = common::setup_drive_mock().await;
    let mut body = file_json("f2", "b.txt", SUM_A);
    body["trashed"] = serde_json::json!(true);
    common::mount_file(&server, "f2", body).await;
    let oracle = DriveOracle::new(client, MapBaseline::with(&[("f2", "b.txt", SUM_A)]));

    let change = oracle
        .query_remote_change(&snapshot("f2", SUM_A))
        .await
        .unwrap()
        .expect("remote trashed");

    assert_eq!(change.kind(), ChangeKind::Deleted);
}

#[tokio::test]
async fn test_missing_remote_without_baseline_is_none() {
    let (server, client) = common::setup_drive_mock().await;
    common::mount_file_status(&server, "new1", 404).await;
    let oracle = DriveOracle::new(client, MapBaseline::with(&[]));

    assert!(oracle
        .query_remote_change(&snapshot("new1", SUM_A))
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_existing_remote_without_baseline_is_added() {
    let (server, client) = common::setup_drive_mock().await;
    common::mount_file(&server, "new1", file_json("new1", "c.txt", SUM_B)).await;
    let oracle = DriveOracle::new(client, MapBaseline::with(&[]));

    let change = oracle
        .query_remote_change(&snapshot("new1", SUM_A))
        .await
        .unwrap()
        .expect("remote added");

    assert_eq!(change.kind(), ChangeKind::Added);
}

#[tokio::test]
async fn test_reserved_identity_without_baseline_is_none() {
    let (server, client) = common::setup_drive_mock().await;
    common::mount_file(&server, "r1", file_json("r1", "new.txt", SUM_A)).await;
    common::mount_file(&server, "x1", file_json("x1", "other.txt", SUM_A)).await;
    let oracle = DriveOracle::new(client, MapBaseline::with(&[]))
        .with_pending(MapPending::with(&[("r1", "new.txt")]));

    let reserved = oracle.query_remote_change(&snapshot("r1", SUM_A)).await.unwrap();
    let foreign = oracle.query_remote_change(&snapshot("x1", SUM_A)).await.unwrap();

    assert!(reserved.is_none());
    assert_eq!(foreign.map(|c| c.kind()), Some(ChangeKind::Added));
}

#[tokio::test]
async fn test_native_document_without_checksum_is_protocol_error() {
    let (server, client) = common::setup_drive_mock().await;
    common::mount_file(
        &server,
        "doc1",
        serde_json::json!({"id": "doc1", "name": "Notes", "trashed": false}),
    )
    .await;
    let oracle = DriveOracle::new(client, MapBaseline::with(&[("doc1", "Notes", SUM_A)]));

    let err = oracle
        .query_remote_change(&snapshot("doc1", SUM_A))
        .await
        .unwrap_err();

    assert!(matches!(err, OracleError::Protocol(_)));
}

#[tokio::test]
async fn test_server_and_auth_failures_are_unavailable() {
    for status in [401, 403, 429, 500, 503] {
        let (server, client) = common::setup_drive_mock().await;
        common::mount_file_status(&server, "f1", status).await;
        let oracle = DriveOracle::new(client, MapBaseline::with(&[("f1", "a.txt", SUM_A)]));

        let err = oracle
            .query_remote_change(&snapshot("f1", SUM_A))
            .await
            .unwrap_err();

        assert!(
            matches!(err, OracleError::RemoteUnavailable(_)),
            "status {status} gave {err:?}"
        );
    }
}

#[tokio::test]
async fn test_unreachable_host_is_unavailable() {
    let client = std::sync::Arc::new(gdsync_drive::client::DriveClient::with_base_url(
        common::TOKEN,
        "http://127.0.0.1:9",
    ));
    let oracle = DriveOracle::new(client, MapBaseline::with(&[]));

    let err = oracle
        .query_remote_change(&snapshot("f1", SUM_A))
        .await
        .unwrap_err();

    assert!(matches!(err, OracleError::RemoteUnavailable(_)));
}

#[tokio::test]
async fn test_requests_carry_bearer_token() {
    let (server, client) = common::setup_drive_mock().await;
    Mock::given(method("GET"))
        .and(path("/drive/v3/files/f1"))
        .and(header("Authorization", format!("Bearer {}", common::TOKEN).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(file_json("f1", "a.txt", SUM_A)))
        .expect(1)
        .mount(&server)
        .await;
    let oracle = DriveOracle::new(client, MapBaseline::with(&[("f1", "a.txt", SUM_A)]));

    oracle.query_remote_change(&snapshot("f1", SUM_A)).await.unwrap();
}
