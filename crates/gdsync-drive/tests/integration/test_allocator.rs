//! DriveIdentityAllocator against a mocked Drive

use gdsync_core::ports::IIdentityAllocator;
use gdsync_drive::allocator::DriveIdentityAllocator;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use crate::common;

#[tokio::test]
async fn test_allocate_returns_generated_ids() {
    let (server, client) = common::setup_drive_mock().await;
    Mock::given(method("GET"))
        .and(path("/drive/v3/files/generateIds"))
        .and(query_param("count", "3"))
        .and(query_param("space", "drive"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "kind": "drive#generatedIds",
            "space": "drive",
            "ids": ["idA", "idB", "idC"]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let ids = DriveIdentityAllocator::new(client).allocate(3).await.unwrap();

    let ids: Vec<&str> = ids.iter().map(|i| i.as_str()).collect();
    assert_eq!(ids, vec!["idA", "idB", "idC"]);
}

#[tokio::test]
async fn test_allocate_zero_makes_no_request() {
    let (server, client) = common::setup_drive_mock().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let ids = DriveIdentityAllocator::new(client).allocate(0).await.unwrap();
    assert!(ids.is_empty());
}

#[tokio::test]
async fn test_allocate_fails_on_server_error() {
    let (server, client) = common::setup_drive_mock().await;
    Mock::given(method("GET"))
        .and(path("/drive/v3/files/generateIds"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    assert!(DriveIdentityAllocator::new(client).allocate(2).await.is_err());
}
