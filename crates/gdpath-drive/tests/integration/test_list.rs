//! Integration tests for list calls and their aggregation

use gdpath_core::domain::RemoteId;
use gdpath_core::ports::{ApiError, DriveOp, DriveReply, FieldSelector, FileQuery, RemoteStore};
use gdpath_drive::executor::{Executor, RetryPolicy};
use wiremock::matchers::{header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, ResponseTemplate};

use crate::common;

#[tokio::test]
async fn test_list_sends_query_and_fields() {
    let (server, client) = common::setup_drive_mock().await;

    Mock::given(method("GET"))
        .and(path("/drive/v3/files"))
        .and(header("authorization", "Bearer test-access-token"))
        .and(query_param(
            "q",
            "trashed = false and mimeType = 'application/vnd.google-apps.folder' \
             and 'root' in parents and name = 'reports'",
        ))
        .and(query_param("pageSize", "1000"))
        .and(query_param("fields", "nextPageToken,files(id,name)"))
        .and(query_param_is_missing("pageToken"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "files": [{ "id": "folder1", "name": "reports" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let op = DriveOp::List {
        query: FileQuery::folder_named(&RemoteId::root(), "reports"),
        fields: FieldSelector::basic(),
        page_token: None,
    };
    let reply = client.call(&op).await.expect("list failed");

    let DriveReply::Page(page) = reply else {
        panic!("expected a page, got {reply:?}");
    };
    let files = page.files.unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].id, common::id("folder1"));
    assert!(page.next_page_token.is_none());
}

#[tokio::test]
async fn test_list_all_follows_three_pages() {
    let (server, client) = common::setup_drive_mock().await;

    Mock::given(method("GET"))
        .and(path("/drive/v3/files"))
        .and(query_param_is_missing("pageToken"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(common::file_page("a", 1000, Some("p2"))),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/drive/v3/files"))
        .and(query_param("pageToken", "p2"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(common::file_page("b", 1000, Some("p3"))),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/drive/v3/files"))
        .and(query_param("pageToken", "p3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::file_page("c", 42, None)))
        .expect(1)
        .mount(&server)
        .await;

    let executor = Executor::new(client, RetryPolicy::immediate(10));
    let files = executor
        .list_all(&FileQuery::children_of(&RemoteId::root()), &FieldSelector::basic())
        .await
        .expect("list_all failed");

    assert_eq!(files.len(), 2042);
    assert_eq!(files[0].name, "a-0");
    assert_eq!(files[2041].name, "c-41");
}

#[tokio::test]
async fn test_list_without_files_field_is_empty() {
    let (server, client) = common::setup_drive_mock().await;

    Mock::given(method("GET"))
        .and(path("/drive/v3/files"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "kind": "drive#fileList" })),
        )
        .mount(&server)
        .await;

    let executor = Executor::new(client, RetryPolicy::immediate(10));
    let files = executor
        .list_all(&FileQuery::default(), &FieldSelector::listing())
        .await
        .unwrap();
    assert!(files.is_empty());
}

#[tokio::test]
async fn test_listing_fields_are_decoded() {
    let (server, client) = common::setup_drive_mock().await;

    Mock::given(method("GET"))
        .and(path("/drive/v3/files"))
        .and(query_param(
            "fields",
            "nextPageToken,files(id,name,createdTime,mimeType)",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "files": [{
                "id": "f1",
                "name": "dmesg.txt",
                "mimeType": "text/plain",
                "createdTime": "2026-03-01T12:34:56.789Z"
            }]
        })))
        .mount(&server)
        .await;

    let executor = Executor::new(client, RetryPolicy::immediate(10));
    let files = executor
        .list_all(&FileQuery::default(), &FieldSelector::listing())
        .await
        .unwrap();

    assert_eq!(files[0].mime_type.as_deref(), Some("text/plain"));
    assert_eq!(
        files[0].created_time.as_deref(),
        Some("2026-03-01T12:34:56.789Z")
    );
}

#[tokio::test]
async fn test_unauthorized_is_mapped() {
    let (server, client) = common::setup_drive_mock().await;
    common::mount_files_error(&server, 401, "Invalid Credentials", "authError").await;

    let op = DriveOp::List {
        query: FileQuery::default(),
        fields: FieldSelector::basic(),
        page_token: None,
    };
    let err = client.call(&op).await.unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized(ref m) if m.contains("Invalid Credentials")));
}

#[tokio::test]
async fn test_quota_error_is_recognised() {
    let (server, client) = common::setup_drive_mock().await;
    common::mount_files_error(&server, 403, "User Rate Limit Exceeded", "userRateLimitExceeded")
        .await;

    let op = DriveOp::Get {
        id: common::id("abc"),
    };
    let err = client.call(&op).await.unwrap_err();
    assert!(matches!(err, ApiError::Status { status: 403, .. }));
    assert!(err.is_quota());
}
