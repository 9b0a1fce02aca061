//! Integration tests for mutating calls: create, rename, delete, move,
//! upload and the sheet store

use gdpath_core::domain::RemoteId;
use gdpath_core::ports::{
    DriveOp, DriveReply, FileMetadata, Media, RemoteStore, FOLDER_MIME, SPREADSHEET_MIME,
};
use wiremock::matchers::{body_json, body_string_contains, header_regex, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use crate::common;

// ============================================================================
// Object store
// ============================================================================

#[tokio::test]
async fn test_create_folder() {
    let (server, client) = common::setup_drive_mock().await;

    Mock::given(method("POST"))
        .and(path("/drive/v3/files"))
        .and(query_param("fields", "id"))
        .and(body_json(serde_json::json!({
            "name": "reports",
            "mimeType": FOLDER_MIME,
            "parents": ["root"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "new-folder-1"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let op = DriveOp::Create {
        metadata: FileMetadata::folder("reports", RemoteId::root()),
    };
    let reply = client.call(&op).await.expect("create failed");
    assert_eq!(reply, DriveReply::Created(common::id("new-folder-1")));
}

#[tokio::test]
async fn test_rename() {
    let (server, client) = common::setup_drive_mock().await;

    Mock::given(method("PATCH"))
        .and(path("/drive/v3/files/file1"))
        .and(body_json(serde_json::json!({ "name": "file.bak" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "id": "file1" })))
        .expect(1)
        .mount(&server)
        .await;

    let op = DriveOp::Rename {
        id: common::id("file1"),
        name: "file.bak".into(),
    };
    assert_eq!(client.call(&op).await.unwrap(), DriveReply::Done);
}

#[tokio::test]
async fn test_delete() {
    let (server, client) = common::setup_drive_mock().await;

    Mock::given(method("DELETE"))
        .and(path("/drive/v3/files/file1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let op = DriveOp::Delete {
        id: common::id("file1"),
    };
    assert_eq!(client.call(&op).await.unwrap(), DriveReply::Done);
}

#[tokio::test]
async fn test_move_replaces_all_parents() {
    let (server, client) = common::setup_drive_mock().await;

    common::mount_parents(&server, "file1", &["p1", "p2"]).await;
    Mock::given(method("PATCH"))
        .and(path("/drive/v3/files/file1"))
        .and(query_param("addParents", "old1"))
        .and(query_param("removeParents", "p1,p2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "file1",
            "parents": ["old1"]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let op = DriveOp::Move {
        id: common::id("file1"),
        new_parent: common::id("old1"),
    };
    assert_eq!(client.call(&op).await.unwrap(), DriveReply::Done);
}

#[tokio::test]
async fn test_get_parents() {
    let (server, client) = common::setup_drive_mock().await;
    common::mount_parents(&server, "file1", &["p1"]).await;

    let op = DriveOp::Get {
        id: common::id("file1"),
    };
    assert_eq!(
        client.call(&op).await.unwrap(),
        DriveReply::Parents(vec![common::id("p1")])
    );
}

#[tokio::test]
async fn test_multipart_upload() {
    let (server, client) = common::setup_drive_mock().await;

    Mock::given(method("POST"))
        .and(path("/upload/drive/v3/files"))
        .and(query_param("uploadType", "multipart"))
        .and(header_regex("content-type", "^multipart/related; boundary="))
        .and(body_string_contains(r#""name":"data.tsv""#))
        .and(body_string_contains("col1\tcol2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "uploaded-1"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let op = DriveOp::Upload {
        metadata: FileMetadata::spreadsheet("data.tsv", common::id("folder1")),
        media: Media::new("text/tab-separated-values", b"col1\tcol2\n1\t2\n".to_vec()),
    };
    assert_eq!(
        client.call(&op).await.unwrap(),
        DriveReply::Created(common::id("uploaded-1"))
    );

    let requests = server.received_requests().await.unwrap();
    let body = String::from_utf8_lossy(&requests[0].body);
    assert!(body.contains(SPREADSHEET_MIME));
}

// ============================================================================
// Sheet store
// ============================================================================

#[tokio::test]
async fn test_create_sheet() {
    let (server, client) = common::setup_drive_mock().await;

    Mock::given(method("POST"))
        .and(path("/v4/spreadsheets"))
        .and(body_json(serde_json::json!({ "properties": { "title": "results" } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "spreadsheetId": "sheet-1",
            "properties": { "title": "results" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let op = DriveOp::CreateSheet {
        title: "results".into(),
    };
    assert_eq!(
        client.call(&op).await.unwrap(),
        DriveReply::Sheet(common::id("sheet-1"))
    );
}

#[tokio::test]
async fn test_format_sheet() {
    let (server, client) = common::setup_drive_mock().await;

    let requests = serde_json::json!([{ "updateSheetProperties": { "fields": "gridProperties.frozenRowCount" } }]);
    Mock::given(method("POST"))
        .and(path("/v4/spreadsheets/sheet-1:batchUpdate"))
        .and(body_json(serde_json::json!({ "requests": requests.clone() })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "spreadsheetId": "sheet-1",
            "replies": [{}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let op = DriveOp::FormatSheet {
        spreadsheet_id: common::id("sheet-1"),
        requests,
    };
    assert_eq!(client.call(&op).await.unwrap(), DriveReply::Done);
}
