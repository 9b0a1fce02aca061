//! Shared test helpers for Drive API integration tests
//!
//! Each helper mounts the mock endpoints a test needs; [`setup_drive_mock`]
//! returns a DriveClient whose three endpoints point at the mock server.

use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use gdpath_core::domain::RemoteId;
use gdpath_drive::client::DriveClient;

/// Access token every mocked request is expected to carry
pub const TEST_TOKEN: &str = "test-access-token";

/// Starts a mock server and returns a client pointed at it
pub async fn setup_drive_mock() -> (MockServer, DriveClient) {
    let server = MockServer::start().await;
    let client = DriveClient::with_base_url(TEST_TOKEN, &server.uri());
    (server, client)
}

pub fn id(s: &str) -> RemoteId {
    RemoteId::new(s.to_string()).unwrap()
}

/// A list page with `count` files named `{prefix}-{i}`
pub fn file_page(prefix: &str, count: usize, next: Option<&str>) -> serde_json::Value {
    let files: Vec<serde_json::Value> = (0..count)
        .map(|i| serde_json::json!({ "id": format!("{prefix}{i}"), "name": format!("{prefix}-{i}") }))
        .collect();
    match next {
        Some(token) => serde_json::json!({ "files": files, "nextPageToken": token }),
        None => serde_json::json!({ "files": files }),
    }
}

/// Mounts `GET /files/{id}?fields=parents`
pub async fn mount_parents(server: &MockServer, file_id: &str, parents: &[&str]) {
    Mock::given(method("GET"))
        .and(path(format!("/drive/v3/files/{file_id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "parents": parents
        })))
        .mount(server)
        .await;
}

/// Mounts a Google-style error answer for any files request
pub async fn mount_files_error(server: &MockServer, status: u16, message: &str, reason: &str) {
    Mock::given(path_regex(r"^/drive/v3/files"))
        .respond_with(ResponseTemplate::new(status).set_body_json(serde_json::json!({
            "error": {
                "code": status,
                "message": message,
                "errors": [{ "reason": reason, "message": message }]
            }
        })))
        .mount(server)
        .await;
}
