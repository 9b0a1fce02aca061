//! Integration tests for the executor retrying real HTTP failures

use gdpath_core::domain::RemoteId;
use gdpath_core::ports::{ApiError, FileMetadata};
use gdpath_drive::executor::{Executor, RetryPolicy};
use gdpath_drive::ExecError;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::common;

fn quota_body() -> serde_json::Value {
    serde_json::json!({
        "error": {
            "code": 403,
            "message": "User Rate Limit Exceeded",
            "errors": [{ "reason": "userRateLimitExceeded" }]
        }
    })
}

#[tokio::test]
async fn test_quota_errors_are_retried_until_success() {
    let (server, client) = common::setup_drive_mock().await;

    Mock::given(method("POST"))
        .and(path("/drive/v3/files"))
        .respond_with(ResponseTemplate::new(403).set_body_json(quota_body()))
        .up_to_n_times(3)
        .expect(3)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/drive/v3/files"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "id": "made-it" })))
        .expect(1)
        .mount(&server)
        .await;

    let executor = Executor::new(client, RetryPolicy::immediate(10));
    let id = executor
        .create(FileMetadata::folder("a", RemoteId::root()))
        .await
        .expect("create should succeed after retries");

    assert_eq!(id, common::id("made-it"));
}

#[tokio::test]
async fn test_persistent_failure_is_fatal() {
    let (server, client) = common::setup_drive_mock().await;

    Mock::given(method("DELETE"))
        .and(path("/drive/v3/files/doomed"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Backend Error"))
        .expect(4)
        .mount(&server)
        .await;

    let executor = Executor::new(client, RetryPolicy::immediate(3));
    let err = executor.delete(&common::id("doomed")).await.unwrap_err();

    match err {
        ExecError::RetriesExhausted {
            op,
            attempts,
            source,
        } => {
            assert_eq!(op, "delete");
            assert_eq!(attempts, 4);
            assert_eq!(
                source,
                ApiError::Status {
                    status: 500,
                    message: "Backend Error".into()
                }
            );
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
