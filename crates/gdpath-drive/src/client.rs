//! Google Drive / Sheets HTTP client
//!
//! [`DriveClient`] implements [`RemoteStore`] over the Drive v3 REST API (the
//! object store) and the Sheets v4 REST API (the sheet store). Each
//! [`DriveOp`] maps to one handler; a handler performs exactly one attempt and
//! maps every failure into an [`ApiError`]. Retrying is the executor's job.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use gdpath_core::config::DriveConfig;
//! use gdpath_core::domain::RemoteId;
//! use gdpath_core::ports::{DriveOp, RemoteStore};
//! use gdpath_drive::client::DriveClient;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = DriveClient::new("access-token-here", &DriveConfig::default());
//! let reply = client.call(&DriveOp::Get { id: RemoteId::root() }).await?;
//! # Ok(())
//! # }
//! ```

use anyhow::{bail, Result};
use async_trait::async_trait;
use gdpath_core::config::DriveConfig;
use gdpath_core::domain::RemoteId;
use gdpath_core::ports::{
    ApiError, DriveOp, DriveReply, FieldSelector, FileMetadata, FilePage, FileQuery, Media,
    RemoteStore,
};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, trace};

use crate::credentials::Credentials;
use crate::query;
use crate::upload::MultipartBody;

// ============================================================================
// API response types
// ============================================================================

/// Response carrying only an object ID
#[derive(Debug, Deserialize)]
struct IdResponse {
    id: RemoteId,
}

/// Response of `files.get?fields=parents`
#[derive(Debug, Deserialize)]
struct ParentsResponse {
    #[serde(default)]
    parents: Vec<RemoteId>,
}

/// Response of `spreadsheets.create`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpreadsheetResponse {
    spreadsheet_id: RemoteId,
}

/// Standard Google API error envelope
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: Option<String>,
    #[serde(default)]
    errors: Vec<ErrorItem>,
}

#[derive(Debug, Deserialize)]
struct ErrorItem {
    reason: Option<String>,
}

/// Builds the message of a failed response from its body
///
/// The reason code is appended so rate-limit reasons stay visible even when
/// the service words the message differently.
fn error_message(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => {
            let message = envelope
                .error
                .message
                .unwrap_or_else(|| status.to_string());
            match envelope.error.errors.iter().find_map(|e| e.reason.as_deref()) {
                Some(reason) => format!("{message} ({reason})"),
                None => message,
            }
        }
        Err(_) if body.trim().is_empty() => status.to_string(),
        Err(_) => body.trim().to_string(),
    }
}

fn transport_error(err: reqwest::Error) -> ApiError {
    if err.is_decode() {
        ApiError::Decode(err.to_string())
    } else {
        ApiError::Transport(err.to_string())
    }
}

// ============================================================================
// DriveClient
// ============================================================================

/// Authorized handles on the object store and the sheet store
pub struct DriveClient {
    http: Client,
    api_url: String,
    upload_url: String,
    sheets_url: String,
    access_token: String,
    page_size: u32,
}

impl std::fmt::Debug for DriveClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriveClient")
            .field("api_url", &self.api_url)
            .field("upload_url", &self.upload_url)
            .field("sheets_url", &self.sheets_url)
            .field("page_size", &self.page_size)
            .finish_non_exhaustive()
    }
}

impl DriveClient {
    /// Opens both service handles with valid credentials
    ///
    /// # Errors
    /// Fails if the credentials are not valid; refreshing them is up to the
    /// caller.
    pub fn connect(credentials: &Credentials, config: &DriveConfig) -> Result<Self> {
        if !credentials.is_valid() {
            bail!("Stored credentials are invalid or expired; re-run the setup flow");
        }
        debug!(api_url = %config.api_url, "Opening drive client");
        Ok(Self::new(credentials.access_token.clone(), config))
    }

    /// Creates a client for an access token and endpoint configuration
    pub fn new(access_token: impl Into<String>, config: &DriveConfig) -> Self {
        Self {
            http: Client::new(),
            api_url: config.api_url.trim_end_matches('/').to_string(),
            upload_url: config.upload_url.trim_end_matches('/').to_string(),
            sheets_url: config.sheets_url.trim_end_matches('/').to_string(),
            access_token: access_token.into(),
            page_size: config.page_size,
        }
    }

    /// Creates a client whose three endpoints live under one base URL
    /// (useful for testing)
    pub fn with_base_url(access_token: impl Into<String>, base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        let config = DriveConfig {
            api_url: format!("{base}/drive/v3"),
            upload_url: format!("{base}/upload/drive/v3"),
            sheets_url: format!("{base}/v4"),
            ..DriveConfig::default()
        };
        Self::new(access_token, &config)
    }

    /// Overrides the list page size
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    // ========================================================================
    // Request plumbing
    // ========================================================================

    fn request(&self, method: Method, url: String) -> RequestBuilder {
        trace!(%method, %url, "Drive request");
        self.http.request(method, url).bearer_auth(&self.access_token)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = error_message(status, &body);
        debug!(status = status.as_u16(), %message, "Drive request failed");

        if status == StatusCode::UNAUTHORIZED {
            Err(ApiError::Unauthorized(message))
        } else {
            Err(ApiError::Status {
                status: status.as_u16(),
                message,
            })
        }
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        self.send(request)
            .await?
            .json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    fn file_url(&self, id: &RemoteId) -> String {
        format!("{}/files/{}", self.api_url, id)
    }

    // ========================================================================
    // Handlers, one per operation
    // ========================================================================

    async fn list(
        &self,
        query: &FileQuery,
        fields: &FieldSelector,
        page_token: Option<&str>,
    ) -> Result<FilePage, ApiError> {
        let mut params = vec![
            ("q", query::render(query)),
            ("pageSize", self.page_size.to_string()),
            ("fields", format!("nextPageToken,files({})", fields.as_str())),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token.to_string()));
        }

        let request = self
            .request(Method::GET, format!("{}/files", self.api_url))
            .query(&params);
        self.send_json(request).await
    }

    async fn get_parents(&self, id: &RemoteId) -> Result<Vec<RemoteId>, ApiError> {
        let request = self
            .request(Method::GET, self.file_url(id))
            .query(&[("fields", "parents")]);
        let response: ParentsResponse = self.send_json(request).await?;
        Ok(response.parents)
    }

    async fn create(&self, metadata: &FileMetadata) -> Result<RemoteId, ApiError> {
        let request = self
            .request(Method::POST, format!("{}/files", self.api_url))
            .query(&[("fields", "id")])
            .json(metadata);
        let response: IdResponse = self.send_json(request).await?;
        Ok(response.id)
    }

    async fn rename(&self, id: &RemoteId, name: &str) -> Result<(), ApiError> {
        let request = self
            .request(Method::PATCH, self.file_url(id))
            .query(&[("fields", "id")])
            .json(&serde_json::json!({ "name": name }));
        self.send(request).await?;
        Ok(())
    }

    async fn delete(&self, id: &RemoteId) -> Result<(), ApiError> {
        self.send(self.request(Method::DELETE, self.file_url(id)))
            .await?;
        Ok(())
    }

    /// Reads the current parents, then swaps all of them for `new_parent`
    async fn move_to(&self, id: &RemoteId, new_parent: &RemoteId) -> Result<(), ApiError> {
        let previous = self.get_parents(id).await?;
        let remove = previous
            .iter()
            .map(RemoteId::as_str)
            .collect::<Vec<_>>()
            .join(",");

        let request = self
            .request(Method::PATCH, self.file_url(id))
            .query(&[
                ("addParents", new_parent.as_str()),
                ("removeParents", remove.as_str()),
                ("fields", "id,parents"),
            ])
            .json(&serde_json::json!({}));
        self.send(request).await?;
        Ok(())
    }

    async fn upload(&self, metadata: &FileMetadata, media: &Media) -> Result<RemoteId, ApiError> {
        let body = MultipartBody::new(metadata, media)
            .map_err(|e| ApiError::Decode(format!("cannot encode metadata: {e}")))?;

        let request = self
            .request(Method::POST, format!("{}/files", self.upload_url))
            .query(&[("uploadType", "multipart"), ("fields", "id")])
            .header(reqwest::header::CONTENT_TYPE, body.content_type())
            .body(body.into_bytes());
        let response: IdResponse = self.send_json(request).await?;
        Ok(response.id)
    }

    async fn create_sheet(&self, title: &str) -> Result<RemoteId, ApiError> {
        let request = self
            .request(Method::POST, format!("{}/spreadsheets", self.sheets_url))
            .json(&serde_json::json!({ "properties": { "title": title } }));
        let response: SpreadsheetResponse = self.send_json(request).await?;
        Ok(response.spreadsheet_id)
    }

    async fn format_sheet(
        &self,
        spreadsheet_id: &RemoteId,
        requests: &serde_json::Value,
    ) -> Result<(), ApiError> {
        let url = format!("{}/spreadsheets/{}:batchUpdate", self.sheets_url, spreadsheet_id);
        let request = self
            .request(Method::POST, url)
            .json(&serde_json::json!({ "requests": requests }));
        self.send(request).await?;
        Ok(())
    }
}

#[async_trait]
impl RemoteStore for DriveClient {
    async fn call(&self, op: &DriveOp) -> Result<DriveReply, ApiError> {
        match op {
            DriveOp::List {
                query,
                fields,
                page_token,
            } => self
                .list(query, fields, page_token.as_deref())
                .await
                .map(DriveReply::Page),
            DriveOp::Get { id } => self.get_parents(id).await.map(DriveReply::Parents),
            DriveOp::Create { metadata } => self.create(metadata).await.map(DriveReply::Created),
            DriveOp::Rename { id, name } => {
                self.rename(id, name).await.map(|()| DriveReply::Done)
            }
            DriveOp::Delete { id } => self.delete(id).await.map(|()| DriveReply::Done),
            DriveOp::Move { id, new_parent } => {
                self.move_to(id, new_parent).await.map(|()| DriveReply::Done)
            }
            DriveOp::Upload { metadata, media } => {
                self.upload(metadata, media).await.map(DriveReply::Created)
            }
            DriveOp::CreateSheet { title } => {
                self.create_sheet(title).await.map(DriveReply::Sheet)
            }
            DriveOp::FormatSheet {
                spreadsheet_id,
                requests,
            } => self
                .format_sheet(spreadsheet_id, requests)
                .await
                .map(|()| DriveReply::Done),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;

    #[test]
    fn test_with_base_url_layout() {
        let client = DriveClient::with_base_url("token", "http://localhost:1234/");
        assert_eq!(client.api_url(), "http://localhost:1234/drive/v3");
        assert_eq!(client.upload_url, "http://localhost:1234/upload/drive/v3");
        assert_eq!(client.sheets_url, "http://localhost:1234/v4");
        assert_eq!(client.page_size(), 1000);
    }

    #[test]
    fn test_connect_rejects_invalid_credentials() {
        let mut creds = Credentials::from_access_token("abc");
        creds.token_expiry = Some(Utc::now() - Duration::hours(2));
        assert!(DriveClient::connect(&creds, &DriveConfig::default()).is_err());

        let creds = Credentials::from_access_token("abc");
        assert!(DriveClient::connect(&creds, &DriveConfig::default()).is_ok());
    }

    #[test]
    fn test_debug_hides_token() {
        let client = DriveClient::new("secret-token", &DriveConfig::default());
        assert!(!format!("{client:?}").contains("secret-token"));
    }

    #[test]
    fn test_error_message_with_reason() {
        let body = r#"{
            "error": {
                "code": 403,
                "message": "Quota exceeded for quota metric 'Queries'",
                "errors": [{"reason": "rateLimitExceeded", "domain": "usageLimits"}]
            }
        }"#;
        let message = error_message(StatusCode::FORBIDDEN, body);
        assert_eq!(
            message,
            "Quota exceeded for quota metric 'Queries' (rateLimitExceeded)"
        );
    }

    #[test]
    fn test_error_message_without_json() {
        assert_eq!(
            error_message(StatusCode::BAD_GATEWAY, "upstream went away\n"),
            "upstream went away"
        );
        assert_eq!(
            error_message(StatusCode::NOT_FOUND, ""),
            StatusCode::NOT_FOUND.to_string()
        );
    }

    #[test]
    fn test_response_deserialization() {
        let parents: ParentsResponse = serde_json::from_str(r#"{"parents": ["a", "b"]}"#).unwrap();
        assert_eq!(parents.parents.len(), 2);

        let parents: ParentsResponse = serde_json::from_str("{}").unwrap();
        assert!(parents.parents.is_empty());

        let sheet: SpreadsheetResponse =
            serde_json::from_str(r#"{"spreadsheetId": "1xYz_9", "properties": {}}"#).unwrap();
        assert_eq!(sheet.spreadsheet_id.as_str(), "1xYz_9");
    }
}
