//! Remote store port (driven/secondary port)
//!
//! This module defines the single seam between gdpath and the remote
//! hierarchical object store. Every remote call is one [`DriveOp`] variant;
//! an implementation of [`RemoteStore`] performs exactly one attempt of it and
//! answers with a [`DriveReply`]. Retrying, backoff and pagination live in the
//! executor on top of this port, never in the adapters.
//!
//! ## Design Notes
//!
//! - The DTOs here double as the wire representation of the Drive v3 API
//!   (camelCase JSON), so adapters can (de)serialize them directly.
//! - Trashed objects are excluded from every [`FileQuery`].

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::newtypes::{ObjectKind, RemoteId};

/// MIME type the remote store uses for folders
pub const FOLDER_MIME: &str = "application/vnd.google-apps.folder";

/// MIME type of a native spreadsheet document
pub const SPREADSHEET_MIME: &str = "application/vnd.google-apps.spreadsheet";

// ============================================================================
// Queries
// ============================================================================

/// Restricts a query to folders, non-folders, or neither
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KindFilter {
    #[default]
    Any,
    FoldersOnly,
    FilesOnly,
}

/// Structured search over non-trashed objects
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FileQuery {
    /// Only objects having this parent
    pub parent: Option<RemoteId>,
    /// Only objects with exactly this name
    pub name: Option<String>,
    /// Folder / file restriction
    pub kind: KindFilter,
}

impl FileQuery {
    /// Children of `parent`, any kind
    pub fn children_of(parent: &RemoteId) -> Self {
        Self {
            parent: Some(parent.clone()),
            ..Self::default()
        }
    }

    /// Objects named `name` directly under `parent`
    pub fn child_named(parent: &RemoteId, name: &str) -> Self {
        Self {
            parent: Some(parent.clone()),
            name: Some(name.to_string()),
            kind: KindFilter::Any,
        }
    }

    /// Folders named `name` directly under `parent`
    pub fn folder_named(parent: &RemoteId, name: &str) -> Self {
        Self {
            kind: KindFilter::FoldersOnly,
            ..Self::child_named(parent, name)
        }
    }

    /// Restrict the query to the given kind
    pub fn with_kind(mut self, kind: KindFilter) -> Self {
        self.kind = kind;
        self
    }

    /// Whether `file` satisfies this query (trashed state aside)
    pub fn matches(&self, file: &DriveFile, parents: &[RemoteId]) -> bool {
        if let Some(parent) = &self.parent {
            if !parents.contains(parent) {
                return false;
            }
        }
        if let Some(name) = &self.name {
            if &file.name != name {
                return false;
            }
        }
        match self.kind {
            KindFilter::Any => true,
            KindFilter::FoldersOnly => file.kind() == ObjectKind::Folder,
            KindFilter::FilesOnly => file.kind() == ObjectKind::File,
        }
    }
}

/// Per-file fields requested from a list call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSelector(String);

impl FieldSelector {
    /// A custom selector, e.g. `"id,name,size"`
    pub fn new(fields: impl Into<String>) -> Self {
        Self(fields.into())
    }

    /// `id,name` - enough for path resolution
    pub fn basic() -> Self {
        Self::new("id,name")
    }

    /// `id,name,createdTime,mimeType` - used for folder listings
    pub fn listing() -> Self {
        Self::new("id,name,createdTime,mimeType")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for FieldSelector {
    fn default() -> Self {
        Self::basic()
    }
}

// ============================================================================
// Objects and metadata
// ============================================================================

/// A single object as returned by a list call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    pub id: RemoteId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// RFC 3339 creation timestamp, as sent by the service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<String>,
}

impl DriveFile {
    /// Folder when the MIME type is the folder type, file otherwise
    pub fn kind(&self) -> ObjectKind {
        match self.mime_type.as_deref() {
            Some(FOLDER_MIME) => ObjectKind::Folder,
            _ => ObjectKind::File,
        }
    }
}

/// One page of a list call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilePage {
    /// `None` when the service omitted the `files` field entirely
    #[serde(default)]
    pub files: Option<Vec<DriveFile>>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// Body of a create/upload call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<RemoteId>,
}

impl FileMetadata {
    /// A folder named `name` under `parent`
    pub fn folder(name: impl Into<String>, parent: RemoteId) -> Self {
        Self {
            name: name.into(),
            mime_type: Some(FOLDER_MIME.to_string()),
            parents: vec![parent],
        }
    }

    /// A plain file named `name` under `parent`
    pub fn file(name: impl Into<String>, parent: RemoteId) -> Self {
        Self {
            name: name.into(),
            mime_type: None,
            parents: vec![parent],
        }
    }

    /// A spreadsheet named `name` under `parent`; uploaded content is converted
    pub fn spreadsheet(name: impl Into<String>, parent: RemoteId) -> Self {
        Self {
            name: name.into(),
            mime_type: Some(SPREADSHEET_MIME.to_string()),
            parents: vec![parent],
        }
    }

    pub fn kind(&self) -> ObjectKind {
        match self.mime_type.as_deref() {
            Some(FOLDER_MIME) => ObjectKind::Folder,
            _ => ObjectKind::File,
        }
    }
}

/// Content handle for uploads
#[derive(Clone, PartialEq, Eq)]
pub struct Media {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl Media {
    pub fn new(mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            bytes,
        }
    }
}

impl fmt::Debug for Media {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Media")
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

// ============================================================================
// Operations and replies
// ============================================================================

/// One remote call
#[derive(Debug, Clone, PartialEq)]
pub enum DriveOp {
    /// One page of matching objects; `page_token` continues a previous page
    List {
        query: FileQuery,
        fields: FieldSelector,
        page_token: Option<String>,
    },
    /// Parent references of an object
    Get { id: RemoteId },
    /// Create an object without content (folders, placeholders)
    Create { metadata: FileMetadata },
    Rename { id: RemoteId, name: String },
    Delete { id: RemoteId },
    /// Replace every current parent of `id` with `new_parent`
    Move { id: RemoteId, new_parent: RemoteId },
    /// Create a file object with content
    Upload { metadata: FileMetadata, media: Media },
    /// Create an empty spreadsheet in the sheet service
    CreateSheet { title: String },
    /// Batch-format a spreadsheet; `requests` is the service's request list
    FormatSheet {
        spreadsheet_id: RemoteId,
        requests: serde_json::Value,
    },
}

impl DriveOp {
    /// Stable command tag, used in logs
    pub fn name(&self) -> &'static str {
        match self {
            DriveOp::List { .. } => "list",
            DriveOp::Get { .. } => "get",
            DriveOp::Create { .. } => "create",
            DriveOp::Rename { .. } => "rename",
            DriveOp::Delete { .. } => "delete",
            DriveOp::Move { .. } => "move",
            DriveOp::Upload { .. } => "upload",
            DriveOp::CreateSheet { .. } => "createsheet",
            DriveOp::FormatSheet { .. } => "formatsheet",
        }
    }
}

/// Answer to a [`DriveOp`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriveReply {
    /// Answer to `List`
    Page(FilePage),
    /// Answer to `Get`
    Parents(Vec<RemoteId>),
    /// Answer to `Create` and `Upload`
    Created(RemoteId),
    /// Answer to `Rename`, `Delete`, `Move` and `FormatSheet`
    Done,
    /// Answer to `CreateSheet`
    Sheet(RemoteId),
}

// ============================================================================
// Errors
// ============================================================================

/// Text fragments the service uses when a rate or quota limit is hit
const QUOTA_MARKERS: &[&str] = &[
    "User Rate Limit Exceeded",
    "Rate Limit Exceeded",
    "Quota exceeded",
    "rateLimitExceeded",
    "userRateLimitExceeded",
];

/// Failure of a single remote call attempt
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// The service answered with a non-success status
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// Credentials were rejected
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The request never produced a response
    #[error("Transport error: {0}")]
    Transport(String),

    /// The response could not be decoded
    #[error("Invalid response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Whether this failure is a rate/quota limit
    pub fn is_quota(&self) -> bool {
        if let ApiError::Status { status: 429, .. } = self {
            return true;
        }
        let text = self.to_string();
        QUOTA_MARKERS.iter().any(|marker| text.contains(marker))
    }
}

// ============================================================================
// RemoteStore trait
// ============================================================================

/// Port trait for the remote object store
///
/// Implementations perform exactly one attempt per call and must not retry;
/// the executor owns the retry policy.
#[async_trait::async_trait]
pub trait RemoteStore: Send + Sync {
    /// Performs one attempt of `op`
    async fn call(&self, op: &DriveOp) -> Result<DriveReply, ApiError>;
}

#[async_trait::async_trait]
impl<T: RemoteStore + ?Sized> RemoteStore for std::sync::Arc<T> {
    async fn call(&self, op: &DriveOp) -> Result<DriveReply, ApiError> {
        (**self).call(op).await
    }
}
