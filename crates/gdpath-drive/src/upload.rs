//! Multipart upload bodies
//!
//! The object store accepts metadata and content in a single
//! `multipart/related` request (`uploadType=multipart`): a JSON part with the
//! file metadata followed by the raw media part.
//!
//! ## References
//!
//! - [Perform a multipart upload](https://developers.google.com/drive/api/guides/manage-uploads#multipart)

use std::path::Path;

use chrono::Utc;
use gdpath_core::ports::{FileMetadata, Media};

/// Fallback content type for unknown extensions
pub const DEFAULT_MIME: &str = "application/octet-stream";

/// Tab-separated text, the source format of spreadsheet imports
pub const TSV_MIME: &str = "text/tab-separated-values";

/// A ready-to-send multipart/related request body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartBody {
    boundary: String,
    body: Vec<u8>,
}

impl MultipartBody {
    /// Builds the body for `metadata` and `media` with a fresh boundary
    pub fn new(metadata: &FileMetadata, media: &Media) -> Result<Self, serde_json::Error> {
        let boundary = format!(
            "gdpath_boundary_{}",
            Utc::now().timestamp_nanos_opt().unwrap_or_default()
        );
        Self::with_boundary(boundary, metadata, media)
    }

    /// Builds the body with a caller-chosen boundary
    pub fn with_boundary(
        boundary: impl Into<String>,
        metadata: &FileMetadata,
        media: &Media,
    ) -> Result<Self, serde_json::Error> {
        let boundary = boundary.into();
        let json = serde_json::to_vec(metadata)?;

        let mut body = Vec::with_capacity(json.len() + media.bytes.len() + 256);
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        body.extend_from_slice(b"Content-Type: application/json; charset=UTF-8\r\n\r\n");
        body.extend_from_slice(&json);
        body.extend_from_slice(format!("\r\n--{boundary}\r\n").as_bytes());
        body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", media.mime_type).as_bytes());
        body.extend_from_slice(&media.bytes);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        Ok(Self { boundary, body })
    }

    /// Value for the request's `Content-Type` header
    pub fn content_type(&self) -> String {
        format!("multipart/related; boundary={}", self.boundary)
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.body
    }
}

/// Guesses a content type from a local file's extension
pub fn guess_mime_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match ext.as_deref() {
        Some("tsv") => TSV_MIME,
        Some("csv") => "text/csv",
        Some("txt" | "log") => "text/plain",
        Some("html" | "htm") => "text/html",
        Some("json") => "application/json",
        Some("xml") => "application/xml",
        Some("gz" | "tgz") => "application/gzip",
        Some("zip") => "application/zip",
        Some("pdf") => "application/pdf",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("svg") => "image/svg+xml",
        _ => DEFAULT_MIME,
    }
}

#[cfg(test)]
mod tests {
    use gdpath_core::domain::RemoteId;

    use super::*;

    #[test]
    fn test_body_layout() {
        let meta = FileMetadata::file("out.txt", RemoteId::root());
        let media = Media::new("text/plain", b"hello".to_vec());

        let body = MultipartBody::with_boundary("XYZ", &meta, &media).unwrap();
        assert_eq!(body.content_type(), "multipart/related; boundary=XYZ");

        let text = String::from_utf8(body.into_bytes()).unwrap();
        let expected = "--XYZ\r\n\
            Content-Type: application/json; charset=UTF-8\r\n\r\n\
            {\"name\":\"out.txt\",\"parents\":[\"root\"]}\r\n\
            --XYZ\r\n\
            Content-Type: text/plain\r\n\r\n\
            hello\r\n\
            --XYZ--\r\n";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_binary_media_preserved() {
        let meta = FileMetadata::file("blob", RemoteId::root());
        let bytes: Vec<u8> = (0..=255).collect();
        let media = Media::new(DEFAULT_MIME, bytes.clone());

        let body = MultipartBody::with_boundary("B", &meta, &media)
            .unwrap()
            .into_bytes();
        assert!(body.windows(bytes.len()).any(|w| w == bytes.as_slice()));
    }

    #[test]
    fn test_fresh_boundary() {
        let meta = FileMetadata::file("a", RemoteId::root());
        let media = Media::new("text/plain", Vec::new());
        let body = MultipartBody::new(&meta, &media).unwrap();
        assert!(body.boundary().starts_with("gdpath_boundary_"));
    }

    #[test]
    fn test_guess_mime_type() {
        assert_eq!(guess_mime_type(Path::new("data.tsv")), TSV_MIME);
        assert_eq!(guess_mime_type(Path::new("REPORT.HTML")), "text/html");
        assert_eq!(guess_mime_type(Path::new("dmesg.log")), "text/plain");
        assert_eq!(guess_mime_type(Path::new("noext")), DEFAULT_MIME);
    }
}
