//! Domain error types
//!
//! Validation failures raised while constructing domain values.

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Invalid logical path (e.g. contains a `..` segment)
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Invalid object name used as a path segment
    #[error("Invalid name: {0}")]
    InvalidName(String),

    /// Invalid remote ID format
    #[error("Invalid remote ID: {0}")]
    InvalidRemoteId(String),
}
