//! gdpath Sync - Path resolution and drive operations
//!
//! Provides:
//! - The path resolver: logical paths to remote IDs with a process-local
//!   cache, read-only lookups and on-demand folder chain creation
//! - The cross-process folder-creation lock
//! - The operation layer built on both (listing, upload, backup, ...)
//!
//! ## Modules
//!
//! - [`lock`] - File-based mutual-exclusion guard with bounded wait
//! - [`resolver`] - [`PathResolver`](resolver::PathResolver) and its cache
//! - [`ops`] - [`DriveOps`](ops::DriveOps), the commands the CLI exposes

pub mod lock;
pub mod ops;
pub mod resolver;

#[cfg(test)]
pub(crate) mod testing;

use gdpath_core::domain::DomainError;
use gdpath_drive::ExecError;
use thiserror::Error;

use crate::lock::LockError;

/// Errors that can occur while resolving paths or running operations
#[derive(Debug, Error)]
pub enum SyncError {
    /// A remote call failed for good
    #[error(transparent)]
    Remote(#[from] ExecError),

    /// The folder-creation lock could not be taken
    #[error(transparent)]
    Lock(#[from] LockError),

    /// The operation is disallowed by policy; no remote call was made
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// The logical path does not name a remote object
    #[error("Not found on remote: {0}")]
    NotFound(String),

    /// A domain-level error propagated from gdpath-core
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    /// An I/O error occurred reading local files
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SyncError {
    /// Whether this error stems from the retry ceiling or the lock wait
    /// budget rather than from the request itself
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SyncError::Remote(ExecError::RetriesExhausted { .. })
                | SyncError::Lock(LockError::Timeout { .. })
        )
    }
}
