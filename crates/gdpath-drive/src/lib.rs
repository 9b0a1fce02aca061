//! gdpath Drive - Google Drive adapter and resilient call executor
//!
//! Provides:
//! - A [`RemoteStore`](gdpath_core::ports::RemoteStore) implementation over
//!   the Drive v3 and Sheets v4 REST APIs
//! - Credential loading and refresh for the two service handles
//! - The call executor: retry with rate-limit backoff, fatal retry ceiling,
//!   and page aggregation for list calls
//!
//! ## Modules
//!
//! - [`client`] - HTTP client, one handler per [`DriveOp`](gdpath_core::ports::DriveOp) variant
//! - [`credentials`] - Stored OAuth credentials, validity and refresh
//! - [`executor`] - Retry policy and the [`Executor`](executor::Executor)
//! - [`jitter`] - Deterministic per-process jitter seed
//! - [`query`] - Rendering of structured queries into the Drive query language
//! - [`upload`] - Multipart upload bodies

pub mod client;
pub mod credentials;
pub mod executor;
pub mod jitter;
pub mod query;
pub mod upload;

use anyhow::{Context, Result};
use gdpath_core::config::DriveConfig;
use gdpath_core::ports::ApiError;
use thiserror::Error;
use tracing::info;

use crate::client::DriveClient;
use crate::credentials::Credentials;

/// Fatal failures of the call executor
///
/// Transient failures never surface here; they are absorbed by the retry loop
/// until the retry ceiling is reached.
#[derive(Debug, Error)]
pub enum ExecError {
    /// The call kept failing past the retry ceiling
    #[error("{op} failed after {attempts} attempts: {source}")]
    RetriesExhausted {
        /// Command tag of the failing call
        op: &'static str,
        /// Attempts made, including the first
        attempts: u32,
        /// Error of the last attempt
        #[source]
        source: ApiError,
    },

    /// The store answered with a reply of the wrong shape
    #[error("{op} returned an unexpected reply")]
    UnexpectedReply {
        /// Command tag of the call
        op: &'static str,
    },
}

/// Loads the stored credentials, refreshes them when expired, and opens the
/// object-store and sheet-store handles
///
/// This is the once-per-process initialisation; the interactive consent flow
/// that first writes the credential file is outside gdpath.
pub async fn connect(config: &DriveConfig) -> Result<DriveClient> {
    let path = Credentials::find(config.credentials.as_deref())
        .context("No credentials.json found (run the setup flow first)")?;
    let mut credentials = Credentials::load(&path)?;

    if !credentials.is_valid() && credentials.can_refresh() {
        info!(path = %path.display(), "Access token expired, refreshing");
        credentials = credentials.refreshed().await?;
        credentials.save(&path)?;
    }

    DriveClient::connect(&credentials, config)
}
