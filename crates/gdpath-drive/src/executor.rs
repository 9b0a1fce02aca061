//! Resilient call executor
//!
//! Wraps a [`RemoteStore`] with the retry policy every remote call goes
//! through:
//!
//! - Any failed attempt is retried. Rate-limit failures wait
//!   `quota_offset + seed.step() * quota_step`, everything else waits the
//!   fixed transient delay.
//! - After `max_retries` retries (so `max_retries + 1` attempts) the failure
//!   becomes fatal and surfaces as [`ExecError::RetriesExhausted`].
//! - List calls are aggregated across continuation tokens into one sequence.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use gdpath_core::ports::{FieldSelector, FileQuery};
//! use gdpath_core::domain::RemoteId;
//! use gdpath_drive::executor::{Executor, RetryPolicy};
//! # use gdpath_core::ports::RemoteStore;
//!
//! # async fn example(store: impl RemoteStore) -> Result<(), gdpath_drive::ExecError> {
//! let executor = Executor::new(store, RetryPolicy::default());
//! let files = executor
//!     .list_all(&FileQuery::children_of(&RemoteId::root()), &FieldSelector::basic())
//!     .await?;
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use gdpath_core::config::RetryConfig;
use gdpath_core::domain::RemoteId;
use gdpath_core::ports::{
    ApiError, DriveFile, DriveOp, DriveReply, FieldSelector, FileMetadata, FileQuery, Media,
    RemoteStore,
};
use tracing::{debug, error, info, warn};

use crate::jitter::JitterSeed;
use crate::ExecError;

// ============================================================================
// RetryPolicy
// ============================================================================

/// Retry ceiling and backoff delays
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt before a call is fatal
    pub max_retries: u32,
    /// Wait after an ordinary failure
    pub transient_delay: Duration,
    /// Fixed part of a rate-limit wait
    pub quota_offset: Duration,
    /// Per-step part of a rate-limit wait
    pub quota_step: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            transient_delay: config.transient_delay(),
            quota_offset: config.quota_offset(),
            quota_step: config.quota_step(),
        }
    }
}

impl RetryPolicy {
    /// A policy that retries without ever sleeping
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            max_retries,
            transient_delay: Duration::ZERO,
            quota_offset: Duration::ZERO,
            quota_step: Duration::ZERO,
        }
    }

    /// How long to wait before retrying after `err`
    pub fn delay_for(&self, err: &ApiError, seed: JitterSeed) -> Duration {
        if err.is_quota() {
            self.quota_offset + self.quota_step * seed.step()
        } else {
            self.transient_delay
        }
    }
}

// ============================================================================
// Executor
// ============================================================================

/// Runs [`DriveOp`]s against a store under a [`RetryPolicy`]
#[derive(Debug)]
pub struct Executor<S> {
    store: S,
    policy: RetryPolicy,
    seed: JitterSeed,
}

impl<S: RemoteStore> Executor<S> {
    /// Creates an executor seeded from the current process
    pub fn new(store: S, policy: RetryPolicy) -> Self {
        Self::with_seed(store, policy, JitterSeed::from_process())
    }

    /// Creates an executor with an explicit jitter seed
    pub fn with_seed(store: S, policy: RetryPolicy, seed: JitterSeed) -> Self {
        Self {
            store,
            policy,
            seed,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Performs `op`, retrying failed attempts until it succeeds or the
    /// retry ceiling is reached
    pub async fn execute(&self, op: &DriveOp) -> Result<DriveReply, ExecError> {
        let name = op.name();
        let mut retry = 0u32;

        loop {
            let err = match self.store.call(op).await {
                Ok(reply) => {
                    if retry > 0 {
                        info!(op = name, retry, "Remote call succeeded after retry");
                    }
                    return Ok(reply);
                }
                Err(err) => err,
            };

            if retry >= self.policy.max_retries {
                error!(op = name, attempts = retry + 1, error = %err, "Retry limit exhausted");
                return Err(ExecError::RetriesExhausted {
                    op: name,
                    attempts: retry + 1,
                    source: err,
                });
            }
            retry += 1;

            let wait = self.policy.delay_for(&err, self.seed);
            if err.is_quota() {
                warn!(
                    op = name,
                    retry,
                    pid = self.seed.pid(),
                    pgid = self.seed.pgid(),
                    wait_secs = wait.as_secs(),
                    "Rate limit exceeded, backing off"
                );
            } else {
                warn!(
                    op = name,
                    retry,
                    pid = self.seed.pid(),
                    pgid = self.seed.pgid(),
                    wait_secs = wait.as_secs(),
                    error = %err,
                    "Remote call failed, retrying"
                );
            }
            tokio::time::sleep(wait).await;
        }
    }

    /// Lists every object matching `query`, following continuation tokens
    ///
    /// A page that carries no file list at all ends the aggregation.
    pub async fn list_all(
        &self,
        query: &FileQuery,
        fields: &FieldSelector,
    ) -> Result<Vec<DriveFile>, ExecError> {
        let mut files = Vec::new();
        let mut page_token: Option<String> = None;
        let mut pages = 0u32;

        loop {
            let op = DriveOp::List {
                query: query.clone(),
                fields: fields.clone(),
                page_token: page_token.take(),
            };
            let DriveReply::Page(page) = self.execute(&op).await? else {
                return Err(ExecError::UnexpectedReply { op: "list" });
            };
            pages += 1;

            let Some(batch) = page.files else {
                break;
            };
            files.extend(batch);

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!(pages, count = files.len(), "List complete");
        Ok(files)
    }

    /// Parent references of `id`
    pub async fn parents(&self, id: &RemoteId) -> Result<Vec<RemoteId>, ExecError> {
        match self.execute(&DriveOp::Get { id: id.clone() }).await? {
            DriveReply::Parents(parents) => Ok(parents),
            _ => Err(ExecError::UnexpectedReply { op: "get" }),
        }
    }

    /// Creates an object without content and returns its ID
    pub async fn create(&self, metadata: FileMetadata) -> Result<RemoteId, ExecError> {
        match self.execute(&DriveOp::Create { metadata }).await? {
            DriveReply::Created(id) => Ok(id),
            _ => Err(ExecError::UnexpectedReply { op: "create" }),
        }
    }

    pub async fn rename(&self, id: &RemoteId, name: &str) -> Result<(), ExecError> {
        let op = DriveOp::Rename {
            id: id.clone(),
            name: name.to_string(),
        };
        self.expect_done(&op).await
    }

    pub async fn delete(&self, id: &RemoteId) -> Result<(), ExecError> {
        self.expect_done(&DriveOp::Delete { id: id.clone() }).await
    }

    /// Moves `id` so that `new_parent` is its only parent
    pub async fn move_to(&self, id: &RemoteId, new_parent: &RemoteId) -> Result<(), ExecError> {
        let op = DriveOp::Move {
            id: id.clone(),
            new_parent: new_parent.clone(),
        };
        self.expect_done(&op).await
    }

    /// Creates a file object with content and returns its ID
    pub async fn upload(&self, metadata: FileMetadata, media: Media) -> Result<RemoteId, ExecError> {
        match self.execute(&DriveOp::Upload { metadata, media }).await? {
            DriveReply::Created(id) => Ok(id),
            _ => Err(ExecError::UnexpectedReply { op: "upload" }),
        }
    }

    /// Creates an empty spreadsheet titled `title` and returns its ID
    pub async fn create_sheet(&self, title: &str) -> Result<RemoteId, ExecError> {
        let op = DriveOp::CreateSheet {
            title: title.to_string(),
        };
        match self.execute(&op).await? {
            DriveReply::Sheet(id) => Ok(id),
            _ => Err(ExecError::UnexpectedReply { op: "createsheet" }),
        }
    }

    /// Applies a batch of formatting requests to a spreadsheet
    pub async fn format_sheet(
        &self,
        spreadsheet_id: &RemoteId,
        requests: serde_json::Value,
    ) -> Result<(), ExecError> {
        let op = DriveOp::FormatSheet {
            spreadsheet_id: spreadsheet_id.clone(),
            requests,
        };
        self.expect_done(&op).await
    }

    async fn expect_done(&self, op: &DriveOp) -> Result<(), ExecError> {
        match self.execute(op).await? {
            DriveReply::Done => Ok(()),
            _ => Err(ExecError::UnexpectedReply { op: op.name() }),
        }
    }
}
