//! Subcommand implementations
//!
//! Every command receives the shared [`Context`]; commands that talk to the
//! remote store open their session through [`Context::ops`].

use std::path::PathBuf;

use anyhow::Result;
use gdpath_core::config::Config;
use gdpath_drive::client::DriveClient;
use gdpath_drive::executor::{Executor, RetryPolicy};
use gdpath_sync::ops::DriveOps;
use gdpath_sync::resolver::PathResolver;
use tracing::debug;

use crate::output::{get_formatter, OutputFormat, OutputFormatter};

pub mod completions;
pub mod config;
pub mod list;
pub mod lookup;
pub mod manage;
pub mod upload;

/// State shared by all subcommands
#[derive(Debug)]
pub struct Context {
    pub config: Config,
    pub config_path: PathBuf,
    pub format: OutputFormat,
}

impl Context {
    pub fn formatter(&self) -> Box<dyn OutputFormatter> {
        get_formatter(self.format)
    }

    /// Connects to the remote store and opens a resolver session
    pub async fn ops(&self) -> Result<DriveOps<DriveClient>> {
        let client = gdpath_drive::connect(&self.config.drive).await?;
        let executor = Executor::new(client, RetryPolicy::from(&self.config.retry));
        debug!(policy = ?executor.policy(), "Session opened");

        let resolver = PathResolver::new(executor, self.config.lock.clone());
        Ok(DriveOps::new(resolver, self.config.policy.clone()))
    }
}
