//! `gdpath list` / `gdpath files` / `gdpath clear` - folder contents

use anyhow::{Context as _, Result};
use clap::Args;
use gdpath_core::domain::ObjectKind;
use gdpath_sync::ops::ListingEntry;

use super::Context;
use crate::output::OutputFormatter;

/// Width of the separator rule in human output
const RULE_WIDTH: usize = 80;

fn rule() -> String {
    "-".repeat(RULE_WIDTH)
}

fn entry_line(entry: &ListingEntry) -> String {
    let ty = match entry.kind {
        ObjectKind::Folder => 'd',
        ObjectKind::File => '-',
    };
    format!("{ty} {}  {}", entry.created, entry.name)
}

fn print_entries(formatter: &dyn OutputFormatter, entries: &[ListingEntry]) {
    formatter.line(&rule());
    for entry in entries {
        formatter.line(&entry_line(entry));
    }
    formatter.line(&rule());
}

/// Arguments for the list subcommand
#[derive(Debug, Args)]
pub struct ListCommand {
    /// Remote folder
    #[arg(default_value = "/")]
    pub path: String,
}

impl ListCommand {
    pub async fn execute(&self, ctx: &Context) -> Result<()> {
        let mut ops = ctx.ops().await?;
        let listing = ops.listing(&self.path).await?;

        let formatter = ctx.formatter();
        print_entries(formatter.as_ref(), &listing.entries);
        formatter.line(&format!(
            "TOTAL = {} ({} Folders, {} Files)",
            listing.entries.len(),
            listing.folders,
            listing.files
        ));
        formatter.print_json(
            &serde_json::to_value(&listing).context("Failed to serialize listing")?,
        );
        Ok(())
    }
}

/// Arguments for the files subcommand
#[derive(Debug, Args)]
pub struct FilesCommand {
    /// Remote folder
    #[arg(default_value = "/")]
    pub path: String,
}

impl FilesCommand {
    pub async fn execute(&self, ctx: &Context) -> Result<()> {
        let mut ops = ctx.ops().await?;
        let files = ops.files(&self.path).await?;

        let formatter = ctx.formatter();
        print_entries(formatter.as_ref(), &files);
        formatter.line(&format!("FILES = {}", files.len()));
        formatter.print_json(&serde_json::json!({ "files": files }));
        Ok(())
    }
}

/// Arguments for the clear subcommand
#[derive(Debug, Args)]
pub struct ClearCommand {
    /// Remote folder whose files are deleted
    pub path: String,
}

impl ClearCommand {
    pub async fn execute(&self, ctx: &Context) -> Result<()> {
        // Refuse before opening a session
        if !ctx.config.policy.allows("clear") {
            anyhow::bail!(
                "You do not have permission to perform this function: clear \
                 (add it to policy.allow_destructive in {})",
                ctx.config_path.display()
            );
        }

        let mut ops = ctx.ops().await?;
        let deleted = ops.clear(&self.path).await?;

        let formatter = ctx.formatter();
        print_entries(formatter.as_ref(), &deleted);
        formatter.success(&format!("Deleted {} files from {}", deleted.len(), self.path));
        formatter.print_json(&serde_json::json!({ "path": self.path, "deleted": deleted }));
        Ok(())
    }
}
