//! `gdpath delete` / `mkdir` / `backup` / `dedup` - single-object changes

use anyhow::Result;
use clap::Args;

use super::Context;

/// Arguments for the delete subcommand
#[derive(Debug, Args)]
pub struct DeleteCommand {
    /// Remote path of the object to delete
    pub path: String,
}

impl DeleteCommand {
    pub async fn execute(&self, ctx: &Context) -> Result<()> {
        let mut ops = ctx.ops().await?;
        let id = ops.delete(&self.path).await?;

        let formatter = ctx.formatter();
        formatter.success(&format!("Deleted {} ({id})", self.path));
        formatter.print_json(&serde_json::json!({ "path": self.path, "id": id, "deleted": true }));
        Ok(())
    }
}

/// Arguments for the mkdir subcommand
#[derive(Debug, Args)]
pub struct MkdirCommand {
    /// Remote folder chain to create
    pub path: String,
}

impl MkdirCommand {
    pub async fn execute(&self, ctx: &Context) -> Result<()> {
        let mut ops = ctx.ops().await?;
        let id = ops.mkdir(&self.path).await?;

        let formatter = ctx.formatter();
        formatter.line(id.as_str());
        formatter.print_json(&serde_json::json!({ "path": self.path, "id": id }));
        Ok(())
    }
}

/// Arguments for the backup subcommand
#[derive(Debug, Args)]
pub struct BackupCommand {
    /// Remote path of the object to move into `old/`
    pub path: String,
}

impl BackupCommand {
    pub async fn execute(&self, ctx: &Context) -> Result<()> {
        let mut ops = ctx.ops().await?;
        let moved = ops.backup(&self.path).await?;

        let formatter = ctx.formatter();
        if moved {
            formatter.success(&format!("Backed up {}", self.path));
        } else {
            formatter.warn(&format!("Nothing to back up at {}", self.path));
        }
        formatter.print_json(&serde_json::json!({ "path": self.path, "moved": moved }));
        Ok(())
    }
}

/// Arguments for the dedup subcommand
#[derive(Debug, Args)]
pub struct DedupCommand {
    /// Remote path whose objects are all deleted
    pub path: String,
}

impl DedupCommand {
    pub async fn execute(&self, ctx: &Context) -> Result<()> {
        let mut ops = ctx.ops().await?;
        let deleted = ops.dedup(&self.path).await?;

        let formatter = ctx.formatter();
        formatter.success(&format!("Deleted {deleted} objects at {}", self.path));
        formatter.print_json(&serde_json::json!({ "path": self.path, "deleted": deleted }));
        Ok(())
    }
}
