//! `gdpath id` / `gdpath link` - resolve a path

use anyhow::Result;
use clap::Args;
use gdpath_sync::ops::open_link;

use super::Context;

/// Arguments for the id subcommand
#[derive(Debug, Args)]
pub struct IdCommand {
    /// Remote path (`/` is the root folder)
    pub path: String,
}

impl IdCommand {
    pub async fn execute(&self, ctx: &Context) -> Result<()> {
        let mut ops = ctx.ops().await?;
        let id = ops.id(&self.path).await?;

        let formatter = ctx.formatter();
        formatter.line(id.as_str());
        formatter.print_json(&serde_json::json!({ "path": self.path, "id": id }));
        Ok(())
    }
}

/// Arguments for the link subcommand
#[derive(Debug, Args)]
pub struct LinkCommand {
    /// Remote path
    pub path: String,
}

impl LinkCommand {
    pub async fn execute(&self, ctx: &Context) -> Result<()> {
        let mut ops = ctx.ops().await?;
        let id = ops.id(&self.path).await?;
        let link = open_link(&id);

        let formatter = ctx.formatter();
        formatter.line(&link);
        formatter.print_json(&serde_json::json!({ "path": self.path, "id": id, "link": link }));
        Ok(())
    }
}
