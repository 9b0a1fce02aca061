//! `gdpath upload` / `sheet` / `new-sheet` - create remote content

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use gdpath_sync::ops::open_link;
use tracing::info;

use super::Context;

/// Arguments for the upload subcommand
#[derive(Debug, Args)]
pub struct UploadCommand {
    /// Local file to upload
    pub local: PathBuf,

    /// Remote destination path; missing folders are created
    pub remote: String,

    /// Move an existing object at the destination into `old/` first
    #[arg(long)]
    pub replace: bool,
}

impl UploadCommand {
    pub async fn execute(&self, ctx: &Context) -> Result<()> {
        info!(local = %self.local.display(), remote = %self.remote, "Uploading");
        let mut ops = ctx.ops().await?;
        let id = ops.upload(&self.local, &self.remote, self.replace).await?;

        let link = open_link(&id);
        let formatter = ctx.formatter();
        formatter.line(&link);
        formatter.print_json(&serde_json::json!({ "path": self.remote, "id": id, "link": link }));
        Ok(())
    }
}

/// Arguments for the sheet subcommand
#[derive(Debug, Args)]
pub struct SheetCommand {
    /// Local TSV file
    pub local: PathBuf,

    /// Remote destination path; missing folders are created
    pub remote: String,

    /// Move an existing object at the destination into `old/` first
    #[arg(long)]
    pub replace: bool,

    /// Bold and freeze the first row
    #[arg(long)]
    pub bold_header: bool,
}

impl SheetCommand {
    pub async fn execute(&self, ctx: &Context) -> Result<()> {
        info!(local = %self.local.display(), remote = %self.remote, "Uploading spreadsheet");
        let mut ops = ctx.ops().await?;
        let id = ops
            .upload_sheet(&self.local, &self.remote, self.replace)
            .await?;
        if self.bold_header {
            ops.format_header(&id).await?;
        }

        let link = open_link(&id);
        let formatter = ctx.formatter();
        formatter.line(&link);
        formatter.print_json(&serde_json::json!({ "path": self.remote, "id": id, "link": link }));
        Ok(())
    }
}

/// Arguments for the new-sheet subcommand
#[derive(Debug, Args)]
pub struct NewSheetCommand {
    /// Remote path of the new spreadsheet
    pub remote: String,
}

impl NewSheetCommand {
    pub async fn execute(&self, ctx: &Context) -> Result<()> {
        let mut ops = ctx.ops().await?;
        let id = ops.new_sheet(&self.remote).await?;

        let link = open_link(&id);
        let formatter = ctx.formatter();
        formatter.line(&link);
        formatter.print_json(&serde_json::json!({ "path": self.remote, "id": id, "link": link }));
        Ok(())
    }
}
