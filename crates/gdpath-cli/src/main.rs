//! gdpath CLI - Path-addressed access to Google Drive
//!
//! Provides commands for:
//! - Resolving paths to IDs and browser links
//! - Listing and clearing folders
//! - Uploading files and spreadsheets into auto-created folder chains
//! - Backing up and deduplicating objects
//! - Viewing and validating configuration

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use gdpath_core::config::Config;
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{
    completions::CompletionsCommand,
    config::ConfigCommand,
    list::{ClearCommand, FilesCommand, ListCommand},
    lookup::{IdCommand, LinkCommand},
    manage::{BackupCommand, DedupCommand, DeleteCommand, MkdirCommand},
    upload::{NewSheetCommand, SheetCommand, UploadCommand},
    Context,
};
use output::{get_formatter, OutputFormat};

#[derive(Debug, Parser)]
#[command(name = "gdpath", version, about = "Path-addressed Google Drive client")]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the ID of a remote path
    Id(IdCommand),
    /// Print the browser link of a remote path
    Link(LinkCommand),
    /// List the contents of a remote folder
    List(ListCommand),
    /// List the files (not folders) of a remote folder
    Files(FilesCommand),
    /// Delete every file in a remote folder (requires policy permission)
    Clear(ClearCommand),
    /// Delete a remote object
    Delete(DeleteCommand),
    /// Create a remote folder chain
    Mkdir(MkdirCommand),
    /// Upload a local file
    Upload(UploadCommand),
    /// Upload a local TSV file as a spreadsheet
    Sheet(SheetCommand),
    /// Create an empty spreadsheet
    NewSheet(NewSheetCommand),
    /// Move a remote object into the backup folder next to it
    Backup(BackupCommand),
    /// Delete every object at a remote path, duplicates included
    Dedup(DedupCommand),
    /// View and validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Generate shell completions
    Completions(CompletionsCommand),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let config = Config::load_or_default(&config_path);

    // Setup tracing: RUST_LOG wins, then -v, then the configured level
    let filter = match cli.verbose {
        0 => config.logging.level.as_str(),
        1 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let format = OutputFormat::from_json_flag(cli.json);
    let ctx = Context {
        config,
        config_path,
        format,
    };

    match run(cli.command, &ctx).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            get_formatter(format).error(&format!("{err:#}"));
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands, ctx: &Context) -> Result<()> {
    match command {
        Commands::Id(cmd) => cmd.execute(ctx).await,
        Commands::Link(cmd) => cmd.execute(ctx).await,
        Commands::List(cmd) => cmd.execute(ctx).await,
        Commands::Files(cmd) => cmd.execute(ctx).await,
        Commands::Clear(cmd) => cmd.execute(ctx).await,
        Commands::Delete(cmd) => cmd.execute(ctx).await,
        Commands::Mkdir(cmd) => cmd.execute(ctx).await,
        Commands::Upload(cmd) => cmd.execute(ctx).await,
        Commands::Sheet(cmd) => cmd.execute(ctx).await,
        Commands::NewSheet(cmd) => cmd.execute(ctx).await,
        Commands::Backup(cmd) => cmd.execute(ctx).await,
        Commands::Dedup(cmd) => cmd.execute(ctx).await,
        Commands::Config(cmd) => cmd.execute(ctx).await,
        Commands::Completions(cmd) => cmd.execute(ctx).await,
    }
}
