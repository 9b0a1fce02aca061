//! Config command - View and manage gdpath configuration
//!
//! Provides the `gdpath config` CLI command which:
//! 1. Shows the current configuration (YAML or JSON)
//! 2. Sets individual configuration values via dot-notation keys
//! 3. Validates the configuration file and reports errors
//! 4. Prints the configuration file location

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use clap::Subcommand;
use gdpath_core::config::Config;
use tracing::info;

use super::Context;
use crate::output::OutputFormatter;

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (e.g., "retry.max_retries")
        key: String,
        /// New value
        value: String,
    },
    /// Validate configuration file
    Validate,
    /// Print the configuration file path
    Path,
}

impl ConfigCommand {
    /// Execute the config command
    pub async fn execute(&self, ctx: &Context) -> Result<()> {
        match self {
            ConfigCommand::Show => execute_show(ctx),
            ConfigCommand::Set { key, value } => execute_set(ctx, key, value),
            ConfigCommand::Validate => execute_validate(ctx),
            ConfigCommand::Path => {
                let formatter = ctx.formatter();
                formatter.line(&ctx.config_path.display().to_string());
                formatter.print_json(&serde_json::json!({
                    "config_path": ctx.config_path.display().to_string(),
                    "exists": ctx.config_path.exists(),
                }));
                Ok(())
            }
        }
    }
}

fn execute_show(ctx: &Context) -> Result<()> {
    let formatter = ctx.formatter();
    info!(config_path = %ctx.config_path.display(), "Showing configuration");

    if ctx.format.is_json() {
        let json = serde_json::to_value(&ctx.config)
            .context("Failed to serialize configuration to JSON")?;
        formatter.print_json(&json);
    } else {
        formatter.success(&format!("Configuration ({})", ctx.config_path.display()));
        formatter.info("");

        let yaml = serde_yaml::to_string(&ctx.config)
            .context("Failed to serialize configuration to YAML")?;
        for line in yaml.lines() {
            formatter.info(line);
        }
    }

    Ok(())
}

fn execute_set(ctx: &Context, key: &str, value: &str) -> Result<()> {
    let formatter = ctx.formatter();
    let mut config = ctx.config.clone();

    info!(key = %key, value = %value, "Setting configuration value");

    if let Err(e) = apply_config_value(&mut config, key, value) {
        print_supported_keys(formatter.as_ref());
        return Err(e.context(format!("Failed to set '{key}'")));
    }

    // The credential file may not exist yet
    let errors: Vec<String> = config
        .validate()
        .iter()
        .filter(|e| e.field != "drive.credentials")
        .map(|e| e.to_string())
        .collect();
    if !errors.is_empty() {
        anyhow::bail!("Invalid value for '{}': {}", key, errors.join("; "));
    }

    save(&config, &ctx.config_path)?;

    if ctx.format.is_json() {
        formatter.print_json(&serde_json::json!({
            "success": true,
            "key": key,
            "value": value,
            "config_path": ctx.config_path.display().to_string(),
        }));
    } else {
        formatter.success(&format!("Set {key} = {value}"));
        formatter.info(&format!("Saved to {}", ctx.config_path.display()));
    }

    Ok(())
}

fn execute_validate(ctx: &Context) -> Result<()> {
    let formatter = ctx.formatter();
    let config_path = &ctx.config_path;

    if !config_path.exists() {
        if ctx.format.is_json() {
            formatter.print_json(&serde_json::json!({
                "valid": true,
                "config_path": config_path.display().to_string(),
                "errors": [],
                "defaults": true,
            }));
        } else {
            formatter.info(&format!(
                "Configuration file not found at {}",
                config_path.display()
            ));
            formatter.info(
                "Using default configuration. Run 'gdpath config set <key> <value>' to create one.",
            );
        }
        return Ok(());
    }

    // Load explicitly: a parse failure is an error here, not a fallback
    let config = Config::load(config_path)
        .with_context(|| format!("Failed to parse configuration {}", config_path.display()))?;

    info!(config_path = %config_path.display(), "Validating configuration");
    let errors = config.validate();

    if ctx.format.is_json() {
        let error_strings: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        formatter.print_json(&serde_json::json!({
            "valid": errors.is_empty(),
            "config_path": config_path.display().to_string(),
            "errors": error_strings,
        }));
    } else if errors.is_empty() {
        formatter.success("Configuration is valid");
        formatter.info(&format!("File: {}", config_path.display()));
    } else {
        formatter.error(&format!(
            "Configuration has {} error{}:",
            errors.len(),
            if errors.len() == 1 { "" } else { "s" }
        ));
        formatter.info(&format!("File: {}", config_path.display()));
        formatter.info("");
        for error in &errors {
            formatter.info(&format!("  {} - {}", error.field, error.message));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        anyhow::bail!("Configuration is invalid")
    }
}

fn save(config: &Config, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create configuration directory")?;
    }
    let yaml = serde_yaml::to_string(config).context("Failed to serialize configuration")?;
    std::fs::write(path, yaml)
        .with_context(|| format!("Failed to write configuration file {}", path.display()))
}

fn print_supported_keys(formatter: &dyn OutputFormatter) {
    formatter.info("Supported keys:");
    formatter.info("  drive.credentials          - Credential file (\"none\" to search)");
    formatter.info("  drive.api_url              - Object store API base URL");
    formatter.info("  drive.upload_url           - Media upload base URL");
    formatter.info("  drive.sheets_url           - Spreadsheet API base URL");
    formatter.info("  drive.page_size            - Objects per list page");
    formatter.info("  retry.max_retries          - Retries before a call is fatal");
    formatter.info("  retry.transient_delay_secs - Wait after an ordinary failure");
    formatter.info("  retry.quota_offset_secs    - Fixed part of a rate-limit wait");
    formatter.info("  retry.quota_step_secs      - Per-step part of a rate-limit wait");
    formatter.info("  lock.path                  - Folder-creation lock file");
    formatter.info("  lock.max_wait_secs         - Seconds to wait for the lock");
    formatter.info("  logging.level              - trace|debug|info|warn|error");
    formatter.info("  policy.allow_destructive   - Comma-separated commands, e.g. clear");
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .parse::<T>()
        .with_context(|| format!("Expected a positive integer for {key}"))
}

/// Apply a dot-notation key/value pair to a Config struct
fn apply_config_value(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key {
        // --- drive ---
        "drive.credentials" => {
            config.drive.credentials = if value.is_empty() || value == "none" {
                None
            } else {
                Some(PathBuf::from(value))
            };
        }
        "drive.api_url" => config.drive.api_url = value.to_string(),
        "drive.upload_url" => config.drive.upload_url = value.to_string(),
        "drive.sheets_url" => config.drive.sheets_url = value.to_string(),
        "drive.page_size" => config.drive.page_size = parse_number(key, value)?,

        // --- retry ---
        "retry.max_retries" => config.retry.max_retries = parse_number(key, value)?,
        "retry.transient_delay_secs" => {
            config.retry.transient_delay_secs = parse_number(key, value)?
        }
        "retry.quota_offset_secs" => config.retry.quota_offset_secs = parse_number(key, value)?,
        "retry.quota_step_secs" => config.retry.quota_step_secs = parse_number(key, value)?,

        // --- lock ---
        "lock.path" => config.lock.path = PathBuf::from(value),
        "lock.max_wait_secs" => config.lock.max_wait_secs = parse_number(key, value)?,

        // --- logging ---
        "logging.level" => config.logging.level = value.to_string(),

        // --- policy ---
        "policy.allow_destructive" => {
            config.policy.allow_destructive = value
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }

        _ => anyhow::bail!("Unknown configuration key: '{}'", key),
    }

    Ok(())
}
