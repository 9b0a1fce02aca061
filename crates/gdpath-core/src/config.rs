//! Configuration module for gdpath.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, validation, defaults, and a builder pattern for programmatic use.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for gdpath.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub drive: DriveConfig,
    pub retry: RetryConfig,
    pub lock: LockConfig,
    pub logging: LoggingConfig,
    pub policy: PolicyConfig,
}

/// Remote service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveConfig {
    /// Credential file. `None` searches `credentials.json` in the working
    /// directory, then in the gdpath config directory.
    pub credentials: Option<PathBuf>,
    /// Base URL of the object store API.
    pub api_url: String,
    /// Base URL of the media upload endpoint.
    pub upload_url: String,
    /// Base URL of the tabular-document API.
    pub sheets_url: String,
    /// Objects requested per list page.
    pub page_size: u32,
}

/// Retry policy of the call executor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries after the first attempt before a call is fatal.
    pub max_retries: u32,
    /// Seconds to wait after an ordinary failure.
    pub transient_delay_secs: u64,
    /// Fixed seconds added to every rate-limit wait.
    pub quota_offset_secs: u64,
    /// Seconds per jitter-seed step in a rate-limit wait.
    pub quota_step_secs: u64,
}

/// Folder-creation lock settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LockConfig {
    /// Well-known lock file shared by every gdpath process on this machine.
    pub path: PathBuf,
    /// Seconds to keep polling before giving up.
    pub max_wait_secs: u64,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
}

/// Policy for destructive commands.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Destructive commands explicitly allowed, e.g. `["clear"]`.
    pub allow_destructive: Vec<String>,
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/gdpath/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        Self::config_dir().join("config.yaml")
    }

    /// Directory holding the configuration and, by default, the credentials.
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("gdpath")
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            credentials: None,
            api_url: "https://www.googleapis.com/drive/v3".to_string(),
            upload_url: "https://www.googleapis.com/upload/drive/v3".to_string(),
            sheets_url: "https://sheets.googleapis.com/v4".to_string(),
            page_size: 1000,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 10,
            transient_delay_secs: 3,
            quota_offset_secs: 5,
            quota_step_secs: 1,
        }
    }
}

impl RetryConfig {
    pub fn transient_delay(&self) -> Duration {
        Duration::from_secs(self.transient_delay_secs)
    }

    pub fn quota_offset(&self) -> Duration {
        Duration::from_secs(self.quota_offset_secs)
    }

    pub fn quota_step(&self) -> Duration {
        Duration::from_secs(self.quota_step_secs)
    }
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            path: std::env::temp_dir().join("gdpath.lock"),
            max_wait_secs: 60,
        }
    }
}

impl LockConfig {
    pub fn max_wait(&self) -> Duration {
        Duration::from_secs(self.max_wait_secs)
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl PolicyConfig {
    /// Whether the destructive command `command` is allowed.
    pub fn allows(&self, command: &str) -> bool {
        self.allow_destructive.iter().any(|c| c == command)
    }
}

// ---------------------------------------------------------------------------
// Config::validate()
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"lock.max_wait_secs"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Commands `policy.allow_destructive` may name.
const DESTRUCTIVE_COMMANDS: &[&str] = &["clear"];

/// Largest page the object store accepts.
const MAX_PAGE_SIZE: u32 = 1000;

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- drive ---
        for (field, value) in [
            ("drive.api_url", &self.drive.api_url),
            ("drive.upload_url", &self.drive.upload_url),
            ("drive.sheets_url", &self.drive.sheets_url),
        ] {
            if !value.starts_with("http://") && !value.starts_with("https://") {
                errors.push(ValidationError {
                    field: field.into(),
                    message: format!("must be an http(s) URL, got '{value}'"),
                });
            }
        }
        if self.drive.page_size == 0 || self.drive.page_size > MAX_PAGE_SIZE {
            errors.push(ValidationError {
                field: "drive.page_size".into(),
                message: format!("must be in range 1..={MAX_PAGE_SIZE}"),
            });
        }
        if let Some(path) = &self.drive.credentials {
            if !path.exists() {
                errors.push(ValidationError {
                    field: "drive.credentials".into(),
                    message: format!("file does not exist: {}", path.display()),
                });
            }
        }

        // --- retry ---
        if self.retry.max_retries == 0 {
            errors.push(ValidationError {
                field: "retry.max_retries".into(),
                message: "must be greater than 0".into(),
            });
        }

        // --- lock ---
        if self.lock.max_wait_secs == 0 {
            errors.push(ValidationError {
                field: "lock.max_wait_secs".into(),
                message: "must be greater than 0".into(),
            });
        }
        if self.lock.path.as_os_str().is_empty() {
            errors.push(ValidationError {
                field: "lock.path".into(),
                message: "must not be empty".into(),
            });
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid level '{}'; valid options: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        // --- policy ---
        for command in &self.policy.allow_destructive {
            if !DESTRUCTIVE_COMMANDS.contains(&command.as_str()) {
                errors.push(ValidationError {
                    field: "policy.allow_destructive".into(),
                    message: format!(
                        "unknown command '{}'; valid options: {}",
                        command,
                        DESTRUCTIVE_COMMANDS.join(", ")
                    ),
                });
            }
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`Config`] programmatically.
///
/// Starts from [`Config::default`] and allows selective overrides.
///
/// # Example
///
/// ```rust,no_run
/// use gdpath_core::config::ConfigBuilder;
/// use std::path::PathBuf;
///
/// let config = ConfigBuilder::new()
///     .lock_path(PathBuf::from("/run/lock/gdpath.lock"))
///     .retry_max_retries(5)
///     .logging_level("debug")
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder initialised with [`Config::default`] values.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    // -- drive --

    pub fn drive_credentials(mut self, path: PathBuf) -> Self {
        self.config.drive.credentials = Some(path);
        self
    }

    pub fn drive_api_url(mut self, url: impl Into<String>) -> Self {
        self.config.drive.api_url = url.into();
        self
    }

    pub fn drive_upload_url(mut self, url: impl Into<String>) -> Self {
        self.config.drive.upload_url = url.into();
        self
    }

    pub fn drive_sheets_url(mut self, url: impl Into<String>) -> Self {
        self.config.drive.sheets_url = url.into();
        self
    }

    pub fn drive_page_size(mut self, n: u32) -> Self {
        self.config.drive.page_size = n;
        self
    }

    // -- retry --

    pub fn retry_max_retries(mut self, n: u32) -> Self {
        self.config.retry.max_retries = n;
        self
    }

    pub fn retry_transient_delay_secs(mut self, secs: u64) -> Self {
        self.config.retry.transient_delay_secs = secs;
        self
    }

    pub fn retry_quota_offset_secs(mut self, secs: u64) -> Self {
        self.config.retry.quota_offset_secs = secs;
        self
    }

    pub fn retry_quota_step_secs(mut self, secs: u64) -> Self {
        self.config.retry.quota_step_secs = secs;
        self
    }

    // -- lock --

    pub fn lock_path(mut self, path: PathBuf) -> Self {
        self.config.lock.path = path;
        self
    }

    pub fn lock_max_wait_secs(mut self, secs: u64) -> Self {
        self.config.lock.max_wait_secs = secs;
        self
    }

    // -- logging --

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    // -- policy --

    pub fn policy_allow(mut self, command: impl Into<String>) -> Self {
        self.config.policy.allow_destructive.push(command.into());
        self
    }

    /// Consume the builder and return the [`Config`] without validation.
    pub fn build(self) -> Config {
        self.config
    }

    /// Consume the builder, validate, and return the [`Config`] or errors.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let errors = self.config.validate();
        if errors.is_empty() {
            Ok(self.config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
