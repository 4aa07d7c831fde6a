//! Application configuration.
//!
//! Configuration is loaded from a TOML file at:
//! 1. `$MAILKPI_CONFIG` (environment variable)
//! 2. `~/.config/mailkpi/config.toml` (Linux/macOS)
//!    `%APPDATA%\mailkpi\config.toml` (Windows)
//! 3. Built-in defaults
//!
//! Command-line flags take precedence over every value here.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General behavior settings.
    pub general: GeneralConfig,
    /// Where mail is read from.
    pub mailbox: MailboxConfig,
    /// Monthly report defaults.
    pub report: ReportConfig,
    /// Defaults for outgoing mail.
    pub compose: ComposeConfig,
}

/// General behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// `strftime` format string for received times in listings.
    pub date_format: String,
    /// Override cache directory for logs.
    pub cache_dir: Option<PathBuf>,
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub log_level: String,
}

/// Mail store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailboxConfig {
    /// Root directory of the local mail store (one sub-directory per account).
    pub root: Option<PathBuf>,
    /// Account used when `--email-addr` is not given.
    pub account: Option<String>,
    /// Comma-separated folder names to read from.
    pub folders: String,
    /// Maximum number of messages to read, `-1` for no limit.
    pub max_emails: i64,
}

/// Monthly report defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Attachment name prefix of the raw cases report.
    pub case_prefix: Option<String>,
    /// Attachment name prefix of the raw survey report.
    pub survey_prefix: Option<String>,
    /// Directory for the transient copy of a selected attachment.
    pub work_dir: Option<PathBuf>,
}

/// Defaults for outgoing mail.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposeConfig {
    /// Subject used when none is given.
    pub subject: String,
    /// Body text used when none is given.
    pub content: String,
}

// ── Default implementations ─────────────────────────────────────

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            date_format: "%Y-%m-%d %H:%M:%S".to_string(),
            cache_dir: None,
            log_level: "warn".to_string(),
        }
    }
}

impl Default for MailboxConfig {
    fn default() -> Self {
        Self {
            root: None,
            account: None,
            folders: crate::mailbox::DEFAULT_FOLDERS.to_string(),
            max_emails: 100,
        }
    }
}

impl Default for ComposeConfig {
    fn default() -> Self {
        Self {
            subject: "Test for mailkpi".to_string(),
            content: "This is test for mailkpi".to_string(),
        }
    }
}

// ── Load / save ─────────────────────────────────────────────────

/// Load configuration, searching standard locations.
///
/// Returns the default configuration if no file is found or on parse error.
pub fn load_config() -> Config {
    if let Some(path) = config_file_path() {
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(contents) => match toml::from_str::<Config>(&contents) {
                    Ok(cfg) => {
                        tracing::info!(path = %path.display(), "Loaded config");
                        return cfg;
                    }
                    Err(e) => {
                        tracing::warn!(
                            path = %path.display(),
                            error = %e,
                            "Failed to parse config, using defaults"
                        );
                    }
                },
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Failed to read config file, using defaults"
                    );
                }
            }
        }
    }
    Config::default()
}

/// Save configuration to the standard location.
pub fn save_config(config: &Config) -> anyhow::Result<()> {
    let path = config_file_path()
        .ok_or_else(|| anyhow::anyhow!("Could not determine config file path"))?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(&path, contents)?;
    tracing::info!(path = %path.display(), "Saved config");
    Ok(())
}

/// Determine the config file path (checking env var first, then standard dirs).
pub fn config_file_path() -> Option<PathBuf> {
    if let Ok(env_path) = std::env::var("MAILKPI_CONFIG") {
        return Some(PathBuf::from(env_path));
    }
    dirs::config_dir().map(|d| d.join("mailkpi").join("config.toml"))
}

/// Return the cache directory for logs.
pub fn cache_dir(config: &Config) -> PathBuf {
    if let Some(ref dir) = config.general.cache_dir {
        return dir.clone();
    }
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mailkpi")
}

/// Return the mail store root: configured value, else `<data dir>/mailkpi/mail`.
pub fn mail_root(config: &Config) -> PathBuf {
    if let Some(ref root) = config.mailbox.root {
        return root.clone();
    }
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mailkpi")
        .join("mail")
}
