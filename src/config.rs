//! Configuration module for feedwatch.

use serde::Deserialize;
use std::path::Path;
use validator::Validate;

use crate::{FeedwatchError, Result};

/// Database configuration.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct DatabaseConfig {
    /// Connection string: a SQLite file path by default, a `postgres://` URL
    /// when built with the `postgres` feature.
    #[serde(default = "default_db_url")]
    #[validate(length(min = 1, message = "database.url must not be empty"))]
    pub url: String,
}

fn default_db_url() -> String {
    "data/feedwatch.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_db_url(),
        }
    }
}

/// Watcher configuration.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct WatcherConfig {
    /// Path to the watchlist file (one feed URL per line).
    #[serde(default)]
    #[validate(length(min = 1, message = "watcher.watchlist_path is required"))]
    pub watchlist_path: String,
    /// Seconds between runs. A run also happens at startup.
    #[serde(default = "default_interval")]
    #[validate(range(min = 1, message = "watcher.interval_secs must be at least 1"))]
    pub interval_secs: u64,
}

fn default_interval() -> u64 {
    21600 // 6 hours
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            watchlist_path: String::new(),
            interval_secs: default_interval(),
        }
    }
}

/// Notification configuration.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NotifyConfig {
    /// Discord bot token. Can also be set via `FEEDWATCH_BOT_TOKEN`.
    #[serde(default)]
    #[validate(length(
        min = 1,
        message = "notify.bot_token is required (set it in config.toml or via FEEDWATCH_BOT_TOKEN)"
    ))]
    pub bot_token: String,
    /// Discord channel ID messages are posted to.
    #[serde(default)]
    #[validate(length(min = 1, message = "notify.channel_id is required"))]
    pub channel_id: String,
    /// Delivery deadline per message in seconds.
    #[serde(default = "default_notify_timeout")]
    #[validate(range(min = 1, message = "notify.timeout_secs must be at least 1"))]
    pub timeout_secs: u64,
}

fn default_notify_timeout() -> u64 {
    10
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            channel_id: String::new(),
            timeout_secs: default_notify_timeout(),
        }
    }
}

/// Feed fetching configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    /// Connection timeout in seconds.
    #[serde(default = "default_fetch_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Read timeout in seconds.
    #[serde(default = "default_fetch_read_timeout")]
    pub read_timeout_secs: u64,
    /// Total request timeout in seconds.
    #[serde(default = "default_fetch_total_timeout")]
    pub total_timeout_secs: u64,
    /// Maximum number of redirects.
    #[serde(default = "default_fetch_max_redirects")]
    pub max_redirects: usize,
    /// Maximum feed size in bytes.
    #[serde(default = "default_fetch_max_feed_size")]
    pub max_feed_size_bytes: u64,
}

fn default_fetch_connect_timeout() -> u64 {
    10
}

fn default_fetch_read_timeout() -> u64 {
    20
}

fn default_fetch_total_timeout() -> u64 {
    30
}

fn default_fetch_max_redirects() -> usize {
    5
}

fn default_fetch_max_feed_size() -> u64 {
    5 * 1024 * 1024 // 5MB
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_fetch_connect_timeout(),
            read_timeout_secs: default_fetch_read_timeout(),
            total_timeout_secs: default_fetch_total_timeout(),
            max_redirects: default_fetch_max_redirects(),
            max_feed_size_bytes: default_fetch_max_feed_size(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/feedwatch.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Watcher configuration.
    #[serde(default)]
    pub watcher: WatcherConfig,
    /// Notification configuration.
    #[serde(default)]
    pub notify: NotifyConfig,
    /// Feed fetching configuration.
    #[serde(default)]
    pub fetch: FetchConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(FeedwatchError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| FeedwatchError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `FEEDWATCH_BOT_TOKEN`: Override the Discord bot token
    pub fn apply_env_overrides(&mut self) {
        // Bot token from environment variable (highest priority)
        if let Ok(bot_token) = std::env::var("FEEDWATCH_BOT_TOKEN") {
            if !bot_token.is_empty() {
                self.notify.bot_token = bot_token;
            }
        }
    }

    /// Validate the configuration.
    ///
    /// Returns an error if a required field is missing or a numeric field is
    /// out of range. Called once at startup; failures are fatal.
    pub fn validate(&self) -> Result<()> {
        self.database
            .validate()
            .and_then(|_| self.watcher.validate())
            .and_then(|_| self.notify.validate())
            .map_err(|e| FeedwatchError::Config(flatten_validation_errors(&e)))
    }
}

/// Render validator errors as a single comma-separated message line.
fn flatten_validation_errors(errors: &validator::ValidationErrors) -> String {
    let mut messages: Vec<String> = Vec::new();
    for (field, errs) in errors.field_errors() {
        for err in errs {
            match &err.message {
                Some(msg) => messages.push(msg.to_string()),
                None => messages.push(format!("{field} is invalid")),
            }
        }
    }
    messages.sort();
    messages.join(", ")
}
