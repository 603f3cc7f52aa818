//! Configuration management.

use crate::{CoreError, CoreResult, Paths};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Per-request delivery timeout.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 5;

/// Interval between periodic runs (15 minutes).
pub const DEFAULT_INTERVAL_SECS: u64 = 15 * 60;

/// Attempts after which a share request is evicted.
pub const DEFAULT_MAX_TRIES: i64 = 5;

/// Requests handled per unattended periodic run.
pub const DEFAULT_CRON_BATCH_LIMIT: usize = 2;

/// Main share-mq configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    /// Timeout applied to every delivery POST.
    pub request_timeout_secs: u64,
    /// Seconds between two periodic runs in `serve` mode.
    pub interval_secs: u64,
    /// A request whose attempt count would exceed this is deleted.
    pub max_tries: i64,
    /// Batch limit for unattended periodic runs.
    pub cron_batch_limit: usize,
    /// Queue database location. Defaults to `Paths::database_file()`.
    pub database_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            interval_secs: DEFAULT_INTERVAL_SECS,
            max_tries: DEFAULT_MAX_TRIES,
            cron_batch_limit: DEFAULT_CRON_BATCH_LIMIT,
            database_path: None,
        }
    }
}

impl Config {
    /// Load configuration from the config file (if present), then apply
    /// environment overrides and validate.
    pub fn load(paths: &Paths) -> CoreResult<Self> {
        let config_path = paths.config_file();

        let mut config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            Self::default()
        };

        config.load_from_env();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the config file.
    pub fn save(&self, paths: &Paths) -> CoreResult<()> {
        paths.ensure_dirs()?;
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(paths.config_file(), content)?;
        Ok(())
    }

    /// Resolve the database path against `paths`.
    pub fn database_file(&self, paths: &Paths) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(|| paths.database_file())
    }

    /// Reject values the dispatcher cannot work with.
    pub fn validate(&self) -> CoreResult<()> {
        if self.request_timeout_secs == 0 {
            return Err(CoreError::Config(
                "request_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.interval_secs == 0 {
            return Err(CoreError::Config(
                "interval_secs must be greater than zero".to_string(),
            ));
        }
        if self.max_tries < 0 {
            return Err(CoreError::Config("max_tries must not be negative".to_string()));
        }
        if self.cron_batch_limit == 0 {
            return Err(CoreError::Config(
                "cron_batch_limit must be greater than zero (0 means unbounded)".to_string(),
            ));
        }
        Ok(())
    }

    fn load_from_env(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Apply `SHARE_MQ_*` overrides from `lookup`. Unparseable values are ignored.
    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = lookup("SHARE_MQ_LOG_LEVEL") {
            self.log_level = level;
        }
        if let Some(secs) = lookup("SHARE_MQ_REQUEST_TIMEOUT_SECS").and_then(|s| s.parse().ok()) {
            self.request_timeout_secs = secs;
        }
        if let Some(secs) = lookup("SHARE_MQ_INTERVAL_SECS").and_then(|s| s.parse().ok()) {
            self.interval_secs = secs;
        }
        if let Some(path) = lookup("SHARE_MQ_DATABASE") {
            self.database_path = Some(PathBuf::from(path));
        }
    }
}
