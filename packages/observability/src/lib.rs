//! # Observability
//!
//! Logging setup shared by the share-mq binaries.
//!
//! Services call [`init`] or [`init_with_config`] once at startup and use the
//! standard `tracing` macros everywhere else. Events go to:
//!
//! - a JSONL file (`~/.share-mq/logs/share-mq.jsonl` unless overridden), one
//!   object per line, appended and flushed per line so several processes can
//!   share it
//! - optionally stderr, in the compact human format
//!
//! `RUST_LOG` takes precedence over `LogConfig::default_level`.
//!
//! ```rust,ignore
//! fn main() {
//!     observability::init_with_config(observability::LogConfig {
//!         service_name: "share-mq".into(),
//!         default_level: "debug".into(),
//!         also_stderr: true,
//!         ..Default::default()
//!     });
//!     tracing::info!("ready");
//! }
//! ```

mod json_layer;
mod writer;

pub use json_layer::{JsonLayer, LogEntry};
pub use writer::JsonlFileWriter;

use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Configuration for the logging system.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Name of the service, included in every JSON line.
    pub service_name: String,

    /// Default filter (e.g. "debug", "info"). `RUST_LOG` overrides it.
    pub default_level: String,

    /// Custom JSONL file path. Defaults to `~/.share-mq/logs/share-mq.jsonl`.
    pub log_path: Option<PathBuf>,

    /// Also emit compact logs to stderr.
    pub also_stderr: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            service_name: "unknown".into(),
            default_level: "info".into(),
            log_path: None,
            also_stderr: false,
        }
    }
}

/// Initialize logging with default settings for `service_name`.
pub fn init(service_name: &str) {
    init_with_config(LogConfig {
        service_name: service_name.into(),
        ..Default::default()
    });
}

/// Initialize logging with custom configuration.
///
/// If the log file cannot be opened, logging falls back to stderr only.
/// Calling this more than once is a no-op (the first subscriber wins).
pub fn init_with_config(config: LogConfig) {
    let log_path = config.log_path.clone().or_else(writer::default_log_path);

    let (file_layer, open_error) = match log_path.as_deref().map(JsonlFileWriter::open) {
        Some(Ok(writer)) => (
            Some(JsonLayer::new(config.service_name.clone(), writer).with_filter(env_filter(&config))),
            None,
        ),
        Some(Err(e)) => (None, Some(e.to_string())),
        None => (None, Some("home directory not available".to_string())),
    };

    // Without a file sink stderr is the only place logs can go.
    let want_stderr = config.also_stderr || file_layer.is_none();
    let stderr_layer = want_stderr.then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_file(false)
            .with_line_number(false)
            .compact()
            .with_writer(std::io::stderr)
            .with_filter(env_filter(&config))
    });

    let installed = tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .is_ok();

    if !installed {
        return;
    }

    match open_error {
        Some(error) => tracing::warn!(
            service = %config.service_name,
            error = %error,
            "log file unavailable, logging to stderr only"
        ),
        None => tracing::info!(
            service = %config.service_name,
            log_path = %log_path.map(|p| p.display().to_string()).unwrap_or_default(),
            "observability initialized"
        ),
    }
}

fn env_filter(config: &LogConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.default_level))
}

pub use tracing::{debug, error, info, instrument, trace, warn, Level};
