//! Logging initialization.
//!
//! Thin wrapper over the observability package: JSONL to
//! `~/.share-mq/logs/share-mq.jsonl`, compact lines on stderr.

use crate::Paths;

/// Initialize logging for the share-mq binary.
///
/// `RUST_LOG` wins over `level` when set.
pub fn init_logging(level: &str, paths: &Paths) {
    observability::init_with_config(observability::LogConfig {
        service_name: "share-mq".into(),
        default_level: level.into(),
        log_path: Some(paths.log_file()),
        also_stderr: true,
    });
}
