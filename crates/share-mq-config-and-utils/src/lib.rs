//! Configuration, paths, errors and logging setup for share-mq.

mod config;
mod error;
mod logging;
mod paths;

pub use config::{
    Config, DEFAULT_CRON_BATCH_LIMIT, DEFAULT_INTERVAL_SECS, DEFAULT_LOG_LEVEL, DEFAULT_MAX_TRIES,
    DEFAULT_REQUEST_TIMEOUT_SECS,
};
pub use error::{CoreError, CoreResult};
pub use logging::init_logging;
pub use paths::Paths;
