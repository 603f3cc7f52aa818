//! Dispatcher and transport error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a dispatcher step.
///
/// Delivery problems never show up here; they are absorbed into the
/// per-request retry count.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// Queue store unreachable or a write failed.
    #[error("Database error: {0}")]
    Database(#[from] share_mq_database::DatabaseError),

    /// Configuration rejected before the job was wired.
    #[error("Configuration error: {0}")]
    Config(#[from] share_mq_config_and_utils::CoreError),

    /// Payload is not a serialized JSON object.
    ///
    /// Inside a step this only marks the request as a failed attempt.
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),
}

/// Result type alias using DispatchError.
pub type DispatchResult<T> = Result<T, DispatchError>;

/// Errors raised while performing a single POST.
#[derive(Error, Debug)]
pub enum TransportError {
    /// Connection, TLS, timeout or body error from reqwest.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A trusted certificate file could not be parsed.
    #[error("Invalid certificate {path}: {reason}")]
    Certificate { path: PathBuf, reason: String },

    /// IO error while reading trust material
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using TransportError.
pub type TransportResult<T> = Result<T, TransportError>;
