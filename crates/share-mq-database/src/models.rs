//! Row types for the `share_mq` table.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Delivery scheme stored alongside a request.
///
/// Stored as the literal prefix (`"http://"`, `"https://"`) or the empty
/// string when the remote scheme has not been established yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Protocol {
    Http,
    Https,
    /// Scheme unknown; delivery probes https first, then http.
    Unknown,
}

impl Protocol {
    /// Column value for this protocol.
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Http => "http://",
            Protocol::Https => "https://",
            Protocol::Unknown => "",
        }
    }

    /// Parse a stored column value. Anything unrecognised is `Unknown`.
    pub fn from_column(s: &str) -> Self {
        match s {
            "http://" => Protocol::Http,
            "https://" => Protocol::Https,
            _ => Protocol::Unknown,
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Unknown => f.write_str("unknown"),
            known => f.write_str(known.as_str()),
        }
    }
}

/// A pending outbound share notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareRequest {
    /// Store-assigned identifier.
    pub id: i64,
    /// Destination host and path, without scheme.
    pub url: String,
    /// Serialized JSON object, kept opaque until delivery.
    pub payload: String,
    pub protocol: Protocol,
    /// User whose trust material is used for the TLS handshake.
    pub owner_user_id: String,
    /// Delivery attempts already made.
    pub tries: i64,
}

/// Input for inserting a share request. `tries` always starts at 0.
#[derive(Debug, Clone)]
pub struct NewShareRequest {
    pub url: String,
    pub payload: String,
    pub protocol: Protocol,
    pub owner_user_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_column_values() {
        assert_eq!(Protocol::from_column("http://"), Protocol::Http);
        assert_eq!(Protocol::from_column("https://"), Protocol::Https);
        assert_eq!(Protocol::from_column(""), Protocol::Unknown);
        assert_eq!(Protocol::from_column("ftp://"), Protocol::Unknown);
        assert_eq!(Protocol::Https.as_str(), "https://");
        assert_eq!(Protocol::Unknown.as_str(), "");
    }

    #[test]
    fn protocol_display() {
        assert_eq!(Protocol::Unknown.to_string(), "unknown");
        assert_eq!(Protocol::Http.to_string(), "http://");
    }
}
