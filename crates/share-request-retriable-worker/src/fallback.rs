//! Scheme selection for a single delivery.
//!
//! A request with a known protocol is posted once. A request whose protocol
//! is unknown is posted over https first and, only if that did not succeed,
//! exactly once more over http. Neither path touches `tries`.

use crate::transport::DeliveryTransport;
use serde_json::{Map, Value};
use share_mq_database::Protocol;
use tracing::debug;

/// Order in which an unknown protocol is probed.
pub const FALLBACK_ORDER: [Protocol; 2] = [Protocol::Https, Protocol::Http];

/// Result of the last POST made for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered { url: String, status: u16 },
    Rejected { url: String, status: u16 },
    Unreachable { url: String, reason: String },
}

impl DeliveryOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, DeliveryOutcome::Delivered { .. })
    }

    /// Fully qualified URL of the attempt this outcome describes.
    pub fn url(&self) -> &str {
        match self {
            DeliveryOutcome::Delivered { url, .. }
            | DeliveryOutcome::Rejected { url, .. }
            | DeliveryOutcome::Unreachable { url, .. } => url,
        }
    }
}

/// POST once to `protocol` + `url`.
pub async fn post_once(
    transport: &dyn DeliveryTransport,
    protocol: Protocol,
    url: &str,
    payload: &Map<String, Value>,
    owner_user_id: &str,
) -> DeliveryOutcome {
    let full_url = format!("{}{}", protocol.as_str(), url);

    match transport.post(&full_url, payload, owner_user_id).await {
        Ok(response) if response.is_success() => DeliveryOutcome::Delivered {
            url: full_url,
            status: response.status,
        },
        Ok(response) => DeliveryOutcome::Rejected {
            url: full_url,
            status: response.status,
        },
        Err(e) => DeliveryOutcome::Unreachable {
            url: full_url,
            reason: e.to_string(),
        },
    }
}

/// Probe https then http, stopping at the first success.
///
/// At most two POSTs; the outcome of the last one is returned.
pub async fn post_with_fallback(
    transport: &dyn DeliveryTransport,
    url: &str,
    payload: &Map<String, Value>,
    owner_user_id: &str,
) -> DeliveryOutcome {
    let secure = post_once(transport, FALLBACK_ORDER[0], url, payload, owner_user_id).await;
    if secure.is_success() {
        return secure;
    }

    debug!(url, outcome = ?secure, "https attempt failed, falling back to http");
    post_once(transport, FALLBACK_ORDER[1], url, payload, owner_user_id).await
}

/// Deliver using the stored protocol, or probe when it is unknown.
pub async fn deliver(
    transport: &dyn DeliveryTransport,
    protocol: Protocol,
    url: &str,
    payload: &Map<String, Value>,
    owner_user_id: &str,
) -> DeliveryOutcome {
    match protocol {
        Protocol::Http | Protocol::Https => {
            post_once(transport, protocol, url, payload, owner_user_id).await
        }
        Protocol::Unknown => post_with_fallback(transport, url, payload, owner_user_id).await,
    }
}
