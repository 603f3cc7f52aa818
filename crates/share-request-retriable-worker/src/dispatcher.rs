//! Retry dispatcher: one bounded pass over the share request queue.

use crate::accounting::{Accounting, MAX_TRIES};
use crate::error::{DispatchError, DispatchResult};
use crate::fallback::{self, DeliveryOutcome};
use crate::store::QueueStore;
use crate::transport::DeliveryTransport;
use serde_json::{Map, Value};
use share_mq_database::ShareRequest;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Batch limit for unattended periodic runs.
pub const CRON_BATCH_LIMIT: usize = 2;

/// Batch limit meaning "drain the whole queue".
pub const UNLIMITED: usize = 0;

/// Counters for one dispatcher step.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StepReport {
    /// Requests returned by the store for this step.
    pub fetched: usize,
    /// Requests whose last POST got a 2xx.
    pub delivered: usize,
    /// Requests that failed delivery, malformed payloads included.
    pub failed: usize,
    /// Requests kept with an incremented attempt count.
    pub updated: usize,
    /// Requests deleted for exceeding the attempt limit.
    pub evicted: usize,
}

/// Decode a stored payload into the key/value map posted to the remote.
pub fn decode_payload(payload: &str) -> DispatchResult<Map<String, Value>> {
    match serde_json::from_str::<Value>(payload) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(DispatchError::MalformedPayload(format!(
            "expected a JSON object, found {}",
            json_kind(&other)
        ))),
        Err(e) => Err(DispatchError::MalformedPayload(e.to_string())),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Drains due share requests, attempts delivery and records each attempt.
///
/// Every fetched request gets exactly one accounting write per step,
/// whatever the delivery outcome. A successful delivery does not remove
/// the request; it leaves the queue once its attempt count passes
/// `max_tries`.
pub struct RetryDispatcher {
    store: Arc<dyn QueueStore>,
    transport: Arc<dyn DeliveryTransport>,
    max_tries: i64,
}

impl RetryDispatcher {
    pub fn new(store: Arc<dyn QueueStore>, transport: Arc<dyn DeliveryTransport>) -> Self {
        Self {
            store,
            transport,
            max_tries: MAX_TRIES,
        }
    }

    pub fn with_max_tries(mut self, max_tries: i64) -> Self {
        self.max_tries = max_tries;
        self
    }

    /// Process up to `batch_limit` requests (0 = all), fewest attempts first.
    ///
    /// Delivery failures never end the step. A store failure does, leaving
    /// writes already made for earlier requests in place.
    pub async fn run_step(&self, batch_limit: usize) -> DispatchResult<StepReport> {
        let due = self.store.select_due(batch_limit).await?;
        let mut report = StepReport {
            fetched: due.len(),
            ..StepReport::default()
        };

        debug!(batch_limit, fetched = report.fetched, "Dispatcher step started");

        for request in &due {
            if self.attempt(request).await {
                report.delivered += 1;
            } else {
                report.failed += 1;
            }

            match self.account(request).await? {
                Accounting::Update { .. } => report.updated += 1,
                Accounting::Evict { .. } => report.evicted += 1,
            }
        }

        info!(
            batch_limit,
            fetched = report.fetched,
            delivered = report.delivered,
            failed = report.failed,
            updated = report.updated,
            evicted = report.evicted,
            "Dispatcher step finished"
        );
        Ok(report)
    }

    /// Record one attempt for `request`: bump `tries` or evict it.
    pub async fn account(&self, request: &ShareRequest) -> DispatchResult<Accounting> {
        let decision = Accounting::for_attempt(request.tries, self.max_tries);
        let existed = self
            .store
            .apply_accounting(request.id, decision.new_tries(), decision.is_evict())
            .await?;

        if !existed {
            debug!(request_id = request.id, "Share request vanished before accounting");
        } else if decision.is_evict() {
            warn!(
                request_id = request.id,
                url = %request.url,
                owner = %request.owner_user_id,
                tries = decision.new_tries(),
                max_tries = self.max_tries,
                "Share request evicted after exhausting delivery attempts"
            );
        }

        Ok(decision)
    }

    /// Decode and deliver. Returns whether the final POST succeeded.
    async fn attempt(&self, request: &ShareRequest) -> bool {
        let payload = match decode_payload(&request.payload) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(request_id = request.id, error = %e, "Skipping delivery of undecodable payload");
                return false;
            }
        };

        let outcome = fallback::deliver(
            self.transport.as_ref(),
            request.protocol,
            &request.url,
            &payload,
            &request.owner_user_id,
        )
        .await;

        match &outcome {
            DeliveryOutcome::Delivered { url, status } => {
                debug!(request_id = request.id, url = %url, status, "Share request delivered");
            }
            DeliveryOutcome::Rejected { url, status } => {
                debug!(request_id = request.id, url = %url, status, tries = request.tries, "Remote rejected share request");
            }
            DeliveryOutcome::Unreachable { url, reason } => {
                debug!(request_id = request.id, url = %url, reason = %reason, tries = request.tries, "Remote unreachable");
            }
        }

        outcome.is_success()
    }
}
