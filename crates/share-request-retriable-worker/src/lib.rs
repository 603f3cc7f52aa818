//! # share-request-retriable-worker
//!
//! Durable, at-least-once delivery of outbound federation share
//! notifications.
//!
//! ```text
//! ShareRequestsJob ──▶ RetryDispatcher ──select_due──▶ QueueStore (share_mq)
//!   (interactive:          │   ▲
//!    unlimited,            │   └──apply_accounting──┘
//!    periodic: 2)          ▼
//!                   protocol fallback ──POST──▶ DeliveryTransport
//! ```
//!
//! Each step fetches due requests (fewest attempts first), delivers each one
//! (https then http when the scheme is unknown) and then records the attempt:
//! `tries + 1`, or deletion once that exceeds [`MAX_TRIES`].
//!
//! Delivery failures only ever cost a retry. Store failures abort the step
//! and surface as [`DispatchError`].
//!
//! ```ignore
//! let job = ShareRequestsJob::open(&config, &paths).await?;
//! let report = job.run(RunContext::Interactive).await?;
//! ```

pub mod accounting;
pub mod dispatcher;
pub mod error;
pub mod fallback;
pub mod job;
pub mod store;
pub mod transport;

#[cfg(test)]
mod tests;

pub use accounting::{Accounting, MAX_TRIES};
pub use dispatcher::{decode_payload, RetryDispatcher, StepReport, CRON_BATCH_LIMIT, UNLIMITED};
pub use error::{DispatchError, DispatchResult, TransportError, TransportResult};
pub use fallback::{deliver, post_with_fallback, DeliveryOutcome};
pub use job::{RunContext, ShareRequestsJob, RUN_INTERVAL};
pub use store::{QueueStore, ShareQueueStore};
pub use transport::{DeliveryResponse, DeliveryTransport, HttpTransport};
