//! Integration tests for the share request dispatcher.
//!
//! - `harness.rs`    - mock transport, failing store, in-memory queue
//! - `ordering.rs`   - fetch order and batch bounds
//! - `accounting.rs` - attempt counting and eviction threshold
//! - `fallback.rs`   - https-then-http probing for unknown protocols
//! - `isolation.rs`  - per-request failure isolation, store failures
//! - `scenario.rs`   - a mixed ten-request queue across steps
//! - `job.rs`        - interactive vs periodic runs and the serve loop

mod harness;
mod isolation;
mod scenario;
