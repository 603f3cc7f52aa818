//! Per-request failure isolation and store failure propagation.

use super::harness::{MockReply, TestHarness};
use crate::error::DispatchError;
use share_mq_database::Protocol;

/// A failing request does not stop the next one in the same step.
#[tokio::test]
async fn failure_of_one_request_does_not_block_the_next() {
    let harness = TestHarness::new().await;
    harness.transport.reply_for("https://a.example", MockReply::Unreachable);
    let a = harness.enqueue("a.example/ocs", Protocol::Https, "{}", 0).await;
    let b = harness.enqueue("b.example/ocs", Protocol::Https, "{}", 0).await;

    let report = harness.dispatcher().run_step(0).await.unwrap();

    assert_eq!(report.failed, 1);
    assert_eq!(report.delivered, 1);
    assert_eq!(
        harness.transport.call_urls(),
        vec!["https://a.example/ocs".to_string(), "https://b.example/ocs".to_string()]
    );
    assert_eq!(harness.tries_of(a).await, Some(1));
    assert_eq!(harness.tries_of(b).await, Some(1));
}

/// A malformed payload in the middle of a batch is isolated too.
#[tokio::test]
async fn malformed_payload_does_not_block_batch() {
    let harness = TestHarness::new().await;
    let first = harness.enqueue("a.example", Protocol::Https, "garbage", 0).await;
    let second = harness.enqueue("b.example", Protocol::Https, "{}", 0).await;

    let report = harness.dispatcher().run_step(0).await.unwrap();

    assert_eq!(report.fetched, 2);
    assert_eq!(report.delivered, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(harness.tries_of(first).await, Some(1));
    assert_eq!(harness.tries_of(second).await, Some(1));
}

/// A select failure aborts the step before any delivery.
#[tokio::test]
async fn select_failure_propagates() {
    let harness = TestHarness::new().await;
    let ids = harness.seed(&[0, 0]).await;
    let (dispatcher, store) = harness.failing_dispatcher();
    store.fail_select();

    let result = dispatcher.run_step(0).await;

    assert!(matches!(result, Err(DispatchError::Database(_))));
    assert_eq!(harness.transport.call_count(), 0);
    assert_eq!(harness.tries_of(ids[0]).await, Some(0));
}

/// A write failure aborts the step; earlier writes stay committed.
#[tokio::test]
async fn write_failure_aborts_step_keeping_earlier_writes() {
    let harness = TestHarness::new().await;
    let ids = harness.seed(&[0, 0, 0]).await;
    let (dispatcher, store) = harness.failing_dispatcher();
    store.fail_accounting_after(1);

    let result = dispatcher.run_step(0).await;

    assert!(matches!(result, Err(DispatchError::Database(_))));
    // Second request was posted, its write failed, third never attempted.
    assert_eq!(harness.transport.call_count(), 2);
    assert_eq!(harness.tries_of(ids[0]).await, Some(1));
    assert_eq!(harness.tries_of(ids[1]).await, Some(0));
    assert_eq!(harness.tries_of(ids[2]).await, Some(0));
}

/// After a failed step the next one picks up where it left off.
#[tokio::test]
async fn next_step_recovers_after_store_failure() {
    let harness = TestHarness::new().await;
    let ids = harness.seed(&[0, 0]).await;
    let (dispatcher, store) = harness.failing_dispatcher();
    store.fail_accounting_after(0);

    assert!(dispatcher.run_step(0).await.is_err());
    assert_eq!(harness.tries_of(ids[0]).await, Some(0));

    let report = harness.dispatcher().run_step(0).await.unwrap();
    assert_eq!(report.updated, 2);
    assert_eq!(harness.tries_of(ids[0]).await, Some(1));
    assert_eq!(harness.tries_of(ids[1]).await, Some(1));
}
