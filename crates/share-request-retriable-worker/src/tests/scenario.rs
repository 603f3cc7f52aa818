//! A mixed ten-request queue worked through several steps.

use super::harness::{MockReply, TestHarness};
use crate::accounting::{Accounting, MAX_TRIES};

const TRIES: [i64; 10] = [0, 0, 1, 1, 2, 2, 3, 3, 4, 5];

#[tokio::test]
async fn bounded_step_over_mixed_queue() {
    for reply in [MockReply::Status(200), MockReply::Status(500)] {
        let harness = TestHarness::with_reply(reply).await;
        let ids = harness.seed(&TRIES).await;

        let report = harness.dispatcher().run_step(5).await.unwrap();
        assert_eq!(report.fetched, 5);
        assert_eq!(report.updated, 5);
        assert_eq!(report.evicted, 0);

        // The five lowest were attempted and bumped, whatever the outcome.
        for (i, expected) in [(0, 1), (1, 1), (2, 2), (3, 2), (4, 3)] {
            assert_eq!(harness.tries_of(ids[i]).await, Some(expected), "request {}", i);
        }
        // Everything else is untouched.
        for i in 5..10 {
            assert_eq!(harness.tries_of(ids[i]).await, Some(TRIES[i]), "request {}", i);
        }

        // The tries=5 request goes on its next accounting.
        let last = harness.get(ids[9]).await.unwrap();
        assert_eq!(last.tries, MAX_TRIES);
        let decision = harness.dispatcher().account(&last).await.unwrap();
        assert_eq!(decision, Accounting::Evict { new_tries: 6 });
        assert!(harness.get(ids[9]).await.is_none());
        assert_eq!(harness.count().await, 9);
    }
}

#[tokio::test]
async fn draining_the_mixed_queue_evicts_only_the_exhausted() {
    let harness = TestHarness::with_reply(MockReply::Status(502)).await;
    let ids = harness.seed(&TRIES).await;

    let report = harness.dispatcher().run_step(0).await.unwrap();

    assert_eq!(report.fetched, 10);
    assert_eq!(report.failed, 10);
    assert_eq!(report.updated, 9);
    assert_eq!(report.evicted, 1);
    assert!(harness.get(ids[9]).await.is_none());
    assert_eq!(harness.tries_of(ids[8]).await, Some(MAX_TRIES));
}

#[tokio::test]
async fn queue_empties_after_enough_unlimited_steps() {
    let harness = TestHarness::with_reply(MockReply::Unreachable).await;
    harness.seed(&TRIES).await;
    let dispatcher = harness.dispatcher();

    // The freshest request needs MAX_TRIES + 1 attempts.
    for _ in 0..=MAX_TRIES {
        dispatcher.run_step(0).await.unwrap();
    }

    assert_eq!(harness.count().await, 0);
}
