//! Queue store seam used by the dispatcher.

use async_trait::async_trait;
use share_mq_database::{queries, AsyncDatabase, DatabaseResult, ShareRequest};
use tracing::debug;

/// The two queue operations a dispatcher step needs.
#[async_trait]
pub trait QueueStore: Send + Sync {
    /// Up to `limit` requests ordered by ascending `tries`, ties by insertion
    /// order. `limit == 0` means every queued request.
    async fn select_due(&self, limit: usize) -> DatabaseResult<Vec<ShareRequest>>;

    /// Delete the request when `evict`, otherwise store `new_tries` on it.
    ///
    /// Returns false if the request was already gone.
    async fn apply_accounting(&self, id: i64, new_tries: i64, evict: bool) -> DatabaseResult<bool>;
}

/// [`QueueStore`] over the SQLite `share_mq` table.
#[derive(Clone)]
pub struct ShareQueueStore {
    db: AsyncDatabase,
}

impl ShareQueueStore {
    pub fn new(db: AsyncDatabase) -> Self {
        Self { db }
    }
}

#[async_trait]
impl QueueStore for ShareQueueStore {
    async fn select_due(&self, limit: usize) -> DatabaseResult<Vec<ShareRequest>> {
        let requests = self
            .db
            .call(move |conn| queries::select_due_share_requests(conn, limit))
            .await?;
        debug!(limit, fetched = requests.len(), "Selected due share requests");
        Ok(requests)
    }

    async fn apply_accounting(&self, id: i64, new_tries: i64, evict: bool) -> DatabaseResult<bool> {
        self.db
            .call(move |conn| {
                if evict {
                    queries::delete_share_request(conn, id)
                } else {
                    queries::update_share_request_tries(conn, id, new_tries)
                }
            })
            .await
    }
}
