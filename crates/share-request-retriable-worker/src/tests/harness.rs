//! Test harness for dispatcher integration tests.
//!
//! Provides:
//! - MockTransport: records every POST and answers from scripted rules
//! - FailingStore: a real queue store that can be told to fail
//! - TestHarness: an in-memory queue wired to both

use crate::dispatcher::RetryDispatcher;
use crate::error::{TransportError, TransportResult};
use crate::store::{QueueStore, ShareQueueStore};
use crate::transport::{DeliveryResponse, DeliveryTransport};
use async_trait::async_trait;
use serde_json::{Map, Value};
use share_mq_database::{
    queries, AsyncDatabase, DatabaseError, DatabaseResult, NewShareRequest, Protocol, ShareRequest,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// How the mock remote answers a POST.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockReply {
    Status(u16),
    Unreachable,
}

/// One POST seen by the mock transport.
#[derive(Debug, Clone)]
pub struct PostRecord {
    pub url: String,
    pub owner_user_id: String,
    pub payload: Map<String, Value>,
}

/// Transport that never touches the network.
///
/// Rules are matched by URL prefix in insertion order; the first match
/// answers, otherwise the default reply does.
pub struct MockTransport {
    calls: Mutex<Vec<PostRecord>>,
    rules: Mutex<Vec<(String, MockReply)>>,
    default_reply: MockReply,
}

impl MockTransport {
    pub fn new(default_reply: MockReply) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            rules: Mutex::new(Vec::new()),
            default_reply,
        }
    }

    /// Answer POSTs whose full URL starts with `prefix` with `reply`.
    pub fn reply_for(&self, prefix: &str, reply: MockReply) {
        self.rules.lock().unwrap().push((prefix.to_string(), reply));
    }

    pub fn calls(&self) -> Vec<PostRecord> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_urls(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.url).collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn reply(&self, url: &str) -> MockReply {
        self.rules
            .lock()
            .unwrap()
            .iter()
            .find(|(prefix, _)| url.starts_with(prefix.as_str()))
            .map(|(_, reply)| *reply)
            .unwrap_or(self.default_reply)
    }
}

#[async_trait]
impl DeliveryTransport for MockTransport {
    async fn post(
        &self,
        url: &str,
        payload: &Map<String, Value>,
        owner_user_id: &str,
    ) -> TransportResult<DeliveryResponse> {
        self.calls.lock().unwrap().push(PostRecord {
            url: url.to_string(),
            owner_user_id: owner_user_id.to_string(),
            payload: payload.clone(),
        });

        match self.reply(url) {
            MockReply::Status(status) => Ok(DeliveryResponse {
                status,
                body: String::new(),
            }),
            MockReply::Unreachable => Err(TransportError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "connection refused",
            ))),
        }
    }
}

/// Queue store that delegates to SQLite unless told to fail.
pub struct FailingStore {
    inner: ShareQueueStore,
    fail_select: AtomicBool,
    /// Accounting writes allowed before every further one fails.
    accounting_budget: AtomicUsize,
}

impl FailingStore {
    pub fn new(inner: ShareQueueStore) -> Self {
        Self {
            inner,
            fail_select: AtomicBool::new(false),
            accounting_budget: AtomicUsize::new(usize::MAX),
        }
    }

    pub fn fail_select(&self) {
        self.fail_select.store(true, Ordering::SeqCst);
    }

    pub fn fail_accounting_after(&self, writes: usize) {
        self.accounting_budget.store(writes, Ordering::SeqCst);
    }
}

#[async_trait]
impl QueueStore for FailingStore {
    async fn select_due(&self, limit: usize) -> DatabaseResult<Vec<ShareRequest>> {
        if self.fail_select.load(Ordering::SeqCst) {
            return Err(DatabaseError::Connection("injected select failure".to_string()));
        }
        self.inner.select_due(limit).await
    }

    async fn apply_accounting(&self, id: i64, new_tries: i64, evict: bool) -> DatabaseResult<bool> {
        let allowed = self
            .accounting_budget
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if !allowed {
            return Err(DatabaseError::Connection("injected write failure".to_string()));
        }
        self.inner.apply_accounting(id, new_tries, evict).await
    }
}

/// In-memory queue plus a mock transport.
pub struct TestHarness {
    pub db: AsyncDatabase,
    pub store: Arc<ShareQueueStore>,
    pub transport: Arc<MockTransport>,
}

impl TestHarness {
    /// Harness whose remote accepts every POST.
    pub async fn new() -> Self {
        Self::with_reply(MockReply::Status(200)).await
    }

    pub async fn with_reply(default_reply: MockReply) -> Self {
        let db = AsyncDatabase::open_in_memory().await.unwrap();
        Self {
            store: Arc::new(ShareQueueStore::new(db.clone())),
            db,
            transport: Arc::new(MockTransport::new(default_reply)),
        }
    }

    pub fn dispatcher(&self) -> RetryDispatcher {
        RetryDispatcher::new(self.store.clone(), self.transport.clone())
    }

    /// Dispatcher over a store that can be made to fail.
    pub fn failing_dispatcher(&self) -> (RetryDispatcher, Arc<FailingStore>) {
        let store = Arc::new(FailingStore::new(ShareQueueStore::new(self.db.clone())));
        (
            RetryDispatcher::new(store.clone(), self.transport.clone()),
            store,
        )
    }

    /// Queue a request and force its attempt count.
    pub async fn enqueue(&self, url: &str, protocol: Protocol, payload: &str, tries: i64) -> i64 {
        let request = NewShareRequest {
            url: url.to_string(),
            payload: payload.to_string(),
            protocol,
            owner_user_id: "alice".to_string(),
        };
        self.db
            .call(move |conn| {
                let stored = queries::insert_share_request(conn, &request)?;
                queries::update_share_request_tries(conn, stored.id, tries)?;
                Ok(stored.id)
            })
            .await
            .unwrap()
    }

    /// One https request per entry of `tries`, payload `{"n": index}`.
    pub async fn seed(&self, tries: &[i64]) -> Vec<i64> {
        let mut ids = Vec::with_capacity(tries.len());
        for (i, t) in tries.iter().enumerate() {
            let url = format!("remote{}.example/ocs/v2.php/cloud/shares", i);
            ids.push(
                self.enqueue(&url, Protocol::Https, &format!(r#"{{"n":{}}}"#, i), *t)
                    .await,
            );
        }
        ids
    }

    pub async fn get(&self, id: i64) -> Option<ShareRequest> {
        self.db
            .call(move |conn| queries::get_share_request(conn, id))
            .await
            .unwrap()
    }

    pub async fn tries_of(&self, id: i64) -> Option<i64> {
        self.get(id).await.map(|r| r.tries)
    }

    pub async fn count(&self) -> usize {
        self.db.call(queries::count_share_requests).await.unwrap()
    }
}
