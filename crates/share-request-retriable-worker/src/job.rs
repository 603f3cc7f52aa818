//! Invocation context for the dispatcher: one-off runs and the periodic loop.

use crate::dispatcher::{RetryDispatcher, StepReport, CRON_BATCH_LIMIT, UNLIMITED};
use crate::error::DispatchResult;
use crate::store::ShareQueueStore;
use crate::transport::HttpTransport;
use share_mq_config_and_utils::{Config, Paths};
use share_mq_database::AsyncDatabase;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

/// Interval between periodic runs.
pub const RUN_INTERVAL: Duration = Duration::from_secs(15 * 60);

/// Who triggered a run. Decides how much of the queue one run may drain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunContext {
    /// Started by an operator; drains the whole backlog.
    Interactive,
    /// Started by the scheduler; handles a small fixed batch.
    Periodic,
}

impl RunContext {
    pub fn batch_limit(&self, cron_batch_limit: usize) -> usize {
        match self {
            RunContext::Interactive => UNLIMITED,
            RunContext::Periodic => cron_batch_limit,
        }
    }
}

/// The periodic share request job.
pub struct ShareRequestsJob {
    dispatcher: RetryDispatcher,
    cron_batch_limit: usize,
    interval: Duration,
}

impl ShareRequestsJob {
    pub fn new(dispatcher: RetryDispatcher) -> Self {
        Self {
            dispatcher,
            cron_batch_limit: CRON_BATCH_LIMIT,
            interval: RUN_INTERVAL,
        }
    }

    /// Wire a job against the SQLite queue and the HTTP transport.
    pub async fn open(config: &Config, paths: &Paths) -> DispatchResult<Self> {
        config.validate()?;
        let db = AsyncDatabase::open(&config.database_file(paths)).await?;
        let transport = HttpTransport::new(Duration::from_secs(config.request_timeout_secs))
            .with_certificates_root(paths.certificates_root());

        let dispatcher = RetryDispatcher::new(Arc::new(ShareQueueStore::new(db)), Arc::new(transport))
            .with_max_tries(config.max_tries);

        Ok(Self::new(dispatcher)
            .with_cron_batch_limit(config.cron_batch_limit)
            .with_interval(Duration::from_secs(config.interval_secs)))
    }

    pub fn with_cron_batch_limit(mut self, limit: usize) -> Self {
        self.cron_batch_limit = limit;
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Run a single dispatcher step sized for `context`.
    pub async fn run(&self, context: RunContext) -> DispatchResult<StepReport> {
        let batch_limit = context.batch_limit(self.cron_batch_limit);
        info!(?context, batch_limit, "Running share request job");
        self.dispatcher.run_step(batch_limit).await
    }

    /// Run a periodic step every `interval` until `shutdown` resolves.
    ///
    /// The first step runs immediately. Steps never overlap; ticks missed
    /// while a step is running are skipped. A failed step is logged and
    /// retried on the next tick.
    pub async fn serve<S>(&self, shutdown: S)
    where
        S: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        info!(interval_secs = self.interval.as_secs(), "Share request job scheduled");

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Share request job stopping");
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.run(RunContext::Periodic).await {
                        error!(error = %e, "Periodic share request step failed");
                    }
                }
            }
        }
    }
}
