//! Single entry point for triggering the two jobs.
//!
//! Each job is guarded by its own lock; a trigger that arrives while the
//! same job is still running is rejected rather than queued. Every run that
//! gets the lock is recorded through the runner's [`RunRecorder`], whether it
//! came from the scheduler or an HTTP trigger.

use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::config::{AggregationConfig, RefreshConfig};
use crate::error::JobError;
use crate::models::job::{AggregationSummary, RefreshSummary};
use crate::scrapers::PriceSource;
use crate::services::catalog_store::CatalogStore;
use crate::services::monthly_aggregation::MonthlyAggregator;
use crate::services::price_refresh::PriceRefresher;
use crate::services::sync_status::{NoopRecorder, RunRecorder, jobs, record_outcome};

pub struct JobRunner {
    refresher: Arc<PriceRefresher>,
    aggregator: Arc<MonthlyAggregator>,
    recorder: Arc<dyn RunRecorder>,
    refresh_lock: Arc<Mutex<()>>,
    aggregation_lock: Arc<Mutex<()>>,
}

impl JobRunner {
    pub fn new(
        store: Arc<dyn CatalogStore>,
        source: Arc<dyn PriceSource>,
        refresh: RefreshConfig,
        aggregation: AggregationConfig,
    ) -> Self {
        Self {
            refresher: Arc::new(PriceRefresher::new(store.clone(), source, refresh)),
            aggregator: Arc::new(MonthlyAggregator::new(store, aggregation)),
            recorder: Arc::new(NoopRecorder),
            refresh_lock: Arc::new(Mutex::new(())),
            aggregation_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn with_recorder(mut self, recorder: Arc<dyn RunRecorder>) -> Self {
        self.recorder = recorder;
        self
    }

    /// Run a refresh to completion on the current task.
    pub async fn refresh(&self) -> Result<RefreshSummary, JobError> {
        let _guard = self
            .refresh_lock
            .try_lock()
            .map_err(|_| JobError::AlreadyRunning(jobs::PRICE_REFRESH))?;

        let result = self.refresher.run().await;
        record_outcome(self.recorder.as_ref(), jobs::PRICE_REFRESH, &result).await;
        result
    }

    /// Start a refresh on a background task.
    ///
    /// The lock is taken before spawning, so a second call fails straight
    /// away instead of racing the first.
    pub fn spawn_refresh(&self) -> Result<JoinHandle<Result<RefreshSummary, JobError>>, JobError> {
        let guard = self
            .refresh_lock
            .clone()
            .try_lock_owned()
            .map_err(|_| JobError::AlreadyRunning(jobs::PRICE_REFRESH))?;

        let refresher = self.refresher.clone();
        let recorder = self.recorder.clone();
        Ok(tokio::spawn(async move {
            let _guard = guard;
            let result = refresher.run().await;
            match &result {
                Ok(summary) => tracing::info!(
                    submitted = summary.submitted,
                    updated = summary.updated,
                    failures = summary.failures(),
                    "Background price refresh completed"
                ),
                Err(e) => tracing::error!(error = %e, "Background price refresh failed"),
            }
            record_outcome(recorder.as_ref(), jobs::PRICE_REFRESH, &result).await;
            result
        }))
    }

    /// Aggregate the month before `today`.
    pub async fn aggregate(&self, today: NaiveDate) -> Result<AggregationSummary, JobError> {
        let _guard = self
            .aggregation_lock
            .try_lock()
            .map_err(|_| JobError::AlreadyRunning(jobs::MONTHLY_AGGREGATION))?;

        let result = self.aggregator.run(today).await;
        record_outcome(self.recorder.as_ref(), jobs::MONTHLY_AGGREGATION, &result).await;
        result
    }
}
