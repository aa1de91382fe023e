//! Price Refresh Job
//!
//! Refreshes every card price on a fixed interval (24 hours by default).
//! Supports graceful shutdown via SIGTERM/SIGINT signals.

use std::sync::Arc;

use sea_orm::DatabaseConnection;
use tokio::time::{interval, Duration};
use tracing::{error, info, warn};

use crate::error::JobError;
use crate::services::job_runner::JobRunner;
use crate::services::sync_status::{self, jobs};

/// Start the price refresh job
///
/// Spawns a background task that runs a refresh on every tick. Only the
/// first tick consults the sync status, so a restart shortly after a
/// successful run waits for the next interval instead of repeating it.
///
/// # Arguments
///
/// * `db` - Database connection holding the sync status table
/// * `runner` - Shared job runner, also used by the HTTP triggers
/// * `refresh_interval` - Time between runs
/// * `dry_run` - Log each tick without refreshing
pub async fn start_price_refresh_job(
    db: DatabaseConnection,
    runner: Arc<JobRunner>,
    refresh_interval: Duration,
    dry_run: bool,
) {
    tokio::spawn(async move {
        info!(
            refresh_interval_secs = refresh_interval.as_secs(),
            dry_run = dry_run,
            "Initializing price refresh job"
        );

        let mut interval = interval(refresh_interval);
        let mut first_tick = true;

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("Shutdown signal received, stopping price refresh job gracefully");
                    break;
                }
                _ = interval.tick() => {
                    if dry_run {
                        info!("DRY RUN: Skipping price refresh");
                        continue;
                    }

                    if std::mem::take(&mut first_tick) {
                        match sync_status::should_sync(&db, jobs::PRICE_REFRESH).await {
                            Ok(true) => {}
                            Ok(false) => continue,
                            Err(e) => warn!(error = %e, "Failed to read sync status, refreshing anyway"),
                        }
                    }

                    run_once(&runner).await;
                }
            }
        }

        info!("Price refresh job stopped");
    });
}

/// Run one refresh; the runner records it in the sync status.
async fn run_once(runner: &JobRunner) {
    info!("Starting scheduled price refresh");

    match runner.refresh().await {
        Ok(summary) => info!(
            submitted = summary.submitted,
            updated = summary.updated,
            failures = summary.failures(),
            "Scheduled price refresh completed"
        ),
        Err(JobError::AlreadyRunning(_)) => {
            info!("Price refresh already running, skipping scheduled run");
        }
        Err(e) => error!(error = %e, "Scheduled price refresh failed"),
    }
}
