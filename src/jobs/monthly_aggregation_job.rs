//! Monthly Aggregation Job
//!
//! Checks once a day whether last month has been aggregated and runs the
//! aggregation when it has not. Supports graceful shutdown via SIGTERM/SIGINT.

use std::sync::Arc;

use chrono::{Datelike, NaiveDate, NaiveDateTime, Utc};
use sea_orm::DatabaseConnection;
use tokio::time::{interval, Duration};
use tracing::{error, info, warn};

use crate::error::JobError;
use crate::services::job_runner::JobRunner;
use crate::services::sync_status::{self, jobs};

/// Daily check interval in seconds
const CHECK_INTERVAL_SECS: u64 = 86400;

/// True when the job never succeeded or last succeeded in an earlier
/// calendar month than `today`.
pub fn aggregation_due(last_success: Option<NaiveDateTime>, today: NaiveDate) -> bool {
    match last_success {
        None => true,
        Some(last) => (last.year(), last.month()) < (today.year(), today.month()),
    }
}

/// Start the monthly aggregation job
///
/// # Arguments
///
/// * `db` - Database connection holding the sync status table
/// * `runner` - Shared job runner, also used by the HTTP triggers
/// * `dry_run` - Log each check without aggregating
pub async fn start_monthly_aggregation_job(
    db: DatabaseConnection,
    runner: Arc<JobRunner>,
    dry_run: bool,
) {
    tokio::spawn(async move {
        info!(
            check_interval_secs = CHECK_INTERVAL_SECS,
            dry_run = dry_run,
            "Initializing monthly aggregation job"
        );

        let mut interval = interval(Duration::from_secs(CHECK_INTERVAL_SECS));

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("Shutdown signal received, stopping monthly aggregation job gracefully");
                    break;
                }
                _ = interval.tick() => {
                    let today = Utc::now().date_naive();

                    let last = match sync_status::last_success(&db, jobs::MONTHLY_AGGREGATION).await {
                        Ok(last) => last,
                        Err(e) => {
                            warn!(error = %e, "Failed to read sync status, skipping check");
                            continue;
                        }
                    };

                    if !aggregation_due(last, today) {
                        info!(today = %today, "Last month already aggregated");
                        continue;
                    }

                    if dry_run {
                        info!("DRY RUN: Skipping monthly aggregation");
                        continue;
                    }

                    run_once(&runner, today).await;
                }
            }
        }

        info!("Monthly aggregation job stopped");
    });
}

async fn run_once(runner: &JobRunner, today: NaiveDate) {
    match runner.aggregate(today).await {
        Ok(summary) => info!(
            month = %summary.month,
            cards_averaged = summary.cards_averaged,
            daily_rows_pruned = summary.daily_rows_pruned,
            "Scheduled monthly aggregation completed"
        ),
        Err(JobError::AlreadyRunning(_)) => {
            info!("Monthly aggregation already running, skipping scheduled run");
        }
        Err(e) => error!(error = %e, "Scheduled monthly aggregation failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_due_when_never_run() {
        assert!(aggregation_due(None, date(2025, 6, 1)));
    }

    #[test]
    fn test_not_due_twice_in_same_month() {
        let last = date(2025, 6, 1).and_hms_opt(3, 0, 0).unwrap();
        assert!(!aggregation_due(Some(last), date(2025, 6, 28)));
    }

    #[test]
    fn test_due_in_next_month_and_across_years() {
        let june = date(2025, 6, 30).and_hms_opt(23, 0, 0).unwrap();
        assert!(aggregation_due(Some(june), date(2025, 7, 1)));

        let december = date(2024, 12, 2).and_hms_opt(0, 0, 0).unwrap();
        assert!(aggregation_due(Some(december), date(2025, 1, 1)));
    }

    #[test]
    fn test_check_interval() {
        assert_eq!(CHECK_INTERVAL_SECS, 86400);
    }
}
