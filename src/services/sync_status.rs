//! Sync status bookkeeping for the scheduled jobs
//!
//! Each job records when it last ran successfully so a restarted server does
//! not immediately repeat a run that is still fresh.

use async_trait::async_trait;
use chrono::{Duration, NaiveDateTime, Utc};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{DatabaseConnection, DbErr, EntityTrait, Set};

use crate::entities::sync_status::{self, Entity as SyncStatus};
use crate::error::JobError;

/// Job names for tracking sync status
pub mod jobs {
    pub const PRICE_REFRESH: &str = "price_refresh";
    pub const MONTHLY_AGGREGATION: &str = "monthly_aggregation";
}

/// Default minimum intervals between runs (in seconds)
pub mod intervals {
    pub const PRICE_REFRESH: i32 = 86400; // 24 hours
    pub const MONTHLY_AGGREGATION: i32 = 86400; // checked daily, gated by calendar month
}

/// Whether enough time has passed since `last_success`.
pub fn interval_elapsed(
    last_success: Option<NaiveDateTime>,
    min_interval_secs: i32,
    now: NaiveDateTime,
) -> bool {
    match last_success {
        None => true,
        Some(last) => {
            now.signed_duration_since(last) >= Duration::seconds(min_interval_secs as i64)
        }
    }
}

/// Check if a job should run based on its last successful run.
///
/// Returns true on first run, after a run that never succeeded, or once
/// the stored minimum interval has elapsed.
pub async fn should_sync(db: &DatabaseConnection, job_name: &str) -> Result<bool, DbErr> {
    let status = SyncStatus::find_by_id(job_name.to_string()).one(db).await?;

    let (last_success, min_interval) = match status {
        None => {
            tracing::info!("[{}] First run detected, will sync", job_name);
            return Ok(true);
        }
        Some(record) => (record.last_success_at, record.min_interval_secs),
    };

    let now = Utc::now().naive_utc();
    let due = interval_elapsed(last_success, min_interval, now);

    match (due, last_success) {
        (true, _) => tracing::info!("[{}] Due, will sync", job_name),
        (false, Some(last)) => tracing::info!(
            "[{}] Skipping sync - last success {}s ago (min: {}s)",
            job_name,
            now.signed_duration_since(last).num_seconds(),
            min_interval
        ),
        (false, None) => {}
    }

    Ok(due)
}

/// Last successful run of a job, if any.
pub async fn last_success(
    db: &DatabaseConnection,
    job_name: &str,
) -> Result<Option<NaiveDateTime>, DbErr> {
    Ok(SyncStatus::find_by_id(job_name.to_string())
        .one(db)
        .await?
        .and_then(|record| record.last_success_at))
}

/// Record a successful run
pub async fn record_success(
    db: &DatabaseConnection,
    job_name: &str,
    default_interval_secs: i32,
) -> Result<(), DbErr> {
    let now = Utc::now().naive_utc();

    let record = sync_status::ActiveModel {
        job_name: Set(job_name.to_string()),
        last_success_at: Set(Some(now)),
        last_attempt_at: Set(Some(now)),
        last_error: Set(None),
        success_count: Set(1),
        error_count: Set(0),
        min_interval_secs: Set(default_interval_secs),
    };

    let on_conflict = OnConflict::column(sync_status::Column::JobName)
        .update_columns([
            sync_status::Column::LastSuccessAt,
            sync_status::Column::LastAttemptAt,
            sync_status::Column::LastError,
        ])
        .value(
            sync_status::Column::SuccessCount,
            Expr::col((SyncStatus, sync_status::Column::SuccessCount)).add(1),
        )
        .to_owned();

    SyncStatus::insert(record)
        .on_conflict(on_conflict)
        .exec_without_returning(db)
        .await?;

    tracing::debug!("[{}] Recorded successful sync", job_name);
    Ok(())
}

/// Record a failed run
pub async fn record_failure(
    db: &DatabaseConnection,
    job_name: &str,
    error: &str,
    default_interval_secs: i32,
) -> Result<(), DbErr> {
    let now = Utc::now().naive_utc();

    let record = sync_status::ActiveModel {
        job_name: Set(job_name.to_string()),
        last_success_at: Set(None),
        last_attempt_at: Set(Some(now)),
        last_error: Set(Some(error.to_string())),
        success_count: Set(0),
        error_count: Set(1),
        min_interval_secs: Set(default_interval_secs),
    };

    let on_conflict = OnConflict::column(sync_status::Column::JobName)
        .update_columns([
            sync_status::Column::LastAttemptAt,
            sync_status::Column::LastError,
        ])
        .value(
            sync_status::Column::ErrorCount,
            Expr::col((SyncStatus, sync_status::Column::ErrorCount)).add(1),
        )
        .to_owned();

    SyncStatus::insert(record)
        .on_conflict(on_conflict)
        .exec_without_returning(db)
        .await?;

    tracing::debug!("[{}] Recorded failed sync: {}", job_name, error);
    Ok(())
}

/// Where finished runs are recorded, whatever started them.
#[async_trait]
pub trait RunRecorder: Send + Sync {
    async fn record_success(&self, job_name: &'static str) -> Result<(), DbErr>;

    async fn record_failure(&self, job_name: &'static str, error: &str) -> Result<(), DbErr>;
}

/// Records runs in the `sync_status` table.
pub struct SyncStatusRecorder {
    db: DatabaseConnection,
    refresh_interval_secs: i32,
}

impl SyncStatusRecorder {
    pub fn new(db: DatabaseConnection, refresh_interval: std::time::Duration) -> Self {
        Self {
            db,
            refresh_interval_secs: i32::try_from(refresh_interval.as_secs()).unwrap_or(i32::MAX),
        }
    }

    fn min_interval_secs(&self, job_name: &str) -> i32 {
        match job_name {
            jobs::PRICE_REFRESH => self.refresh_interval_secs,
            _ => intervals::MONTHLY_AGGREGATION,
        }
    }
}

#[async_trait]
impl RunRecorder for SyncStatusRecorder {
    async fn record_success(&self, job_name: &'static str) -> Result<(), DbErr> {
        record_success(&self.db, job_name, self.min_interval_secs(job_name)).await
    }

    async fn record_failure(&self, job_name: &'static str, error: &str) -> Result<(), DbErr> {
        record_failure(&self.db, job_name, error, self.min_interval_secs(job_name)).await
    }
}

/// Recorder for runs without a database, such as the in-memory store.
#[derive(Debug, Default)]
pub struct NoopRecorder;

#[async_trait]
impl RunRecorder for NoopRecorder {
    async fn record_success(&self, _job_name: &'static str) -> Result<(), DbErr> {
        Ok(())
    }

    async fn record_failure(&self, _job_name: &'static str, _error: &str) -> Result<(), DbErr> {
        Ok(())
    }
}

/// Record the result of a run. A run rejected as already running is not a
/// run and is not recorded. Recorder errors are logged only.
pub async fn record_outcome<T>(
    recorder: &dyn RunRecorder,
    job_name: &'static str,
    result: &Result<T, JobError>,
) {
    let recorded = match result {
        Ok(_) => recorder.record_success(job_name).await,
        Err(JobError::AlreadyRunning(_)) => return,
        Err(e) => recorder.record_failure(job_name, &e.to_string()).await,
    };

    if let Err(e) = recorded {
        tracing::warn!("[{}] Failed to record sync status: {}", job_name, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 5, 10)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_never_succeeded_is_due() {
        assert!(interval_elapsed(None, intervals::PRICE_REFRESH, at(0)));
    }

    #[test]
    fn test_interval_elapsed() {
        assert!(!interval_elapsed(Some(at(0)), 3600, at(0) + Duration::minutes(59)));
        assert!(interval_elapsed(Some(at(0)), 3600, at(1)));
    }

    #[test]
    fn test_job_names() {
        assert_eq!(jobs::PRICE_REFRESH, "price_refresh");
        assert_eq!(jobs::MONTHLY_AGGREGATION, "monthly_aggregation");
    }
}
