//! One-shot monthly aggregation.
//!
//! Averages last month's daily prices per card, prunes daily rows outside
//! the retention window and exits.
//!
//! Usage: cargo run --bin aggregate_monthly_prices [YYYY-MM-DD]
//!
//! The optional date stands in for "today", which selects the month before
//! it and anchors the retention cutoff.

use std::process::ExitCode;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use sea_orm::Database;
use sea_orm_migration::MigratorTrait;

use cardprice_backend::{
    config::JobConfig,
    services::{
        db_store::SeaOrmStore,
        monthly_aggregation::MonthlyAggregator,
        sync_status::{self, SyncStatusRecorder},
    },
    telemetry,
};

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    telemetry::init_tracing();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Monthly aggregation failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let today = match std::env::args().nth(1) {
        Some(arg) => NaiveDate::parse_from_str(&arg, "%Y-%m-%d")?,
        None => Utc::now().date_naive(),
    };

    let config = JobConfig::from_env()?;
    let db = Database::connect(&config.database_url).await?;
    migration::Migrator::up(&db, None).await?;

    let store = Arc::new(SeaOrmStore::new(db.clone()));
    let aggregator = MonthlyAggregator::new(store, config.aggregation.clone());

    let recorder = SyncStatusRecorder::new(db, config.refresh_interval);

    let result = aggregator.run(today).await;
    sync_status::record_outcome(&recorder, sync_status::jobs::MONTHLY_AGGREGATION, &result).await;

    let summary = result?;
    println!(
        "Aggregated {} cards for {} from {} daily rows ({} failed writes), pruned {} old rows",
        summary.cards_averaged,
        summary.month,
        summary.daily_rows_read,
        summary.write_failed,
        summary.daily_rows_pruned
    );
    Ok(())
}
