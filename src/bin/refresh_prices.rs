//! One-shot price refresh.
//!
//! Runs a single refresh over the whole catalog and exits. Exit code 1 when
//! the catalog could not be read or the configuration is invalid.
//!
//! Usage: cargo run --bin refresh_prices

use std::process::ExitCode;
use std::sync::Arc;

use sea_orm::Database;
use sea_orm_migration::MigratorTrait;

use cardprice_backend::{
    config::JobConfig,
    scrapers::pricecharting::PriceChartingScraper,
    services::{
        db_store::SeaOrmStore,
        price_refresh::PriceRefresher,
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
            tracing::error!(error = %e, "Price refresh failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = JobConfig::from_env()?;
    let db = Database::connect(&config.database_url).await?;
    migration::Migrator::up(&db, None).await?;

    let store = Arc::new(SeaOrmStore::new(db.clone()));
    let source = Arc::new(PriceChartingScraper::new(config.scraper.clone())?);
    let refresher = PriceRefresher::new(store, source, config.refresh.clone());

    let recorder = SyncStatusRecorder::new(db, config.refresh_interval);

    let result = refresher.run().await;
    sync_status::record_outcome(&recorder, sync_status::jobs::PRICE_REFRESH, &result).await;

    let summary = result?;
    println!(
        "Refreshed {} of {} cards ({} without price, {} failed writes, {} timed out, {} panicked)",
        summary.updated,
        summary.submitted,
        summary.no_price,
        summary.write_failed,
        summary.timed_out,
        summary.panicked
    );
    Ok(())
}
