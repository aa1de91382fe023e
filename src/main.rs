use std::process::ExitCode;
use std::sync::Arc;

use sea_orm::Database;
use sea_orm_migration::MigratorTrait;

use cardprice_backend::{
    AppState,
    config::JobConfig,
    handlers,
    jobs::{
        monthly_aggregation_job::start_monthly_aggregation_job,
        price_refresh_job::start_price_refresh_job,
    },
    scrapers::pricecharting::PriceChartingScraper,
    services::{db_store::SeaOrmStore, job_runner::JobRunner, sync_status::SyncStatusRecorder},
    telemetry,
};

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables before the filter reads RUST_LOG
    dotenvy::dotenv().ok();
    telemetry::init_tracing();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Server exited with error");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = JobConfig::from_env()?;

    // Connect to database
    tracing::info!("Connecting to database...");
    let db = Database::connect(&config.database_url).await?;

    // Run migrations
    tracing::info!("Running migrations...");
    migration::Migrator::up(&db, None).await?;

    let store = Arc::new(SeaOrmStore::new(db.clone()));
    let source = Arc::new(PriceChartingScraper::new(config.scraper.clone())?);
    let recorder = Arc::new(SyncStatusRecorder::new(db.clone(), config.refresh_interval));
    let runner = Arc::new(
        JobRunner::new(
            store,
            source,
            config.refresh.clone(),
            config.aggregation.clone(),
        )
        .with_recorder(recorder),
    );

    start_price_refresh_job(
        db.clone(),
        runner.clone(),
        config.refresh_interval,
        config.dry_run,
    )
    .await;
    start_monthly_aggregation_job(db, runner.clone(), config.dry_run).await;

    let app = handlers::router(AppState { jobs: runner });

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("Shutdown signal received, stopping server");
        })
        .await?;

    Ok(())
}
