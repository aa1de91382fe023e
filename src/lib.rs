// src/lib.rs

use std::sync::Arc;

use services::job_runner::JobRunner;

#[derive(Clone)]
pub struct AppState {
    pub jobs: Arc<JobRunner>,
}

pub mod entities {
    pub mod prelude;
    pub mod card_prices;
    pub mod cards;
    pub mod daily_card_prices;
    pub mod monthly_card_prices;
    pub mod sets;
    pub mod sync_status;
}

pub mod services {
    pub mod catalog_store;
    pub mod db_store;
    pub mod job_runner;
    pub mod memory_store;
    pub mod monthly_aggregation;
    pub mod price_refresh;
    pub mod retry;
    pub mod sync_status;
    pub mod upsert_writer;
}

pub mod config;
pub mod error;
pub mod handlers;
pub mod jobs;
pub mod models;
pub mod scrapers;
pub mod telemetry;
