pub mod monthly_aggregation_job;
pub mod price_refresh_job;
