use sea_orm::DbErr;

/// Errors raised by the catalog store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid row: {0}")]
    InvalidRow(String),
}

/// Errors that end a job run
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("Catalog unavailable: {0}")]
    Catalog(#[source] StoreError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Job {0} is already running")]
    AlreadyRunning(&'static str),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}
