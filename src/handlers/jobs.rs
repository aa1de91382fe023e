use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;

use crate::{
    error::JobError,
    models::{
        job::AggregationSummary,
        response::{ErrorResponse, JobStartedResponse},
    },
    services::sync_status::jobs,
    AppState,
};

fn error_response(e: JobError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match e {
        JobError::AlreadyRunning(_) => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    (
        status,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
}

/// Handler for POST /jobs/refresh
/// Starts a price refresh in the background and returns immediately
pub async fn trigger_refresh(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<JobStartedResponse>), (StatusCode, Json<ErrorResponse>)> {
    match state.jobs.spawn_refresh() {
        // The task logs and records its own outcome
        Ok(_handle) => {
            tracing::info!("Price refresh triggered over HTTP");
            Ok((
                StatusCode::ACCEPTED,
                Json(JobStartedResponse {
                    job: jobs::PRICE_REFRESH.to_string(),
                    status: "started".to_string(),
                }),
            ))
        }
        Err(e) => {
            tracing::info!(error = %e, "Rejected price refresh trigger");
            Err(error_response(e))
        }
    }
}

/// Handler for POST /jobs/aggregate
/// Aggregates last month's daily prices and returns the run summary
pub async fn trigger_aggregation(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<AggregationSummary>), (StatusCode, Json<ErrorResponse>)> {
    let today = Utc::now().date_naive();

    match state.jobs.aggregate(today).await {
        Ok(summary) => Ok((StatusCode::OK, Json(summary))),
        Err(e) => {
            tracing::error!(error = %e, "Monthly aggregation triggered over HTTP failed");
            Err(error_response(e))
        }
    }
}
