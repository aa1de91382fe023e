pub mod health;
pub mod jobs;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health))
        .route("/jobs/refresh", post(jobs::trigger_refresh))
        .route("/jobs/aggregate", post(jobs::trigger_aggregation))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
