use axum::Json;

use crate::models::response::HealthResponse;

pub async fn root() -> &'static str {
    "Hello from Card Price Backend!"
}

/// Handler for GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}
