//! API handlers
//!
//! Each handler extracts state and parameters with axum extractors, calls the
//! account or auth service, and maps the result to a JSON response or an
//! [`ApiError`](crate::error::ApiError).

pub mod account;
pub mod auth;
pub mod response;

use axum::Json;

use response::HealthResponse;

/// Liveness check
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}
