//! Health check handler

use std::time::{SystemTime, UNIX_EPOCH};

use axum::{Json, http::StatusCode};

use super::super::types::{ApiResponse, HealthResponse};

/// Health check endpoint
///
/// Liveness of the edge process only; core reachability shows up on the
/// first forwarded call.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service healthy", body = HealthResponse, content_type = "application/json")
    ),
    tag = "System"
)]
pub async fn health_check() -> (StatusCode, Json<ApiResponse<HealthResponse>>) {
    let now_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);

    (
        StatusCode::OK,
        Json(ApiResponse::success(HealthResponse {
            timestamp_ms: now_ms,
        })),
    )
}
