//! API response types
//!
//! - `ApiResponse<T>`: unified response wrapper
//! - response DTOs for accounts, transfers and health

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Unified API response wrapper
///
/// - code: 0 = success, otherwise the HTTP status code
/// - msg: short message description
/// - data: actual data (success) or absent (error)
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    #[schema(example = 0)]
    pub code: i32,
    #[schema(example = "ok")]
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: 0,
            msg: "ok".to_string(),
            data: Some(data),
        }
    }

    pub fn error(code: i32, msg: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            code,
            msg: msg.into(),
            data: None,
        }
    }
}

/// Error response: HTTP status with a `{code, msg}` body
pub fn error_response(status: StatusCode, msg: impl Into<String>) -> Response {
    (
        status,
        Json(ApiResponse::<()>::error(status.as_u16() as i32, msg)),
    )
        .into_response()
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AccountCreatedData {
    #[schema(example = 100)]
    pub account_id: i64,
    pub success: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TransferData {
    pub success: bool,
    /// Same value as `audit_id`
    #[schema(example = 1)]
    pub transaction_id: i64,
    #[schema(example = 1)]
    pub audit_id: i64,
    #[schema(example = "950.00")]
    pub new_source_balance: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Server timestamp in milliseconds
    #[schema(example = 1703494800000_u64)]
    pub timestamp_ms: u64,
}
