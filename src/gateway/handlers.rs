//! HTTP handlers
//!
//! Each handler validates locally, forwards to the core with the request's
//! correlation id, and maps the RPC outcome through [`super::status`].

pub mod account;
pub mod health;
pub mod transfer;

pub use account::create_account;
pub use health::health_check;
pub use transfer::make_transfer;

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::Response;

use super::types::error_response;

/// Body rejections (bad JSON, wrong types, JSON numbers for money) are all 400
pub(crate) fn bad_body(rejection: JsonRejection) -> Response {
    tracing::warn!(error = %rejection.body_text(), "Rejected request body");
    error_response(StatusCode::BAD_REQUEST, "Invalid JSON")
}
