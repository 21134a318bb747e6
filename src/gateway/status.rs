//! RPC status → HTTP status, the edge half of the error mapping.

use axum::http::StatusCode;
use tonic::{Code, Status};

/// Body text for anything outside the mapped set
pub const INTERNAL_MESSAGE: &str = "Internal Server Error";

pub fn http_status_for(code: Code) -> StatusCode {
    match code {
        Code::NotFound => StatusCode::NOT_FOUND,
        Code::FailedPrecondition => StatusCode::UNPROCESSABLE_ENTITY,
        Code::InvalidArgument => StatusCode::BAD_REQUEST,
        Code::AlreadyExists => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// HTTP status plus the message safe to show the caller.
///
/// Mapped codes pass the core's fixed message through; everything else is
/// reduced to a generic 500 so transport or internal detail never leaks.
pub fn http_error_for(status: &Status) -> (StatusCode, String) {
    let http = http_status_for(status.code());
    if http == StatusCode::INTERNAL_SERVER_ERROR {
        (http, INTERNAL_MESSAGE.to_string())
    } else {
        (http, status.message().to_string())
    }
}
