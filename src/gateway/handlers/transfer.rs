//! POST /transfers

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::{info, warn};

use super::super::state::EdgeState;
use super::super::status::http_error_for;
use super::super::types::{ApiResponse, TransferBody, TransferData, error_response};
use super::bad_body;
use crate::correlation::CorrelationId;
use crate::rpc::messages::TransferRequest as TransferRequestMsg;

/// Move funds between two accounts
#[utoipa::path(
    post,
    path = "/transfers",
    request_body = TransferBody,
    responses(
        (status = 200, description = "Transfer committed", body = TransferData),
        (status = 400, description = "Malformed body or validation failure"),
        (status = 404, description = "Account not found"),
        (status = 409, description = "Conflict"),
        (status = 422, description = "Insufficient funds"),
        (status = 500, description = "Internal error")
    ),
    tag = "Transfers"
)]
pub async fn make_transfer(
    State(state): State<Arc<EdgeState>>,
    Extension(correlation_id): Extension<CorrelationId>,
    payload: Result<Json<TransferBody>, JsonRejection>,
) -> Response {
    let body = match payload {
        Ok(Json(body)) => body,
        Err(rejection) => return bad_body(rejection),
    };

    let req = body.to_request();
    if let Err(e) = req.validate() {
        warn!(%correlation_id, code = e.code(), "Invalid transfer request");
        return error_response(StatusCode::BAD_REQUEST, e.public_message());
    }

    info!(
        %correlation_id,
        source = req.source_id,
        destination = req.destination_id,
        "Initiating transfer"
    );

    let msg = TransferRequestMsg {
        source_id: req.source_id,
        destination_id: req.destination_id,
        amount: req.amount.to_string(),
    };

    match state.core.make_transfer(correlation_id, msg).await {
        Ok(resp) => (
            StatusCode::OK,
            Json(ApiResponse::success(TransferData {
                success: resp.success,
                transaction_id: resp.transaction_id,
                audit_id: resp.audit_id,
                new_source_balance: resp.new_source_balance,
            })),
        )
            .into_response(),
        Err(status) => {
            warn!(
                %correlation_id,
                grpc_code = ?status.code(),
                error = %status.message(),
                "Transfer failed via RPC"
            );
            let (http, msg) = http_error_for(&status);
            error_response(http, msg)
        }
    }
}
