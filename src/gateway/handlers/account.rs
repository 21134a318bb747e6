//! POST /accounts

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::{info, warn};

use super::super::state::EdgeState;
use super::super::status::http_error_for;
use super::super::types::{AccountCreatedData, ApiResponse, CreateAccountBody, error_response};
use super::bad_body;
use crate::correlation::CorrelationId;
use crate::rpc::messages::CreateAccountRequest;

/// Create an account with an opening balance
#[utoipa::path(
    post,
    path = "/accounts",
    request_body = CreateAccountBody,
    responses(
        (status = 201, description = "Account created", body = AccountCreatedData),
        (status = 400, description = "Malformed body or invalid values"),
        (status = 409, description = "Account already exists"),
        (status = 500, description = "Internal error")
    ),
    tag = "Accounts"
)]
pub async fn create_account(
    State(state): State<Arc<EdgeState>>,
    Extension(correlation_id): Extension<CorrelationId>,
    payload: Result<Json<CreateAccountBody>, JsonRejection>,
) -> Response {
    let body = match payload {
        Ok(Json(body)) => body,
        Err(rejection) => return bad_body(rejection),
    };

    let account = body.to_account();
    if let Err(e) = account.validate() {
        warn!(%correlation_id, account_id = account.id, code = e.code(), "Invalid account");
        return error_response(StatusCode::BAD_REQUEST, e.public_message());
    }

    info!(%correlation_id, account_id = account.id, "Forwarding account creation to core");
    let req = CreateAccountRequest {
        account_id: account.id,
        balance: account.balance.to_string(),
    };

    match state.core.create_account(correlation_id, req).await {
        Ok(resp) => (
            StatusCode::CREATED,
            Json(ApiResponse::success(AccountCreatedData {
                account_id: account.id,
                success: resp.success,
            })),
        )
            .into_response(),
        Err(status) => {
            warn!(
                %correlation_id,
                account_id = account.id,
                grpc_code = ?status.code(),
                error = %status.message(),
                "Account creation failed via RPC"
            );
            let (http, msg) = http_error_for(&status);
            error_response(http, msg)
        }
    }
}
