//! OpenAPI documentation for the edge API
//!
//! - OpenAPI JSON: `http://localhost:8080/api-docs/openapi.json`

use axum::Json;
use utoipa::OpenApi;

use crate::gateway::types::{
    AccountCreatedData, CreateAccountBody, HealthResponse, TransferBody, TransferData,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Account Transfer API",
        version = "1.0.0",
        description = "Accounts and atomic transfers over a PostgreSQL ledger. Money is always a decimal string.",
        license(
            name = "MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Development"),
    ),
    paths(
        crate::gateway::handlers::health::health_check,
        crate::gateway::handlers::account::create_account,
        crate::gateway::handlers::transfer::make_transfer,
    ),
    components(
        schemas(
            HealthResponse,
            CreateAccountBody,
            AccountCreatedData,
            TransferBody,
            TransferData,
        )
    ),
    tags(
        (name = "System", description = "Liveness"),
        (name = "Accounts", description = "Account creation"),
        (name = "Transfers", description = "Atomic fund movement")
    )
)]
pub struct ApiDoc;

/// GET /api-docs/openapi.json
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
