//! HTTP edge
//!
//! ```text
//! request ─▶ correlation middleware (mint id, stash in extensions)
//!         ─▶ handler (validate, forward via CoreClient with id in metadata)
//!         ─▶ response + X-Correlation-ID
//! ```

pub mod client;
pub mod handlers;
pub mod openapi;
pub mod state;
pub mod status;
pub mod types;

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{HeaderValue, Request},
    middleware::{Next, from_fn_with_state},
    response::Response,
    routing::{get, post},
};
use tokio::net::TcpListener;

use crate::correlation::CORRELATION_HEADER;
pub use client::{CoreClient, GrpcCoreClient};
pub use state::EdgeState;

/// Mint a correlation id for every request and echo it on every response,
/// including rejections produced before a handler runs.
async fn correlation_middleware(
    State(state): State<Arc<EdgeState>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let id = state.ids.next_id();
    request.extensions_mut().insert(id);

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&id.to_string()) {
        response.headers_mut().insert(CORRELATION_HEADER, value);
    }
    response
}

pub fn build_router(state: Arc<EdgeState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/accounts", post(handlers::create_account))
        .route("/transfers", post(handlers::make_transfer))
        .route("/api-docs/openapi.json", get(openapi::openapi_json))
        .layer(from_fn_with_state(state.clone(), correlation_middleware))
        .with_state(state)
}

/// Start the HTTP edge and serve until the process stops
pub async fn run_server(listen_addr: &str, state: Arc<EdgeState>) -> anyhow::Result<()> {
    let app = build_router(state);

    let listener = TcpListener::bind(listen_addr).await.map_err(|e| {
        anyhow::anyhow!(
            "failed to bind {}: {} (is the port already in use?)",
            listen_addr,
            e
        )
    })?;

    tracing::info!(addr = listen_addr, "Edge listening");
    tracing::info!("API Docs: http://{}/api-docs/openapi.json", listen_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
