// # HTTP Transport
//
// Thin axum layer over the dispatcher:
//
// - `POST /mcp`: body handed to `ToolDispatcher::handle`, response as JSON
// - any other method on `/mcp`: 405, empty body
// - `GET /healthz`: 200
//
// Bodies above the configured limit are refused with 413 before they reach
// the dispatcher. Non-POST requests never have their body read.

use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use stackflow_core::ToolDispatcher;
use std::sync::Arc;
use tracing::debug;

/// Build the router serving `dispatcher`
pub fn router(dispatcher: Arc<ToolDispatcher>, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/mcp", post(mcp).fallback(method_not_allowed))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(dispatcher)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

async fn mcp(State(dispatcher): State<Arc<ToolDispatcher>>, body: Bytes) -> Response {
    Json(dispatcher.handle(&body).await).into_response()
}

async fn method_not_allowed(method: Method) -> StatusCode {
    debug!(method = %method, "rejecting non-POST request");
    StatusCode::METHOD_NOT_ALLOWED
}
