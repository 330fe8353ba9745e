//! Axum router and all HTTP handlers for tkt-daemon.
//!
//! `build_router` is the single entry point; `main.rs` calls it and attaches
//! middleware layers. Handlers only translate HTTP to boundary calls and
//! boundary outcomes to status codes:
//!
//! | Outcome        | Status |
//! |----------------|--------|
//! | `Ok`           | 200    |
//! | `BadRequest`   | 400    |
//! | `ServiceError` | 500    |
//!
//! A rejected ticket is a handled request and answers 200.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tkt_engine::{FailurePayload, Outcome};

use crate::{
    api_types::{HighlightRequest, ScanCountRequest, ScanRequest},
    state::AppState,
};

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the complete application router wired to the given shared state.
///
/// Middleware layers (CORS, tracing) are **not** applied here; `main.rs`
/// attaches them after this call so tests can use the bare router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/initialize", post(initialize))
        .route("/api/sheet-data", get(sheet_data))
        .route("/api/validate-qr", post(validate_qr))
        .route("/api/process-scan", post(process_scan))
        .route("/api/update-scan-count", post(update_scan_count))
        .route("/api/highlight-row", post(highlight_row))
        .fallback(not_found)
        .with_state(state)
}

fn respond<T: Serialize>(outcome: Outcome<T>) -> Response {
    let status = match &outcome {
        Outcome::Ok(_) => StatusCode::OK,
        Outcome::BadRequest(_) => StatusCode::BAD_REQUEST,
        Outcome::ServiceError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };
    match outcome.into_result() {
        Ok(body) => (status, Json(body)).into_response(),
        Err(body) => (status, Json(body)).into_response(),
    }
}

// ---------------------------------------------------------------------------
// GET /api/health
// ---------------------------------------------------------------------------

pub(crate) async fn health(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    (StatusCode::OK, Json(st.boundary.health()))
}

// ---------------------------------------------------------------------------
// POST /api/initialize
// ---------------------------------------------------------------------------

pub(crate) async fn initialize(State(st): State<Arc<AppState>>) -> Response {
    respond(st.boundary.initialize().await)
}

// ---------------------------------------------------------------------------
// GET /api/sheet-data
// ---------------------------------------------------------------------------

pub(crate) async fn sheet_data(State(st): State<Arc<AppState>>) -> Response {
    respond(st.boundary.fetch_ledger().await)
}

// ---------------------------------------------------------------------------
// POST /api/validate-qr  /api/process-scan
// ---------------------------------------------------------------------------

// A missing or unparsable body is treated as an empty request so the
// boundary answers with its own 400 message.

pub(crate) async fn validate_qr(
    State(st): State<Arc<AppState>>,
    body: Option<Json<ScanRequest>>,
) -> Response {
    let code = body.and_then(|Json(req)| req.code());
    respond(st.boundary.submit_validate(code.as_deref()).await)
}

pub(crate) async fn process_scan(
    State(st): State<Arc<AppState>>,
    body: Option<Json<ScanRequest>>,
) -> Response {
    let code = body.and_then(|Json(req)| req.code());
    respond(st.boundary.submit_scan(code.as_deref()).await)
}

// ---------------------------------------------------------------------------
// POST /api/update-scan-count  /api/highlight-row
// ---------------------------------------------------------------------------

pub(crate) async fn update_scan_count(
    State(st): State<Arc<AppState>>,
    body: Option<Json<ScanCountRequest>>,
) -> Response {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    respond(
        st.boundary
            .set_scan_count(req.row_index(), req.scan_count())
            .await,
    )
}

pub(crate) async fn highlight_row(
    State(st): State<Arc<AppState>>,
    body: Option<Json<HighlightRequest>>,
) -> Response {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    respond(st.boundary.highlight(req.row_index()).await)
}

// ---------------------------------------------------------------------------
// Fallback
// ---------------------------------------------------------------------------

pub(crate) async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(FailurePayload::new("Endpoint not found", None)),
    )
}
