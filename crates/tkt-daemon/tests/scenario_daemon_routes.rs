//! In-process scenario tests for tkt-daemon HTTP endpoints.
//!
//! These tests spin up the Axum router **without** binding a TCP socket.
//! Each test calls `routes::build_router` over the in-memory demo ledger and
//! drives it via `tower::ServiceExt::oneshot`. No network I/O required.

use std::sync::Arc;

use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tkt_daemon::{routes, state};
use tkt_engine::{Engine, ScanBoundary};
use tkt_ledger::{CellRef, MemoryStore, TicketLedger};
use tower::ServiceExt; // oneshot

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Fresh router over the demo ledger. The store handle is returned so tests
/// can inspect cells or inject failures.
fn make_router() -> (axum::Router, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::demo());
    let boundary = ScanBoundary::new(Arc::new(Engine::new(TicketLedger::new(store.clone()))));
    (routes::build_router(state::AppState::shared(boundary)), store)
}

/// Drive the router with a single request and return (status, body_bytes).
async fn call(router: axum::Router, req: Request<axum::body::Body>) -> (StatusCode, bytes::Bytes) {
    let resp = router.oneshot(req).await.expect("oneshot failed");
    let status = resp.status();
    let body = resp
        .into_body()
        .collect()
        .await
        .expect("body collect failed")
        .to_bytes();
    (status, body)
}

/// Parse body bytes as a `serde_json::Value`.
fn parse_json(b: bytes::Bytes) -> serde_json::Value {
    serde_json::from_slice(&b).expect("body is not valid JSON")
}

fn get(uri: &str) -> Request<axum::body::Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap()
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<axum::body::Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(axum::body::Body::from(body.to_string()))
        .unwrap()
}

// ---------------------------------------------------------------------------
// GET /api/health
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_returns_200_ok() {
    let (router, store) = make_router();
    store.fail_reads(true);

    let (status, body) = call(router, get("/api/health")).await;
    assert_eq!(status, StatusCode::OK);

    let json = parse_json(body);
    assert_eq!(json["status"], "OK");
    assert_eq!(json["service"], "tkt-daemon");
    assert!(json["timestamp"].is_string());
}

// ---------------------------------------------------------------------------
// POST /api/process-scan
// ---------------------------------------------------------------------------

#[tokio::test]
async fn scan_redeems_and_reports_counts() {
    let (router, store) = make_router();

    let (status, body) = call(
        router,
        post_json("/api/process-scan", serde_json::json!({ "qrCode": "1001" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let json = parse_json(body);
    assert_eq!(json["success"], true);
    assert_eq!(json["valid"], true);
    assert_eq!(json["message"], "QR Code valid - Entry granted!");
    assert_eq!(json["guestName"], "John Doe");
    assert_eq!(json["scansUsed"], 1);
    assert_eq!(json["totalTickets"], 2);
    assert_eq!(json["remainingScans"], 1);
    assert_eq!(json["fullyUsed"], false);
    assert_eq!(store.cell(CellRef::new(7, 2)).await.as_deref(), Some("1"));
}

#[tokio::test]
async fn numeric_code_is_accepted() {
    let (router, _store) = make_router();
    let (status, body) = call(
        router,
        post_json("/api/process-scan", serde_json::json!({ "qrCode": 1002 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse_json(body)["fullyUsed"], true);
}

#[tokio::test]
async fn integral_float_code_matches_integer_cell() {
    let (router, store) = make_router();
    let (status, body) = call(
        router,
        post_json("/api/process-scan", serde_json::json!({ "qrCode": 1001.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse_json(body)["valid"], true);
    assert_eq!(store.cell(CellRef::new(7, 2)).await.as_deref(), Some("1"));
}

#[tokio::test]
async fn used_up_ticket_is_200_with_already_used() {
    let (router, _store) = make_router();
    let scan = || post_json("/api/process-scan", serde_json::json!({ "qrCode": "1002" }));

    let (status, _) = call(router.clone(), scan()).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(router, scan()).await;
    assert_eq!(status, StatusCode::OK);
    let json = parse_json(body);
    assert_eq!(json["valid"], false);
    assert_eq!(json["errorType"], "ALREADY_USED");
    assert_eq!(json["error"], "All QR Codes already used");
}

#[tokio::test]
async fn missing_code_is_400() {
    let (router, _store) = make_router();
    let (status, body) = call(
        router,
        post_json("/api/process-scan", serde_json::json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let json = parse_json(body);
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], "QR code is required");
}

#[tokio::test]
async fn unparsable_body_is_400_not_422() {
    let (router, _store) = make_router();
    let req = Request::builder()
        .method("POST")
        .uri("/api/validate-qr")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{not json"))
        .unwrap();

    let (status, body) = call(router, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(parse_json(body)["error"], "QR code is required");
}

#[tokio::test]
async fn ledger_outage_is_500_with_details() {
    let (router, store) = make_router();
    store.fail_reads(true);

    let (status, body) = call(
        router,
        post_json("/api/process-scan", serde_json::json!({ "qrCode": "1001" })),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let json = parse_json(body);
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], "Failed to process scan");
    assert!(json["details"].as_str().unwrap().contains("ledger unavailable"));
}

// ---------------------------------------------------------------------------
// POST /api/validate-qr
// ---------------------------------------------------------------------------

#[tokio::test]
async fn validate_does_not_write() {
    let (router, store) = make_router();

    let (status, body) = call(
        router,
        post_json("/api/validate-qr", serde_json::json!({ "qrCode": "1004" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let json = parse_json(body);
    assert_eq!(json["valid"], false);
    assert_eq!(json["errorType"], "NO_IMAGE");

    assert_eq!(store.cell(CellRef::new(7, 5)).await.as_deref(), Some("0"));
    assert!(store.format_calls().await.is_empty());
}

// ---------------------------------------------------------------------------
// GET /api/sheet-data  POST /api/initialize
// ---------------------------------------------------------------------------

#[tokio::test]
async fn sheet_data_lists_rows_with_row_index() {
    let (router, _store) = make_router();
    let (status, body) = call(router, get("/api/sheet-data")).await;
    assert_eq!(status, StatusCode::OK);

    let json = parse_json(body);
    assert_eq!(json["count"], 4);
    assert_eq!(json["data"][1]["name"], "Jane Smith");
    assert_eq!(json["data"][1]["rowIndex"], 3);
}

#[tokio::test]
async fn initialize_is_idempotent() {
    let (router, _store) = make_router();
    let (status, body) = call(router, post_json("/api/initialize", serde_json::json!({}))).await;
    assert_eq!(status, StatusCode::OK);

    let json = parse_json(body);
    assert_eq!(json["success"], true);
    assert_eq!(json["scansUsedColumnAdded"], false);
    assert_eq!(json["scansUsedColumn"], "G");
}

// ---------------------------------------------------------------------------
// Manual operations
// ---------------------------------------------------------------------------

#[tokio::test]
async fn update_scan_count_writes_cell() {
    let (router, store) = make_router();
    let (status, _) = call(
        router,
        post_json(
            "/api/update-scan-count",
            serde_json::json!({ "rowIndex": 4, "scanCount": 0 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(store.cell(CellRef::new(7, 4)).await.as_deref(), Some("0"));
}

#[tokio::test]
async fn update_scan_count_rejects_header_row() {
    let (router, store) = make_router();
    let (status, _) = call(
        router,
        post_json(
            "/api/update-scan-count",
            serde_json::json!({ "rowIndex": 1, "scanCount": 3 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        store.cell(CellRef::new(7, 1)).await.as_deref(),
        Some("Scans Used")
    );
}

#[tokio::test]
async fn highlight_row_requires_row_index() {
    let (router, _store) = make_router();
    let (status, body) = call(
        router,
        post_json("/api/highlight-row", serde_json::json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(parse_json(body)["error"], "Row index is required");
}

#[tokio::test]
async fn highlight_row_formats_the_row() {
    let (router, store) = make_router();
    let (status, _) = call(
        router,
        post_json("/api/highlight-row", serde_json::json!({ "rowIndex": "3" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(store.format_calls().await[0].row, 3);
}

// ---------------------------------------------------------------------------
// Fallback
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_path_is_404_json() {
    let (router, _store) = make_router();
    let (status, body) = call(router, get("/api/nope")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let json = parse_json(body);
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], "Endpoint not found");
}
