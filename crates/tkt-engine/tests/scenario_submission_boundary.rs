//! Scenario: the submission boundary classifies every request.
//!
//! Malformed input is a `BadRequest` decided before the ledger is read, so
//! these tests turn ledger reads off to prove nothing was touched.

use std::sync::Arc;

use tkt_engine::{Engine, Outcome, ScanBoundary};
use tkt_ledger::{CellRef, MemoryStore, TicketLedger};

fn boundary(store: &Arc<MemoryStore>) -> ScanBoundary {
    ScanBoundary::new(Arc::new(Engine::new(TicketLedger::new(store.clone()))))
}

fn bad_request<T: std::fmt::Debug>(outcome: Outcome<T>) -> String {
    match outcome {
        Outcome::BadRequest(msg) => msg,
        other => panic!("expected BadRequest, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_or_blank_code_is_rejected_before_any_read() {
    let store = Arc::new(MemoryStore::demo());
    store.fail_reads(true);
    let b = boundary(&store);

    assert_eq!(bad_request(b.submit_scan(None).await), "QR code is required");
    assert_eq!(bad_request(b.submit_scan(Some("  ")).await), "QR code is required");
    assert_eq!(bad_request(b.submit_validate(Some("")).await), "QR code is required");
}

#[tokio::test]
async fn manual_actions_validate_rows_and_counts() {
    let store = Arc::new(MemoryStore::demo());
    store.fail_reads(true);
    store.fail_writes(true);
    let b = boundary(&store);

    assert_eq!(
        bad_request(b.set_scan_count(None, Some(1)).await),
        "Row index and scan count are required"
    );
    assert!(bad_request(b.set_scan_count(Some(1), Some(1)).await).contains("2 or greater"));
    assert_eq!(
        bad_request(b.set_scan_count(Some(2), Some(-1)).await),
        "Scan count must be a non-negative integer"
    );
    assert_eq!(bad_request(b.highlight(None).await), "Row index is required");
    assert!(bad_request(b.highlight(Some(0)).await).contains("2 or greater"));
    assert!(store.format_calls().await.is_empty());
}

#[tokio::test]
async fn surrounding_whitespace_is_ignored() {
    let store = Arc::new(MemoryStore::demo());
    let Outcome::Ok(p) = boundary(&store).submit_validate(Some(" 1001\n")).await else {
        panic!("expected Ok");
    };
    assert!(p.valid);
    assert_eq!(p.guest_name.as_deref(), Some("John Doe"));
    assert_eq!(p.row_index, Some(2));
    assert_eq!(p.scans_used, Some(0));
    assert_eq!(p.remaining_scans, Some(2));
}

#[tokio::test]
async fn rejected_ticket_is_a_handled_request() {
    let store = Arc::new(MemoryStore::demo());
    let Outcome::Ok(p) = boundary(&store).submit_scan(Some("9999")).await else {
        panic!("expected Ok");
    };
    assert!(p.success);
    assert!(!p.valid);
    assert_eq!(p.message, "QR code not found in records");
    assert_eq!(p.error_type.as_deref(), Some("NOT_FOUND"));
}

#[tokio::test]
async fn ledger_failure_is_a_service_error_with_details() {
    let store = Arc::new(MemoryStore::demo());
    store.fail_reads(true);
    let b = boundary(&store);

    match b.submit_scan(Some("1001")).await {
        Outcome::ServiceError { error, details } => {
            assert_eq!(error, "Failed to process scan");
            assert!(details.contains("ledger unavailable"), "got: {details}");
        }
        other => panic!("expected ServiceError, got {other:?}"),
    }
    assert!(matches!(b.fetch_ledger().await, Outcome::ServiceError { .. }));
    assert!(matches!(b.initialize().await, Outcome::ServiceError { .. }));
}

#[tokio::test]
async fn initialize_reports_existing_column() {
    let store = Arc::new(MemoryStore::demo());
    let Outcome::Ok(p) = boundary(&store).initialize().await else {
        panic!("expected Ok");
    };
    assert_eq!(p.scans_used_column, "G");
    assert!(!p.scans_used_column_added);
}

#[tokio::test]
async fn initialize_adds_missing_column_once() {
    let store = Arc::new(MemoryStore::from_rows(&[
        &["Image", "Number", "name"],
        &["img", "1001", "John"],
    ]));
    let b = boundary(&store);

    let Outcome::Ok(first) = b.initialize().await else {
        panic!("expected Ok");
    };
    assert!(first.scans_used_column_added);
    assert_eq!(first.scans_used_column, "D");
    let Outcome::Ok(second) = b.initialize().await else {
        panic!("expected Ok");
    };
    assert!(!second.scans_used_column_added);
}

#[tokio::test]
async fn ledger_listing_keys_rows_by_header() {
    let store = Arc::new(MemoryStore::demo());
    let Outcome::Ok(p) = boundary(&store).fetch_ledger().await else {
        panic!("expected Ok");
    };
    assert_eq!(p.count, 4);
    assert_eq!(p.headers.len(), 7);
    assert_eq!(p.data[0]["Number"], "1001");
    assert_eq!(p.data[0]["rowIndex"], 2);
    assert_eq!(p.data[3]["Image"], "");
}

#[tokio::test]
async fn manual_count_override_writes_the_cell() {
    let store = Arc::new(MemoryStore::demo());
    let b = boundary(&store);

    let Outcome::Ok(p) = b.set_scan_count(Some(4), Some(0)).await else {
        panic!("expected Ok");
    };
    assert_eq!(p.message, "Updated scan count for row 4 to 0");
    assert_eq!(store.cell(CellRef::new(7, 4)).await.as_deref(), Some("0"));

    assert!(b.highlight(Some(4)).await.is_ok());
    assert_eq!(store.format_calls().await[0].row, 4);
}

#[tokio::test]
async fn health_does_not_touch_the_ledger() {
    let store = Arc::new(MemoryStore::demo());
    store.fail_reads(true);
    let h = boundary(&store).health();
    assert_eq!(h.status, "OK");
    assert_eq!(h.ledger, "memory");
    assert!(chrono::DateTime::parse_from_rfc3339(&h.timestamp).is_ok());
}
