//! Scan Submission Boundary.
//!
//! Turns untrusted operator input into engine calls and engine results into
//! wire payloads. Every operation answers with an [`Outcome`]:
//!
//! - `Ok`: the request was handled (a rejected ticket is still `Ok`).
//! - `BadRequest`: input was missing or malformed. The ledger was not touched.
//! - `ServiceError`: the ledger failed. `details` carries the cause.

use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use tkt_ledger::{column_letter, LedgerError, SCANS_USED_COLUMN};
use tracing::{error, info};

use crate::engine::Engine;
use crate::payload::{
    ActionPayload, FailurePayload, HealthPayload, InitializePayload, LedgerPayload, ScanPayload,
};

pub const SERVICE_NAME: &str = "tkt-daemon";
pub const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Lowest physical row holding ticket data; row 1 is the header.
pub const FIRST_DATA_ROW: i64 = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Ok(T),
    BadRequest(String),
    ServiceError { error: String, details: String },
}

impl<T> Outcome<T> {
    pub fn is_ok(&self) -> bool {
        matches!(self, Outcome::Ok(_))
    }

    /// Split into the success payload or the failure body.
    pub fn into_result(self) -> Result<T, FailurePayload> {
        match self {
            Outcome::Ok(v) => Ok(v),
            Outcome::BadRequest(msg) => Err(FailurePayload::new(msg, None)),
            Outcome::ServiceError { error, details } => {
                Err(FailurePayload::new(error, Some(details)))
            }
        }
    }

    fn service_error(op: &str, context: &str, err: &LedgerError) -> Self {
        error!(op, error = %err, "ledger operation failed");
        Outcome::ServiceError {
            error: context.to_string(),
            details: err.to_string(),
        }
    }
}

/// Front door shared by the daemon and the CLI.
#[derive(Clone)]
pub struct ScanBoundary {
    engine: Arc<Engine>,
}

impl ScanBoundary {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Liveness only. Does not touch the ledger.
    pub fn health(&self) -> HealthPayload {
        HealthPayload {
            status: "OK".to_string(),
            message: "Ticket scan service is running".to_string(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            service: SERVICE_NAME.to_string(),
            version: SERVICE_VERSION.to_string(),
            ledger: self.engine.ledger().store_name().to_string(),
        }
    }

    /// Make sure the counter column exists. Safe to repeat.
    pub async fn initialize(&self) -> Outcome<InitializePayload> {
        match self.engine.ledger().ensure_column(SCANS_USED_COLUMN).await {
            Ok(col) => Outcome::Ok(InitializePayload {
                success: true,
                message: "Ledger service initialized successfully".to_string(),
                scans_used_column: column_letter(col.index as u32 + 1),
                scans_used_column_added: col.added,
            }),
            Err(e) => Outcome::service_error("initialize", "Failed to initialize ledger service", &e),
        }
    }

    pub async fn fetch_ledger(&self) -> Outcome<LedgerPayload> {
        match self.engine.ledger().fetch_all().await {
            Ok(snapshot) => {
                let data: Vec<_> = snapshot
                    .records
                    .iter()
                    .map(|r| r.to_row_object(&snapshot.headers))
                    .collect();
                Outcome::Ok(LedgerPayload {
                    success: true,
                    count: data.len(),
                    headers: snapshot.headers,
                    data,
                })
            }
            Err(e) => Outcome::service_error("fetch_ledger", "Failed to fetch sheet data", &e),
        }
    }

    /// Read-only verdict for `identifier`.
    pub async fn submit_validate(&self, identifier: Option<&str>) -> Outcome<ScanPayload> {
        let Some(id) = required_identifier(identifier) else {
            return Outcome::BadRequest("QR code is required".to_string());
        };
        match self.engine.validate(id).await {
            Ok(verdict) => Outcome::Ok(ScanPayload::from_verdict(&verdict)),
            Err(e) => Outcome::service_error("validate", "Failed to validate QR code", &e),
        }
    }

    /// Validate and redeem `identifier`.
    pub async fn submit_scan(&self, identifier: Option<&str>) -> Outcome<ScanPayload> {
        let Some(id) = required_identifier(identifier) else {
            return Outcome::BadRequest("QR code is required".to_string());
        };
        match self.engine.process_scan(id).await {
            Ok(result) => Outcome::Ok(ScanPayload::from_scan(&result)),
            Err(e) => Outcome::service_error("scan", "Failed to process scan", &e),
        }
    }

    /// Operator override of a row's counter. No allotment check.
    pub async fn set_scan_count(
        &self,
        position: Option<i64>,
        scan_count: Option<i64>,
    ) -> Outcome<ActionPayload> {
        let (Some(position), Some(scan_count)) = (position, scan_count) else {
            return Outcome::BadRequest("Row index and scan count are required".to_string());
        };
        let Some(row) = data_row(position) else {
            return Outcome::BadRequest(row_error());
        };
        let Ok(count) = u32::try_from(scan_count) else {
            return Outcome::BadRequest("Scan count must be a non-negative integer".to_string());
        };

        match self.engine.ledger().write_scan_count(row, count).await {
            Ok(()) => {
                info!(row, count, "scan count set manually");
                Outcome::Ok(ActionPayload {
                    success: true,
                    message: format!("Updated scan count for row {row} to {count}"),
                })
            }
            Err(e) => Outcome::service_error("set_scan_count", "Failed to update scan count", &e),
        }
    }

    /// Operator-triggered highlight of a row.
    pub async fn highlight(&self, position: Option<i64>) -> Outcome<ActionPayload> {
        let Some(position) = position else {
            return Outcome::BadRequest("Row index is required".to_string());
        };
        let Some(row) = data_row(position) else {
            return Outcome::BadRequest(row_error());
        };

        match self.engine.ledger().mark_exhausted(row).await {
            Ok(()) => {
                info!(row, "row highlighted manually");
                Outcome::Ok(ActionPayload {
                    success: true,
                    message: format!("Highlighted row {row}"),
                })
            }
            Err(e) => Outcome::service_error("highlight", "Failed to highlight row", &e),
        }
    }
}

/// Trimmed, non-empty identifier.
fn required_identifier(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

fn data_row(position: i64) -> Option<u32> {
    if position < FIRST_DATA_ROW {
        return None;
    }
    u32::try_from(position).ok()
}

fn row_error() -> String {
    format!("Row index must be a data row ({FIRST_DATA_ROW} or greater)")
}
