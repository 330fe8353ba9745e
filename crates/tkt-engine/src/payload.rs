//! Wire payloads returned by the submission boundary.
//!
//! Field names are camelCase; scanner front ends read them as-is. These
//! types are `Serialize + Deserialize` so tests can decode what the daemon
//! and CLI print. No business logic lives here.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::verdict::{Redemption, ScanResult, Verdict, ENTRY_GRANTED};

// ---------------------------------------------------------------------------
// health
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthPayload {
    pub status: String,
    pub message: String,
    /// RFC 3339, UTC.
    pub timestamp: String,
    pub service: String,
    pub version: String,
    /// `sheets` or `memory`.
    pub ledger: String,
}

// ---------------------------------------------------------------------------
// initialize
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializePayload {
    pub success: bool,
    pub message: String,
    /// Spreadsheet letter of the counter column, e.g. `G`.
    pub scans_used_column: String,
    pub scans_used_column_added: bool,
}

// ---------------------------------------------------------------------------
// ledger listing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerPayload {
    pub success: bool,
    pub headers: Vec<String>,
    /// Header-keyed rows, each with its `rowIndex`.
    pub data: Vec<Map<String, Value>>,
    pub count: usize,
}

// ---------------------------------------------------------------------------
// validate / scan
// ---------------------------------------------------------------------------

/// Verdict or redemption as seen by the scanner UI.
///
/// `success` reports that the request was handled; `valid` carries the
/// admission decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanPayload {
    pub success: bool,
    pub valid: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guest_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_index: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_tickets: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scans_used: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining_scans: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fully_used: Option<bool>,
}

impl ScanPayload {
    fn rejected(message: &str, error_type: &str) -> Self {
        Self {
            success: true,
            valid: false,
            message: message.to_string(),
            error: Some(message.to_string()),
            error_type: Some(error_type.to_string()),
            guest_name: None,
            row_index: None,
            total_tickets: None,
            scans_used: None,
            remaining_scans: None,
            fully_used: None,
        }
    }

    /// Read-only check: counts are as found in the ledger.
    pub fn from_verdict(verdict: &Verdict) -> Self {
        match verdict {
            Verdict::Valid(t) => Self {
                success: true,
                valid: true,
                message: ENTRY_GRANTED.to_string(),
                error: None,
                error_type: None,
                guest_name: t.record.holder_name.clone(),
                row_index: Some(t.record.position),
                total_tickets: Some(t.tickets_allotted),
                scans_used: Some(t.scans_used),
                remaining_scans: Some(t.remaining_scans),
                fully_used: None,
            },
            Verdict::Invalid { reason } => Self::rejected(reason.message(), reason.error_type()),
        }
    }

    /// Scan with redemption: counts are after the write.
    pub fn from_scan(result: &ScanResult) -> Self {
        match result {
            ScanResult::Redeemed(r) => Self::from_redemption(r),
            ScanResult::Rejected(reason) => Self::rejected(reason.message(), reason.error_type()),
        }
    }

    fn from_redemption(r: &Redemption) -> Self {
        Self {
            success: true,
            valid: true,
            message: ENTRY_GRANTED.to_string(),
            error: None,
            error_type: None,
            guest_name: Some(r.guest_name.clone()),
            row_index: Some(r.position),
            total_tickets: Some(r.tickets_allotted),
            scans_used: Some(r.new_scans_used),
            remaining_scans: Some(r.remaining_scans),
            fully_used: Some(r.fully_used),
        }
    }
}

// ---------------------------------------------------------------------------
// manual actions / failures
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionPayload {
    pub success: bool,
    pub message: String,
}

/// Body of every 4xx/5xx response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailurePayload {
    pub success: bool,
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl FailurePayload {
    pub fn new(error: impl Into<String>, details: Option<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            details,
        }
    }
}
