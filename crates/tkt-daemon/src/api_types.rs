//! Request bodies for the tkt-daemon HTTP endpoints.
//!
//! Scanner front ends send loosely typed JSON: codes arrive as strings or
//! bare numbers, row indexes sometimes as numeric strings. Fields are kept
//! as raw JSON values here and narrowed by the accessors; anything that does
//! not narrow counts as absent. Response bodies live in `tkt_engine::payload`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// /api/validate-qr  /api/process-scan
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRequest {
    #[serde(default)]
    pub qr_code: Option<Value>,
}

impl ScanRequest {
    /// Code text as scanned. Numbers are rendered without a fraction when
    /// integral, so `1001` and `"1001"` are the same code.
    pub fn code(&self) -> Option<String> {
        match self.qr_code.as_ref()? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(number_text(n)),
            _ => None,
        }
    }
}

/// Integral floats drop the fraction, so `1001.0` matches the cell `1001`.
fn number_text(n: &serde_json::Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    n.as_f64().map(|f| f.to_string()).unwrap_or_else(|| n.to_string())
}

// ---------------------------------------------------------------------------
// /api/update-scan-count
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanCountRequest {
    #[serde(default)]
    pub row_index: Option<Value>,
    #[serde(default)]
    pub scan_count: Option<Value>,
}

impl ScanCountRequest {
    pub fn row_index(&self) -> Option<i64> {
        self.row_index.as_ref().and_then(integer)
    }

    pub fn scan_count(&self) -> Option<i64> {
        self.scan_count.as_ref().and_then(integer)
    }
}

// ---------------------------------------------------------------------------
// /api/highlight-row
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HighlightRequest {
    #[serde(default)]
    pub row_index: Option<Value>,
}

impl HighlightRequest {
    pub fn row_index(&self) -> Option<i64> {
        self.row_index.as_ref().and_then(integer)
    }
}

/// Integral JSON number or decimal string.
fn integer(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
