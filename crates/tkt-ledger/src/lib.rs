//! tkt-ledger
//!
//! The ticket ledger accessor and the stores behind it.
//!
//! [`LedgerStore`] is the positional cell model of the backing spreadsheet.
//! [`TicketLedger`] sits on top of it and translates between named columns
//! and cell positions. Two stores ship here: [`SheetsStore`] (Google Sheets
//! over REST) and [`MemoryStore`] (in-process grid for tests and demo mode).

pub mod accessor;
pub mod auth;
pub mod memory;
pub mod record;
pub mod sheets;
pub mod store;

pub use accessor::{EnsuredColumn, TicketLedger};
pub use auth::{ServiceAccountTokens, StaticToken, TokenSource};
pub use memory::{FormatCall, MemoryStore};
pub use record::{parse_count, ColumnMap, LedgerSnapshot, TicketRecord};
pub use sheets::{SheetsStore, SheetsTarget};
pub use store::{CellRef, LedgerStore, Tint, EXHAUSTED_TINT};

use std::fmt;
use std::time::Duration;

/// Canonical header label of the redemption counter column.
pub const SCANS_USED_COLUMN: &str = "Scans Used";

/// Upper bound on one ledger or token round trip when none is configured.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Failures surfaced by the ledger accessor and its stores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// The store returned no rows at all, not even a header.
    EmptyLedger,
    /// A required header is absent.
    ColumnMissing(String),
    /// Transport, auth, permission or quota failure reaching the store.
    Unavailable(String),
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerError::EmptyLedger => write!(f, "no data found in ledger"),
            LedgerError::ColumnMissing(name) => write!(f, "{name} column not found"),
            LedgerError::Unavailable(msg) => write!(f, "ledger unavailable: {msg}"),
        }
    }
}

impl std::error::Error for LedgerError {}

// ---------------------------------------------------------------------------
// HTTP transport
// ---------------------------------------------------------------------------

/// Client shared by the REST store and the token exchange. A stalled
/// upstream turns into `Unavailable` instead of hanging the caller.
pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client, LedgerError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| LedgerError::Unavailable(format!("http client setup failed: {e}")))
}

pub(crate) fn transport_error(what: &str, e: &reqwest::Error) -> LedgerError {
    if e.is_timeout() {
        LedgerError::Unavailable(format!("{what} timed out"))
    } else {
        LedgerError::Unavailable(format!("{what} failed: {e}"))
    }
}

// ---------------------------------------------------------------------------
// Column addressing
// ---------------------------------------------------------------------------

/// Convert a 1-based column number to its spreadsheet letter label.
///
/// Bijective base-26: 1 → `A`, 26 → `Z`, 27 → `AA`. Zero has no label and
/// yields an empty string.
pub fn column_letter(column: u32) -> String {
    let mut n = column;
    let mut out = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        out.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_letters_match_spreadsheet_labels() {
        assert_eq!(column_letter(1), "A");
        assert_eq!(column_letter(8), "H");
        assert_eq!(column_letter(26), "Z");
        assert_eq!(column_letter(27), "AA");
        assert_eq!(column_letter(52), "AZ");
        assert_eq!(column_letter(53), "BA");
        assert_eq!(column_letter(702), "ZZ");
        assert_eq!(column_letter(703), "AAA");
    }

    #[test]
    fn column_zero_has_no_label() {
        assert_eq!(column_letter(0), "");
    }

    #[test]
    fn ledger_error_display() {
        assert_eq!(
            LedgerError::ColumnMissing(SCANS_USED_COLUMN.to_string()).to_string(),
            "Scans Used column not found"
        );
        assert_eq!(
            LedgerError::Unavailable("timeout".to_string()).to_string(),
            "ledger unavailable: timeout"
        );
    }
}
