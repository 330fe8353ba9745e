//! Validation verdicts and redemption results.
//!
//! Rejections are values, not errors: a scan of an unknown or used-up code is
//! an expected outcome of normal operation.

use serde::{Deserialize, Serialize};
use tkt_ledger::TicketRecord;

pub const ENTRY_GRANTED: &str = "QR Code valid - Entry granted!";
pub const DEFAULT_GUEST_NAME: &str = "Guest";

/// Why a presented code does not grant entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InvalidReason {
    NotFound,
    NoImageIssued,
    LimitExceeded,
}

impl InvalidReason {
    /// Operator-facing message.
    pub fn message(&self) -> &'static str {
        match self {
            InvalidReason::NotFound => "QR code not found in records",
            InvalidReason::NoImageIssued => {
                "No QR Code exists, manual check needed if guest persists ticket bought"
            }
            InvalidReason::LimitExceeded => "All QR Codes already used",
        }
    }

    /// Stable machine tag for clients.
    pub fn error_type(&self) -> &'static str {
        match self {
            InvalidReason::NotFound => "NOT_FOUND",
            InvalidReason::NoImageIssued => "NO_IMAGE",
            InvalidReason::LimitExceeded => "ALREADY_USED",
        }
    }
}

/// A record that may be redeemed, with the counts read at validation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidTicket {
    pub record: TicketRecord,
    pub tickets_allotted: u32,
    pub scans_used: u32,
    pub remaining_scans: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Valid(ValidTicket),
    Invalid { reason: InvalidReason },
}

impl Verdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, Verdict::Valid(_))
    }
}

/// Outcome of a successful redemption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Redemption {
    pub guest_name: String,
    pub position: u32,
    pub new_scans_used: u32,
    pub tickets_allotted: u32,
    pub remaining_scans: u32,
    pub fully_used: bool,
}

/// Validate-then-redeem result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanResult {
    Redeemed(Redemption),
    Rejected(InvalidReason),
}
