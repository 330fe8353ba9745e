//! tkt-engine
//!
//! Ticket admission rules and the submission boundary used by the daemon and
//! the CLI.
//!
//! A scan is validate-then-redeem over the ledger: read, judge, write one
//! counter cell, highlight the row. The ledger has no compare-and-set, so
//! concurrent scans of the same code may both succeed unless
//! `engine.serialize_redemptions` is enabled (single process only).

pub mod engine;
pub mod locks;
pub mod payload;
pub mod submission;
pub mod verdict;
pub mod wiring;

pub use engine::{judge, Engine};
pub use locks::RedemptionLocks;
pub use payload::{
    ActionPayload, FailurePayload, HealthPayload, InitializePayload, LedgerPayload, ScanPayload,
};
pub use submission::{Outcome, ScanBoundary, SERVICE_NAME, SERVICE_VERSION};
pub use verdict::{InvalidReason, Redemption, ScanResult, ValidTicket, Verdict};
pub use wiring::{build_boundary, open_store, open_store_with, StartupError};
