//! Scan Validation Engine.
//!
//! # Contract
//! - [`Engine::validate`] never writes to the ledger.
//! - [`Engine::redeem`] writes exactly one counter cell, then applies the
//!   exhausted highlight. A highlight failure is logged and never undoes the
//!   counter write.
//! - Verdict rules, in order: not found, no image, limit reached, valid.
//!   A counter above the allotment reads as limit reached.

use std::sync::Arc;

use tkt_config::{EngineSettings, HighlightPolicy};
use tkt_ledger::{LedgerError, LedgerSnapshot, TicketLedger};
use tracing::{info, warn};

use crate::locks::RedemptionLocks;
use crate::verdict::{
    InvalidReason, Redemption, ScanResult, ValidTicket, Verdict, DEFAULT_GUEST_NAME,
};

pub struct Engine {
    ledger: TicketLedger,
    highlight: HighlightPolicy,
    locks: Option<Arc<RedemptionLocks>>,
}

impl Engine {
    /// Defaults: highlight after every redemption, no serialization.
    pub fn new(ledger: TicketLedger) -> Self {
        Self::with_settings(ledger, EngineSettings::default())
    }

    pub fn with_settings(ledger: TicketLedger, settings: EngineSettings) -> Self {
        let locks = settings
            .serialize_redemptions
            .then(|| Arc::new(RedemptionLocks::new()));
        Self {
            ledger,
            highlight: settings.highlight,
            locks,
        }
    }

    pub fn ledger(&self) -> &TicketLedger {
        &self.ledger
    }

    pub fn serializes_redemptions(&self) -> bool {
        self.locks.is_some()
    }

    /// Judge `identifier` against a fresh read of the ledger.
    pub async fn validate(&self, identifier: &str) -> Result<Verdict, LedgerError> {
        let snapshot = self.ledger.fetch_all().await?;
        Ok(judge(&snapshot, identifier))
    }

    /// Consume one admission for a ticket validated moments ago.
    pub async fn redeem(&self, ticket: &ValidTicket) -> Result<Redemption, LedgerError> {
        let position = ticket.record.position;
        let new_scans_used = ticket.scans_used.saturating_add(1);
        self.ledger.write_scan_count(position, new_scans_used).await?;

        let fully_used = new_scans_used >= ticket.tickets_allotted;
        let highlight = match self.highlight {
            HighlightPolicy::Always => true,
            HighlightPolicy::WhenExhausted => fully_used,
        };
        if highlight {
            if let Err(e) = self.ledger.mark_exhausted(position).await {
                warn!(position, error = %e, "row highlight failed; scan count kept");
            }
        }

        let redemption = Redemption {
            guest_name: ticket
                .record
                .holder_name
                .clone()
                .unwrap_or_else(|| DEFAULT_GUEST_NAME.to_string()),
            position,
            new_scans_used,
            tickets_allotted: ticket.tickets_allotted,
            remaining_scans: ticket.tickets_allotted.saturating_sub(new_scans_used),
            fully_used,
        };
        info!(
            identifier = %ticket.record.identifier,
            position,
            scans_used = new_scans_used,
            allotted = ticket.tickets_allotted,
            "ticket redeemed"
        );
        Ok(redemption)
    }

    /// Validate, then redeem when valid. Rejections never write.
    pub async fn process_scan(&self, identifier: &str) -> Result<ScanResult, LedgerError> {
        let _guard = match &self.locks {
            Some(locks) => Some(locks.acquire(identifier).await),
            None => None,
        };

        match self.validate(identifier).await? {
            Verdict::Valid(ticket) => Ok(ScanResult::Redeemed(self.redeem(&ticket).await?)),
            Verdict::Invalid { reason } => {
                info!(identifier, reason = reason.error_type(), "scan rejected");
                Ok(ScanResult::Rejected(reason))
            }
        }
    }
}

/// Pure verdict over an already-read snapshot.
pub fn judge(snapshot: &LedgerSnapshot, identifier: &str) -> Verdict {
    let Some(record) = snapshot.find(identifier) else {
        return Verdict::Invalid {
            reason: InvalidReason::NotFound,
        };
    };
    if !record.has_image() {
        return Verdict::Invalid {
            reason: InvalidReason::NoImageIssued,
        };
    }
    if record.scans_used >= record.tickets_allotted {
        return Verdict::Invalid {
            reason: InvalidReason::LimitExceeded,
        };
    }
    Verdict::Valid(ValidTicket {
        record: record.clone(),
        tickets_allotted: record.tickets_allotted,
        scans_used: record.scans_used,
        remaining_scans: record.tickets_allotted - record.scans_used,
    })
}
