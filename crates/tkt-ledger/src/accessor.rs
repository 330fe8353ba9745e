//! Ticket Ledger Accessor: named-column operations over a [`LedgerStore`].

use std::sync::Arc;

use tracing::{debug, info};

use crate::record::LedgerSnapshot;
use crate::store::{CellRef, LedgerStore, EXHAUSTED_TINT};
use crate::{LedgerError, SCANS_USED_COLUMN};

/// Explicit handle to the ledger. Built once at startup and shared.
#[derive(Clone)]
pub struct TicketLedger {
    store: Arc<dyn LedgerStore>,
    highlight_columns: u32,
}

impl TicketLedger {
    pub const DEFAULT_HIGHLIGHT_COLUMNS: u32 = 20;

    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self::with_highlight_columns(store, Self::DEFAULT_HIGHLIGHT_COLUMNS)
    }

    pub fn with_highlight_columns(store: Arc<dyn LedgerStore>, highlight_columns: u32) -> Self {
        Self {
            store,
            highlight_columns,
        }
    }

    pub fn store_name(&self) -> &'static str {
        self.store.name()
    }

    /// Read the full range. Header-only ledgers yield zero records; a range
    /// with no rows at all is [`LedgerError::EmptyLedger`].
    pub async fn fetch_all(&self) -> Result<LedgerSnapshot, LedgerError> {
        let rows = self.store.read_rows().await?;
        let snapshot = LedgerSnapshot::from_rows(rows).ok_or(LedgerError::EmptyLedger)?;
        debug!(records = snapshot.records.len(), "ledger fetched");
        Ok(snapshot)
    }

    /// 0-based index of the `name` header, appending it as the new rightmost
    /// header cell when absent. The match is exact and case-sensitive.
    pub async fn ensure_column(&self, name: &str) -> Result<EnsuredColumn, LedgerError> {
        let snapshot = self.fetch_all().await?;
        if let Some(index) = snapshot.headers.iter().position(|h| h == name) {
            return Ok(EnsuredColumn {
                index,
                added: false,
            });
        }

        let index = snapshot.headers.len();
        let cell = CellRef::new(index as u32 + 1, 1);
        self.store.write_cell(cell, name).await?;
        info!(column = %cell.a1(), name, "ledger column added");
        Ok(EnsuredColumn { index, added: true })
    }

    /// Overwrite the `Scans Used` cell on row `position`.
    pub async fn write_scan_count(&self, position: u32, value: u32) -> Result<(), LedgerError> {
        let header = self.store.read_header().await?;
        let index = header
            .iter()
            .position(|h| h == SCANS_USED_COLUMN)
            .ok_or_else(|| LedgerError::ColumnMissing(SCANS_USED_COLUMN.to_string()))?;

        let cell = CellRef::new(index as u32 + 1, position);
        self.store.write_cell(cell, &value.to_string()).await?;
        debug!(cell = %cell.a1(), value, "scan count written");
        Ok(())
    }

    /// Tint the leading columns of row `position`. Cosmetic only.
    pub async fn mark_exhausted(&self, position: u32) -> Result<(), LedgerError> {
        self.store
            .format_row(position, self.highlight_columns, EXHAUSTED_TINT)
            .await
    }
}

/// Result of [`TicketLedger::ensure_column`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnsuredColumn {
    /// 0-based header index.
    pub index: usize,
    /// True when this call wrote the header.
    pub added: bool,
}
