//! Store boundary: the positional cell model of the backing spreadsheet.
//!
//! No header semantics live here. Rows and columns are 1-based, matching
//! spreadsheet addressing.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{column_letter, LedgerError};

/// A single cell address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRef {
    /// 1-based column number.
    pub column: u32,
    /// 1-based row number.
    pub row: u32,
}

impl CellRef {
    pub fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// A1 notation without a sheet prefix, e.g. `H5`.
    pub fn a1(&self) -> String {
        format!("{}{}", column_letter(self.column), self.row)
    }
}

/// Background colour with channels in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tint {
    pub red: f32,
    pub green: f32,
    pub blue: f32,
    pub alpha: f32,
}

/// Translucent red applied to rows whose tickets are used up.
pub const EXHAUSTED_TINT: Tint = Tint {
    red: 1.0,
    green: 0.0,
    blue: 0.0,
    alpha: 0.3,
};

/// Backing tabular store.
///
/// Object safe so callers can hold an `Arc<dyn LedgerStore>` and swap the
/// real spreadsheet for an in-memory grid.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Short name for logs (e.g. `"sheets"`).
    fn name(&self) -> &'static str;

    /// Read every row of the configured range. Rows may be ragged; trailing
    /// empty cells are omitted. An entirely empty sheet yields an empty vec.
    async fn read_rows(&self) -> Result<Vec<Vec<String>>, LedgerError>;

    /// Read only the first row. Defaults to the first row of [`read_rows`].
    ///
    /// [`read_rows`]: LedgerStore::read_rows
    async fn read_header(&self) -> Result<Vec<String>, LedgerError> {
        Ok(self.read_rows().await?.into_iter().next().unwrap_or_default())
    }

    /// Overwrite exactly one cell with a raw (unparsed) value.
    async fn write_cell(&self, cell: CellRef, value: &str) -> Result<(), LedgerError>;

    /// Paint the background of columns `1..=columns` on `row`.
    async fn format_row(&self, row: u32, columns: u32, tint: Tint) -> Result<(), LedgerError>;
}
