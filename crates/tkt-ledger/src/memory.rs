//! In-process ledger store.
//!
//! Same cell semantics as the spreadsheet: 1-based addressing, ragged rows,
//! trailing empty cells dropped on read. Used by tests and by demo mode.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::store::{CellRef, LedgerStore, Tint};
use crate::LedgerError;

/// One recorded `format_row` call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FormatCall {
    pub row: u32,
    pub columns: u32,
    pub tint: Tint,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    grid: Mutex<Vec<Vec<String>>>,
    formats: Mutex<Vec<FormatCall>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    fail_formats: AtomicBool,
    yield_on_read: AtomicBool,
}

impl MemoryStore {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self {
            grid: Mutex::new(rows),
            ..Self::default()
        }
    }

    /// Convenience constructor from string slices.
    pub fn from_rows(rows: &[&[&str]]) -> Self {
        Self::new(
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    /// Four demonstration guests. `1004` never had a code issued.
    pub fn demo() -> Self {
        Self::from_rows(&[
            &[
                "Image",
                "Enter total number of tickets needed (Kids above 8 - ticket required)",
                "Number",
                "name",
                "email",
                "phone number",
                "Scans Used",
            ],
            &[
                "https://example.com/qr1.png",
                "2",
                "1001",
                "John Doe",
                "john@example.com",
                "555-0123",
                "0",
            ],
            &[
                "https://example.com/qr2.png",
                "1",
                "1002",
                "Jane Smith",
                "jane@example.com",
                "555-0124",
                "0",
            ],
            &[
                "https://example.com/qr3.png",
                "3",
                "1003",
                "Bob Johnson",
                "bob@example.com",
                "555-0125",
                "2",
            ],
            &[
                "",
                "1",
                "1004",
                "Alice Brown",
                "alice@example.com",
                "555-0126",
                "0",
            ],
        ])
    }

    /// Make every read fail with `Unavailable`.
    pub fn fail_reads(&self, on: bool) {
        self.fail_reads.store(on, Ordering::SeqCst);
    }

    /// Make every cell write fail with `Unavailable`.
    pub fn fail_writes(&self, on: bool) {
        self.fail_writes.store(on, Ordering::SeqCst);
    }

    /// Make every format call fail with `Unavailable`.
    pub fn fail_formats(&self, on: bool) {
        self.fail_formats.store(on, Ordering::SeqCst);
    }

    /// Yield to the scheduler after each read, so concurrent callers
    /// interleave the way they do against a remote store.
    pub fn yield_on_read(&self, on: bool) {
        self.yield_on_read.store(on, Ordering::SeqCst);
    }

    /// Raw cell text, `None` when outside the written grid.
    pub async fn cell(&self, cell: CellRef) -> Option<String> {
        let grid = self.grid.lock().await;
        let row = grid.get(cell.row.checked_sub(1)? as usize)?;
        row.get(cell.column.checked_sub(1)? as usize).cloned()
    }

    pub async fn rows(&self) -> Vec<Vec<String>> {
        self.grid.lock().await.clone()
    }

    pub async fn format_calls(&self) -> Vec<FormatCall> {
        self.formats.lock().await.clone()
    }

    fn unavailable(op: &str) -> LedgerError {
        LedgerError::Unavailable(format!("memory store {op} failure injected"))
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn read_rows(&self) -> Result<Vec<Vec<String>>, LedgerError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Self::unavailable("read"));
        }
        let mut rows = self.grid.lock().await.clone();
        for row in rows.iter_mut() {
            while row.last().is_some_and(|c| c.is_empty()) {
                row.pop();
            }
        }
        while rows.last().is_some_and(|r| r.is_empty()) {
            rows.pop();
        }
        if self.yield_on_read.load(Ordering::SeqCst) {
            tokio::task::yield_now().await;
        }
        Ok(rows)
    }

    async fn write_cell(&self, cell: CellRef, value: &str) -> Result<(), LedgerError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Self::unavailable("write"));
        }
        if cell.row == 0 || cell.column == 0 {
            return Err(LedgerError::Unavailable(format!(
                "invalid cell address row={} column={}",
                cell.row, cell.column
            )));
        }
        let (r, c) = (cell.row as usize - 1, cell.column as usize - 1);
        let mut grid = self.grid.lock().await;
        if grid.len() <= r {
            grid.resize(r + 1, Vec::new());
        }
        let row = &mut grid[r];
        if row.len() <= c {
            row.resize(c + 1, String::new());
        }
        row[c] = value.to_string();
        Ok(())
    }

    async fn format_row(&self, row: u32, columns: u32, tint: Tint) -> Result<(), LedgerError> {
        if self.fail_formats.load(Ordering::SeqCst) {
            return Err(Self::unavailable("format"));
        }
        self.formats
            .lock()
            .await
            .push(FormatCall { row, columns, tint });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EXHAUSTED_TINT;

    #[tokio::test]
    async fn reads_drop_trailing_blanks() {
        let store = MemoryStore::from_rows(&[&["Number", "", ""], &["1", "x", ""], &[]]);
        let rows = store.read_rows().await.unwrap();
        assert_eq!(rows, vec![vec!["Number".to_string()], vec!["1".into(), "x".into()]]);
    }

    #[tokio::test]
    async fn write_grows_grid() {
        let store = MemoryStore::from_rows(&[&["Number"]]);
        store.write_cell(CellRef::new(3, 4), "7").await.unwrap();
        assert_eq!(store.cell(CellRef::new(3, 4)).await.as_deref(), Some("7"));
        assert_eq!(store.cell(CellRef::new(2, 4)).await.as_deref(), Some(""));
        assert_eq!(store.cell(CellRef::new(9, 9)).await, None);
    }

    #[tokio::test]
    async fn default_header_read_uses_first_row() {
        let store = MemoryStore::demo();
        let header = store.read_header().await.unwrap();
        assert_eq!(header.len(), 7);
        assert_eq!(header[6], "Scans Used");
    }

    #[tokio::test]
    async fn injected_failures_surface_as_unavailable() {
        let store = MemoryStore::demo();
        store.fail_reads(true);
        assert!(matches!(
            store.read_rows().await,
            Err(LedgerError::Unavailable(_))
        ));
        store.fail_formats(true);
        assert!(store.format_row(2, 20, EXHAUSTED_TINT).await.is_err());
        assert!(store.format_calls().await.is_empty());
    }
}
