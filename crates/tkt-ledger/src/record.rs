//! Typed ticket records and the header-to-field mapping.

use serde_json::{Map, Value};

use crate::SCANS_USED_COLUMN;

/// Positions of the columns the engine cares about, resolved once per fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMap {
    pub number: Option<usize>,
    pub image: Option<usize>,
    pub tickets: Option<usize>,
    pub holder: Option<usize>,
    pub scans_used: Option<usize>,
}

impl ColumnMap {
    /// Resolve columns from header labels.
    ///
    /// - `Number`: case-insensitive exact label. Substring matching would
    ///   also hit "phone number" and the ticket-count question.
    /// - image: first label containing "image".
    /// - tickets: first label containing "total number of tickets", else
    ///   first containing "tickets".
    /// - holder: label equal to "name", else first containing "name".
    /// - `Scans Used`: case-sensitive exact label.
    pub fn from_headers(headers: &[String]) -> Self {
        let lower: Vec<String> = headers
            .iter()
            .map(|h| h.trim().to_ascii_lowercase())
            .collect();
        let exact = |label: &str| lower.iter().position(|h| h == label);
        let containing = |needle: &str| lower.iter().position(|h| h.contains(needle));

        Self {
            number: exact("number"),
            image: containing("image"),
            tickets: containing("total number of tickets").or_else(|| containing("tickets")),
            holder: exact("name").or_else(|| containing("name")),
            scans_used: headers.iter().position(|h| h == SCANS_USED_COLUMN),
        }
    }
}

/// One row of the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketRecord {
    /// 1-based physical row in the backing store.
    pub position: u32,
    /// Scannable code value from the `Number` column.
    pub identifier: String,
    /// Blank when no code was ever issued.
    pub image_reference: String,
    pub tickets_allotted: u32,
    pub scans_used: u32,
    pub holder_name: Option<String>,
    /// Raw cells padded to header width.
    pub cells: Vec<String>,
}

impl TicketRecord {
    pub fn from_row(position: u32, row: &[String], width: usize, map: &ColumnMap) -> Self {
        let mut cells: Vec<String> = row.to_vec();
        if cells.len() < width {
            cells.resize(width, String::new());
        }
        let identifier = cell_at(&cells, map.number).to_string();
        let image_reference = cell_at(&cells, map.image).to_string();
        let tickets_allotted = parse_count(cell_at(&cells, map.tickets));
        let scans_used = parse_count(cell_at(&cells, map.scans_used));
        let holder = cell_at(&cells, map.holder).trim();
        let holder_name = (!holder.is_empty()).then(|| holder.to_string());

        Self {
            position,
            identifier,
            image_reference,
            tickets_allotted,
            scans_used,
            holder_name,
            cells,
        }
    }

    /// True when a code image was issued for this holder.
    pub fn has_image(&self) -> bool {
        !self.image_reference.trim().is_empty()
    }

    /// Header-keyed object plus `rowIndex`, the shape operators see when
    /// browsing the ledger.
    pub fn to_row_object(&self, headers: &[String]) -> Map<String, Value> {
        let mut obj = Map::new();
        for (i, header) in headers.iter().enumerate() {
            let value = self.cells.get(i).cloned().unwrap_or_default();
            obj.insert(header.clone(), Value::String(value));
        }
        obj.insert("rowIndex".to_string(), Value::from(self.position));
        obj
    }
}

fn cell_at(cells: &[String], idx: Option<usize>) -> &str {
    idx.and_then(|i| cells.get(i)).map(String::as_str).unwrap_or("")
}

/// Full read of the ledger: header labels plus one record per data row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerSnapshot {
    pub headers: Vec<String>,
    pub columns: ColumnMap,
    pub records: Vec<TicketRecord>,
}

impl LedgerSnapshot {
    /// Build from raw rows. The first row is the header; data rows start at
    /// physical row 2.
    pub fn from_rows(rows: Vec<Vec<String>>) -> Option<Self> {
        let mut iter = rows.into_iter();
        let headers = iter.next()?;
        let columns = ColumnMap::from_headers(&headers);
        let width = headers.len();
        let records = iter
            .enumerate()
            .map(|(i, row)| TicketRecord::from_row(i as u32 + 2, &row, width, &columns))
            .collect();
        Some(Self {
            headers,
            columns,
            records,
        })
    }

    /// First record whose identifier equals `identifier` exactly. Blank
    /// identifiers never match, so blank rows cannot be looked up.
    pub fn find(&self, identifier: &str) -> Option<&TicketRecord> {
        if identifier.is_empty() {
            return None;
        }
        self.records.iter().find(|r| r.identifier == identifier)
    }
}

/// Permissive count parse for free-text spreadsheet cells.
///
/// Reads the leading run of decimal digits after optional whitespace and an
/// optional `+`. Anything else (blank, words, negatives) is 0. Oversized
/// values saturate at `u32::MAX`.
pub fn parse_count(raw: &str) -> u32 {
    let s = raw.trim_start();
    let s = s.strip_prefix('+').unwrap_or(s);
    let mut value: u32 = 0;
    let mut seen = false;
    for b in s.bytes() {
        if !b.is_ascii_digit() {
            break;
        }
        seen = true;
        value = value.saturating_mul(10).saturating_add(u32::from(b - b'0'));
    }
    if seen {
        value
    } else {
        0
    }
}
