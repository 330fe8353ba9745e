//! Google Sheets v4 REST store.
//!
//! Endpoints used:
//! - `GET  /v4/spreadsheets/{id}/values/{range}` (whole tab, or row `1:1`)
//! - `PUT  /v4/spreadsheets/{id}/values/{range}?valueInputOption=RAW`
//! - `POST /v4/spreadsheets/{id}:batchUpdate` (one `repeatCell` request)

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, StatusCode, Url};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::auth::TokenSource;
use crate::store::{CellRef, LedgerStore, Tint};
use crate::LedgerError;

/// Which spreadsheet and tab to address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetsTarget {
    pub sheet_id: String,
    pub sheet_name: String,
    /// Numeric tab id; formatting requests address tabs by id, not name.
    pub sheet_gid: i64,
}

pub struct SheetsStore {
    http: reqwest::Client,
    base_url: String,
    target: SheetsTarget,
    tokens: Arc<dyn TokenSource>,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

impl SheetsStore {
    pub fn new(
        base_url: impl Into<String>,
        target: SheetsTarget,
        tokens: Arc<dyn TokenSource>,
    ) -> Result<Self, LedgerError> {
        Self::with_timeout(base_url, target, tokens, crate::DEFAULT_REQUEST_TIMEOUT)
    }

    /// Every request fails with `Unavailable` once `timeout` elapses.
    pub fn with_timeout(
        base_url: impl Into<String>,
        target: SheetsTarget,
        tokens: Arc<dyn TokenSource>,
        timeout: Duration,
    ) -> Result<Self, LedgerError> {
        Ok(Self {
            http: crate::http_client(timeout)?,
            base_url: base_url.into(),
            target,
            tokens,
        })
    }

    /// `Sheet1!H5`, quoting tab names that need it.
    fn range(&self, a1: &str) -> String {
        format!("{}!{}", quote_sheet_name(&self.target.sheet_name), a1)
    }

    /// Every populated cell of the tab, however wide.
    fn whole_tab_url(&self) -> Result<Url, LedgerError> {
        let tab = quote_sheet_name(&self.target.sheet_name);
        self.url(&[self.target.sheet_id.as_str(), "values", tab.as_str()])
    }

    fn url(&self, tail: &[&str]) -> Result<Url, LedgerError> {
        let mut url = Url::parse(self.base_url.trim_end_matches('/'))
            .map_err(|e| LedgerError::Unavailable(format!("invalid sheets base url: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| LedgerError::Unavailable("sheets base url cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets"])
            .extend(tail);
        Ok(url)
    }

    fn values_url(&self, a1: &str) -> Result<Url, LedgerError> {
        let range = self.range(a1);
        self.url(&[self.target.sheet_id.as_str(), "values", range.as_str()])
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<Value>,
    ) -> Result<reqwest::Response, LedgerError> {
        let token = self.tokens.access_token().await?;
        let mut req = self.http.request(method, url).bearer_auth(token);
        if let Some(body) = body {
            req = req.json(&body);
        }
        let resp = req
            .send()
            .await
            .map_err(|e| crate::transport_error("sheets request", &e))?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let detail = match resp.json::<ApiErrorEnvelope>().await {
            Ok(env) if !env.error.status.is_empty() => {
                format!("{} {}", env.error.status, env.error.message)
            }
            Ok(env) => env.error.message,
            Err(_) => "unreadable error body".to_string(),
        };
        let hint = if status == StatusCode::FORBIDDEN {
            " (share the sheet with the service account)"
        } else {
            ""
        };
        Err(LedgerError::Unavailable(format!(
            "sheets api error status={} message={detail}{hint}",
            status.as_u16()
        )))
    }

    async fn read_values(&self, url: Url) -> Result<Vec<Vec<String>>, LedgerError> {
        let body: ValueRange = self
            .send(Method::GET, url, None)
            .await?
            .json()
            .await
            .map_err(|e| crate::transport_error("sheets response decode", &e))?;

        Ok(body
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect())
    }
}

#[async_trait]
impl LedgerStore for SheetsStore {
    fn name(&self) -> &'static str {
        "sheets"
    }

    async fn read_rows(&self) -> Result<Vec<Vec<String>>, LedgerError> {
        // Header and data come from the same unbounded read, so a counter
        // column past Z is seen by validation and by the counter write alike.
        let rows = self.read_values(self.whole_tab_url()?).await?;
        debug!(rows = rows.len(), sheet = %self.target.sheet_name, "sheet read");
        Ok(rows)
    }

    async fn read_header(&self) -> Result<Vec<String>, LedgerError> {
        let url = self.values_url("1:1")?;
        Ok(self.read_values(url).await?.into_iter().next().unwrap_or_default())
    }

    async fn write_cell(&self, cell: CellRef, value: &str) -> Result<(), LedgerError> {
        let a1 = cell.a1();
        let mut url = self.values_url(&a1)?;
        url.query_pairs_mut().append_pair("valueInputOption", "RAW");
        let body = json!({
            "range": self.range(&a1),
            "majorDimension": "ROWS",
            "values": [[value]],
        });
        self.send(Method::PUT, url, Some(body)).await?;
        Ok(())
    }

    async fn format_row(&self, row: u32, columns: u32, tint: Tint) -> Result<(), LedgerError> {
        let batch = format!("{}:batchUpdate", self.target.sheet_id);
        let url = self.url(&[batch.as_str()])?;
        let body = json!({
            "requests": [{
                "repeatCell": {
                    "range": {
                        "sheetId": self.target.sheet_gid,
                        "startRowIndex": row.saturating_sub(1),
                        "endRowIndex": row,
                        "startColumnIndex": 0,
                        "endColumnIndex": columns,
                    },
                    "cell": { "userEnteredFormat": { "backgroundColor": tint } },
                    "fields": "userEnteredFormat.backgroundColor",
                }
            }]
        });
        self.send(Method::POST, url, Some(body)).await?;
        Ok(())
    }
}

/// Tab names with anything beyond letters, digits and `_` must be quoted in
/// A1 notation, with embedded quotes doubled.
fn quote_sheet_name(name: &str) -> String {
    if name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        name.to_string()
    } else {
        format!("'{}'", name.replace('\'', "''"))
    }
}

fn cell_text(v: Value) -> String {
    match v {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sheet_names_are_quoted_when_needed() {
        assert_eq!(quote_sheet_name("Sheet1"), "Sheet1");
        assert_eq!(quote_sheet_name("Guest List"), "'Guest List'");
        assert_eq!(quote_sheet_name("Bob's"), "'Bob''s'");
    }

    #[test]
    fn non_string_cells_are_stringified() {
        assert_eq!(cell_text(json!("x")), "x");
        assert_eq!(cell_text(json!(3)), "3");
        assert_eq!(cell_text(json!(true)), "true");
        assert_eq!(cell_text(Value::Null), "");
    }
}
