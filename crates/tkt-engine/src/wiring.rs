//! Startup wiring: settings in, ready [`ScanBoundary`] out.
//!
//! Sheets mode resolves credentials and parses the private key here, before
//! any ledger request, so a misconfigured deployment refuses to start
//! instead of failing on the first scan.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tkt_config::secrets::resolve_credentials_with;
use tkt_config::{ConfigError, LedgerMode, TktConfig};
use tkt_ledger::{
    LedgerError, LedgerStore, MemoryStore, ServiceAccountTokens, SheetsStore, SheetsTarget,
    TicketLedger,
};
use tracing::info;

use crate::engine::Engine;
use crate::submission::ScanBoundary;

#[derive(Debug)]
pub enum StartupError {
    Config(ConfigError),
    Ledger(LedgerError),
}

impl fmt::Display for StartupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartupError::Config(e) => write!(f, "{e}"),
            StartupError::Ledger(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for StartupError {}

impl From<ConfigError> for StartupError {
    fn from(e: ConfigError) -> Self {
        StartupError::Config(e)
    }
}

impl From<LedgerError> for StartupError {
    fn from(e: LedgerError) -> Self {
        StartupError::Ledger(e)
    }
}

/// Build the configured store, reading credentials from the process env.
pub fn open_store(config: &TktConfig) -> Result<Arc<dyn LedgerStore>, StartupError> {
    open_store_with(config, |var| std::env::var(var).ok())
}

/// Build the configured store, resolving credentials through `lookup`.
pub fn open_store_with<F>(
    config: &TktConfig,
    lookup: F,
) -> Result<Arc<dyn LedgerStore>, StartupError>
where
    F: Fn(&str) -> Option<String>,
{
    let ledger = &config.ledger;
    match ledger.mode {
        LedgerMode::Demo => {
            info!("ledger: in-memory demo data");
            Ok(Arc::new(MemoryStore::demo()))
        }
        LedgerMode::Sheets => {
            let sheet_id = ledger
                .sheet_id
                .clone()
                .filter(|s| !s.trim().is_empty())
                .ok_or_else(|| ConfigError::Missing {
                    what: "spreadsheet id",
                    var: "SHEET_ID".to_string(),
                })?;
            let creds = resolve_credentials_with(&config.credentials, lookup)?;
            let timeout = Duration::from_secs(ledger.request_timeout_secs);
            let tokens = ServiceAccountTokens::with_timeout(
                creds.principal,
                &creds.private_key,
                ledger.token_url.clone(),
                timeout,
            )?;
            info!(sheet = %ledger.sheet_name, "ledger: google sheets");
            Ok(Arc::new(SheetsStore::with_timeout(
                ledger.api_base_url.clone(),
                SheetsTarget {
                    sheet_id,
                    sheet_name: ledger.sheet_name.clone(),
                    sheet_gid: ledger.sheet_gid,
                },
                Arc::new(tokens),
                timeout,
            )?))
        }
    }
}

/// Engine and boundary over an already-built store.
pub fn build_boundary(config: &TktConfig, store: Arc<dyn LedgerStore>) -> ScanBoundary {
    let ledger = TicketLedger::with_highlight_columns(store, config.ledger.highlight_columns);
    let engine = Engine::with_settings(ledger, config.engine);
    ScanBoundary::new(Arc::new(engine))
}
