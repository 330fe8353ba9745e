//! Command helpers for tkt-cli.
//!
//! Every command prints one JSON document on stdout. The exit code mirrors
//! the daemon's status classes: 0 handled, 2 bad input, 1 ledger failure.

use std::process::ExitCode;

use anyhow::{Context, Result};
use serde::Serialize;
use tkt_config::{LoadedConfig, ENV_CONFIG_PATH};
use tkt_engine::{build_boundary, open_store, Outcome, ScanBoundary};
use tracing::debug;

pub const EXIT_BAD_REQUEST: u8 = 2;
pub const EXIT_SERVICE_ERROR: u8 = 1;

/// Load settings; `--demo` forces the in-memory ledger.
pub fn load_settings(path: Option<&str>, demo: bool) -> Result<LoadedConfig> {
    let loaded = tkt_config::load_with(path, |name| {
        if demo && name == "TKT_LEDGER_MODE" {
            return Some("demo".to_string());
        }
        std::env::var(name).ok()
    })
    .with_context(|| {
        format!("settings rejected (file: --config or {ENV_CONFIG_PATH})")
    })?;
    debug!(config_hash = %loaded.config_hash, "settings loaded");
    Ok(loaded)
}

pub fn open_boundary(loaded: &LoadedConfig) -> Result<ScanBoundary> {
    let store = open_store(&loaded.config).context("ledger store unavailable")?;
    Ok(build_boundary(&loaded.config, store))
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("json render failed")?;
    println!("{text}");
    Ok(())
}

/// Print the success payload or failure body and pick the exit code.
pub fn finish<T: Serialize>(outcome: Outcome<T>) -> Result<ExitCode> {
    let code = match &outcome {
        Outcome::Ok(_) => ExitCode::SUCCESS,
        Outcome::BadRequest(_) => ExitCode::from(EXIT_BAD_REQUEST),
        Outcome::ServiceError { .. } => ExitCode::from(EXIT_SERVICE_ERROR),
    };
    match outcome.into_result() {
        Ok(body) => print_json(&body)?,
        Err(body) => print_json(&body)?,
    }
    Ok(code)
}
