use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "tkt")]
#[command(about = "Event ticket scan CLI", long_about = None)]
struct Cli {
    /// Settings YAML (overrides TKT_CONFIG)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Use the in-memory demo ledger instead of Google Sheets
    #[arg(long, global = true, default_value_t = false)]
    demo: bool,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Liveness payload; does not read the ledger
    Health,

    /// Ensure the "Scans Used" column exists
    Init,

    /// Print every ledger row keyed by header
    Ledger,

    /// Check a code without consuming an admission
    Validate {
        /// Code as printed on the ticket
        code: String,
    },

    /// Check a code and consume one admission
    Scan {
        /// Code as printed on the ticket
        code: String,
    },

    /// Overwrite a row's scan counter
    SetCount {
        /// Physical row (2 = first data row)
        #[arg(allow_negative_numbers = true)]
        row: i64,

        /// New counter value
        #[arg(allow_negative_numbers = true)]
        count: i64,
    },

    /// Highlight a row as exhausted
    Highlight {
        /// Physical row (2 = first data row)
        #[arg(allow_negative_numbers = true)]
        row: i64,
    },

    /// Print the settings hash and canonical JSON
    ConfigHash,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Dev convenience; production injects env vars directly.
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::dotenv();

    // stdout carries the JSON result; logs go to stderr.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let cli = Cli::parse();
    let loaded = commands::load_settings(cli.config.as_deref(), cli.demo)?;

    if matches!(cli.cmd, Commands::ConfigHash) {
        println!("config_hash={}", loaded.config_hash);
        println!("{}", loaded.canonical_json);
        return Ok(ExitCode::SUCCESS);
    }

    let boundary = commands::open_boundary(&loaded)?;

    match cli.cmd {
        Commands::Health => {
            commands::print_json(&boundary.health())?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Init => commands::finish(boundary.initialize().await),
        Commands::Ledger => commands::finish(boundary.fetch_ledger().await),
        Commands::Validate { code } => {
            commands::finish(boundary.submit_validate(Some(code.as_str())).await)
        }
        Commands::Scan { code } => commands::finish(boundary.submit_scan(Some(code.as_str())).await),
        Commands::SetCount { row, count } => {
            commands::finish(boundary.set_scan_count(Some(row), Some(count)).await)
        }
        Commands::Highlight { row } => commands::finish(boundary.highlight(Some(row)).await),
        Commands::ConfigHash => Ok(ExitCode::SUCCESS),
    }
}
