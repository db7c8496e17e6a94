//! groups-sync: mirror local groups into UW Groups Web Service groups.
//!
//! # Usage
//!
//! ```text
//! groups-sync [--config <path>] [--dry-run]
//! ```
//!
//! Runs one sync pass and exits. Status lines go to stdout, diagnostics
//! (`RUST_LOG`) to stderr. Exit status is 1 if any group failed.

mod commands;

use std::process::ExitCode;

use clap::Parser;

use commands::sync::SyncArgs;

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "groups-sync",
    version,
    about = "Sync local group membership to UW Groups Web Service",
    long_about = None,
)]
struct Cli {
    #[command(flatten)]
    sync: SyncArgs,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    match cli.sync.run() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            println!("FATAL: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
