//! DriveAudit: ownership and sharing audit reports for cloud drive files.
//!
//! Thin binary entry point. All logic lives in the `driveaudit-core`
//! and `driveaudit-cli` crates.

use clap::Parser;
use driveaudit_cli::Cli;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries the report summary.
    tracing_subscriber::fmt()
        .with_max_level(cli.log_level())
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("DriveAudit {} starting", env!("CARGO_PKG_VERSION"));

    driveaudit_cli::run(&cli)
}
