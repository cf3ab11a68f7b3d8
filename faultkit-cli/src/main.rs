//! Command-line entry point for faultkit

use anyhow::Result;
use clap::Parser;
use faultkit_cli::commands::Commands;

/// Run and inspect structured fault-handling scenarios
#[derive(Debug, Parser)]
#[command(name = "faultkit", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

fn main() -> Result<()> {
    Cli::parse().command.execute()
}
