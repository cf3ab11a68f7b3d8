//! List command implementation

use anyhow::Result;
use clap::{Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::CliConfig;
use crate::output::OutputFormat;
use crate::scenarios::CATALOG;

/// List subcommands
#[derive(Debug, Subcommand)]
pub enum ListCommands {
    /// List available scenarios
    Scenarios,

    /// List registered fault kinds
    Kinds {
        /// Configuration file with custom kinds
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
    },

    /// List available output formats
    Formats,
}

impl ListCommands {
    /// Execute the list subcommand
    pub fn execute(&self) -> Result<()> {
        match self {
            ListCommands::Scenarios => {
                println!("Available scenarios:");
                let width = CATALOG.iter().map(|s| s.name.len()).max().unwrap_or(0);
                for scenario in CATALOG {
                    println!("  {:<width$}  {}", scenario.name, scenario.summary);
                }
            }
            ListCommands::Kinds { config } => {
                let config = CliConfig::load_or_default(config.as_deref())?;
                let registry = config.kinds.install()?;
                println!("Registered fault kinds:");
                for kind in registry.all() {
                    let origin = if kind.is_builtin() { "built-in" } else { "custom" };
                    println!("  {:>3}  {:<22} {}", kind.index(), kind.to_string(), origin);
                }
            }
            ListCommands::Formats => {
                println!("Available output formats:");
                for format in OutputFormat::value_variants() {
                    if let Some(value) = format.to_possible_value() {
                        let help = value.get_help().map(ToString::to_string);
                        println!("  {:<10} {}", value.get_name(), help.unwrap_or_default());
                    }
                }
            }
        }
        Ok(())
    }
}
