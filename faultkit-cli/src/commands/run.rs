//! Run command implementation

use anyhow::{Context, Result};
use clap::Args;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use crate::config::CliConfig;
use crate::error::CliError;
use crate::output::OutputFormat;
use crate::scenarios::{self, Scenario, CATALOG};

/// Arguments for the run command
#[derive(Debug, Args)]
pub struct RunArgs {
    /// Scenarios to run (see `faultkit list scenarios`)
    #[arg(value_name = "SCENARIO")]
    pub scenarios: Vec<String>,

    /// Run every scenario
    #[arg(short, long, conflicts_with = "scenarios")]
    pub all: bool,

    /// Output format (default: from config, else text)
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Suppress the summary line and logging
    #[arg(short, long)]
    pub quiet: bool,

    /// Increase verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl RunArgs {
    /// Execute the run command
    pub fn execute(&self) -> Result<()> {
        // Initialize logging based on verbosity
        self.init_logging()?;

        log::info!("Starting scenario run");
        log::debug!("Arguments: {:?}", self);

        let config = CliConfig::load_or_default(self.config.as_deref())?;
        config.kinds.install()?;

        let selected = self.select()?;
        let format = match self.format {
            Some(format) => format,
            None => config.output.format()?,
        };

        let writer: Box<dyn Write + Send + Sync> = match &self.output {
            Some(path) => Box::new(BufWriter::new(
                File::create(path)
                    .with_context(|| format!("Failed to create {}", path.display()))?,
            )),
            None => Box::new(io::stdout()),
        };
        let mut formatter = format.formatter(writer, &config.output);

        let mut resolved = 0;
        for scenario in &selected {
            let outcome = scenario.run();
            if outcome.is_resolved() {
                resolved += 1;
            }
            formatter.format_outcome(&outcome)?;
        }
        formatter.finish()?;

        if !self.quiet {
            eprintln!(
                "Ran {} scenarios: {} resolved, {} failed",
                selected.len(),
                resolved,
                selected.len() - resolved
            );
        }
        Ok(())
    }

    /// Resolve the requested scenario names against the catalog
    fn select(&self) -> Result<Vec<&'static Scenario>> {
        if self.all {
            return Ok(CATALOG.iter().collect());
        }
        if self.scenarios.is_empty() {
            return Err(CliError::NoScenarios.into());
        }
        self.scenarios
            .iter()
            .map(|name| {
                scenarios::find(name)
                    .ok_or_else(|| anyhow::Error::from(CliError::UnknownScenario(name.clone())))
            })
            .collect()
    }

    /// Initialize logging based on verbosity level
    fn init_logging(&self) -> Result<()> {
        let log_level = match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };

        if !self.quiet {
            env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
                .try_init()?;
        }

        Ok(())
    }
}
