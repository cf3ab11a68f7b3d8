//! Generate config command implementation

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

/// Arguments for the generate-config command
#[derive(Debug, Args)]
pub struct GenerateConfigArgs {
    /// Output file path
    #[arg(short, long, value_name = "FILE", required = true)]
    pub output: PathBuf,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

impl GenerateConfigArgs {
    /// Execute the generate-config command
    pub fn execute(&self) -> Result<()> {
        use std::fs;

        if self.output.exists() && !self.force {
            anyhow::bail!(
                "{} already exists (pass --force to overwrite)",
                self.output.display()
            );
        }

        fs::write(&self.output, Self::template())
            .with_context(|| format!("Failed to write to {}", self.output.display()))?;

        println!("✓ Configuration template written to {}", self.output.display());
        println!();
        println!("Use it with:");
        println!("   faultkit run --all -c {}", self.output.display());
        println!("   faultkit list kinds -c {}", self.output.display());

        Ok(())
    }

    /// Template configuration content
    fn template() -> &'static str {
        r#"# faultkit configuration

[kinds]
# Application fault kinds, registered after the built-in ones
custom = []

[output]
# Format used when --format is not given: text, json or markdown
default_format = "text"
# Indent JSON output
pretty_json = true
# Print fault context entries in text output
show_context = false
"#
    }
}
