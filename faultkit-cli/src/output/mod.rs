//! Output formatting module

use anyhow::Result;
use std::io::Write;

use crate::config::OutputConfig;
use crate::scenarios::ScenarioOutcome;

/// Trait for output formatters
pub trait OutputFormatter: Send + Sync {
    /// Format and output a single scenario outcome
    fn format_outcome(&mut self, outcome: &ScenarioOutcome) -> Result<()>;

    /// Finalize output (e.g., write the JSON array)
    fn finish(&mut self) -> Result<()>;
}

pub mod json;
pub mod markdown;
pub mod text;

pub use json::JsonFormatter;
pub use markdown::MarkdownFormatter;
pub use text::TextFormatter;

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Plain text, one block per scenario
    Text,
    /// JSON array of scenario records
    Json,
    /// Markdown report
    Markdown,
}

impl OutputFormat {
    /// Build the formatter for this format
    pub fn formatter(
        self,
        writer: Box<dyn Write + Send + Sync>,
        config: &OutputConfig,
    ) -> Box<dyn OutputFormatter> {
        match self {
            OutputFormat::Text => Box::new(TextFormatter::new(writer, config.show_context)),
            OutputFormat::Json => Box::new(JsonFormatter::new(writer, config.pretty_json)),
            OutputFormat::Markdown => Box::new(MarkdownFormatter::new(writer)),
        }
    }
}
