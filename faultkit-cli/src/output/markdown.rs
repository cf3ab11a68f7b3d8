//! Markdown output formatter

use super::OutputFormatter;
use crate::scenarios::{Resolution, ScenarioOutcome};
use anyhow::Result;
use std::io::Write;

/// Markdown formatter - outputs one section per scenario
pub struct MarkdownFormatter<W: Write> {
    writer: W,
    resolved: usize,
    failed: usize,
}

impl<W: Write> MarkdownFormatter<W> {
    /// Create a new markdown formatter
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            resolved: 0,
            failed: 0,
        }
    }
}

impl<W: Write + Send + Sync> OutputFormatter for MarkdownFormatter<W> {
    fn format_outcome(&mut self, outcome: &ScenarioOutcome) -> Result<()> {
        writeln!(self.writer, "## {}", outcome.name)?;
        writeln!(self.writer)?;
        writeln!(self.writer, "{}", outcome.summary)?;
        writeln!(self.writer)?;
        for (i, step) in outcome.steps.iter().enumerate() {
            writeln!(self.writer, "{}. {}", i + 1, step)?;
        }
        if !outcome.steps.is_empty() {
            writeln!(self.writer)?;
        }

        match &outcome.resolution {
            Resolution::Resolved(value) => {
                self.resolved += 1;
                writeln!(self.writer, "**Resolved:** {value}")?;
            }
            Resolution::Failed(fault) => {
                self.failed += 1;
                writeln!(self.writer, "**Failed:** `{fault}`")?;
                for cause in fault.chain().skip(1) {
                    writeln!(self.writer, "- caused by `{cause}`")?;
                }
                for suppressed in fault.suppressed() {
                    writeln!(self.writer, "- suppressed `{suppressed}`")?;
                }
            }
        }
        writeln!(self.writer)?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        writeln!(self.writer, "---")?;
        writeln!(
            self.writer,
            "*Scenarios: {} ({} resolved, {} failed)*",
            self.resolved + self.failed,
            self.resolved,
            self.failed
        )?;
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use faultkit_core::{Fault, FaultKind};

    #[test]
    fn test_markdown_sections_and_totals() {
        let mut buffer = Vec::new();
        let mut formatter = MarkdownFormatter::new(&mut buffer);
        formatter
            .format_outcome(&ScenarioOutcome {
                name: "unsupported-operation",
                summary: "read-only view",
                steps: vec!["adding".to_string()],
                resolution: Resolution::Failed(Fault::of(
                    FaultKind::UNSUPPORTED_OPERATION,
                    "cannot add to a read-only view",
                )),
            })
            .unwrap();
        formatter.finish().unwrap();

        let text = String::from_utf8(buffer).unwrap();
        assert!(text.starts_with("## unsupported-operation\n\nread-only view\n\n1. adding\n"));
        assert!(text.contains("**Failed:** `UnsupportedOperation: cannot add to a read-only view`"));
        assert!(text.ends_with("*Scenarios: 1 (0 resolved, 1 failed)*\n"));
    }
}
