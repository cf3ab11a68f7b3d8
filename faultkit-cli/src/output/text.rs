//! Plain text output formatter

use super::OutputFormatter;
use crate::scenarios::{Resolution, ScenarioOutcome};
use anyhow::Result;
use faultkit_core::{Fault, SUPPRESSED_KEY};
use std::io::Write;

/// Plain text formatter - outputs one block per scenario
pub struct TextFormatter<W: Write> {
    writer: W,
    show_context: bool,
}

impl<W: Write> TextFormatter<W> {
    /// Create a new text formatter
    pub fn new(writer: W, show_context: bool) -> Self {
        Self {
            writer,
            show_context,
        }
    }

    fn write_fault(&mut self, fault: &Fault) -> Result<()> {
        writeln!(self.writer, "  !! {fault}")?;
        for cause in fault.chain().skip(1) {
            writeln!(self.writer, "     caused by {cause}")?;
        }
        for suppressed in fault.suppressed() {
            writeln!(self.writer, "     suppressed {suppressed}")?;
        }
        if self.show_context {
            for (key, value) in fault.context() {
                if key != SUPPRESSED_KEY {
                    writeln!(self.writer, "     {key} = {value}")?;
                }
            }
        }
        Ok(())
    }
}

impl<W: Write + Send + Sync> OutputFormatter for TextFormatter<W> {
    fn format_outcome(&mut self, outcome: &ScenarioOutcome) -> Result<()> {
        let status = if outcome.is_resolved() {
            "resolved"
        } else {
            "failed"
        };
        writeln!(
            self.writer,
            "[{status}] {}: {}",
            outcome.name, outcome.summary
        )?;
        for step in &outcome.steps {
            writeln!(self.writer, "  - {step}")?;
        }
        match &outcome.resolution {
            Resolution::Resolved(value) => writeln!(self.writer, "  => {value}")?,
            Resolution::Failed(fault) => self.write_fault(fault)?,
        }
        writeln!(self.writer)?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
