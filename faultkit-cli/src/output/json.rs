//! JSON output formatter

use super::OutputFormatter;
use crate::scenarios::{Resolution, ScenarioOutcome};
use anyhow::Result;
use faultkit_core::FaultReport;
use serde::Serialize;
use std::io::Write;

/// JSON formatter - outputs scenario records as a JSON array
pub struct JsonFormatter<W: Write> {
    writer: W,
    pretty: bool,
    records: Vec<ScenarioRecord>,
}

/// Data structure for JSON output
#[derive(Debug, Serialize)]
pub struct ScenarioRecord {
    /// Scenario name
    pub name: String,
    /// Scenario description
    pub summary: String,
    /// Steps noted while running
    pub steps: Vec<String>,
    /// "resolved" or "failed"
    pub status: &'static str,
    /// Value produced by the handler
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Fault that ended the scenario
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fault: Option<FaultReport>,
}

impl From<&ScenarioOutcome> for ScenarioRecord {
    fn from(outcome: &ScenarioOutcome) -> Self {
        let (status, value, fault) = match &outcome.resolution {
            Resolution::Resolved(value) => ("resolved", Some(value.clone()), None),
            Resolution::Failed(fault) => ("failed", None, Some(fault.report())),
        };
        Self {
            name: outcome.name.to_string(),
            summary: outcome.summary.to_string(),
            steps: outcome.steps.clone(),
            status,
            value,
            fault,
        }
    }
}

impl<W: Write> JsonFormatter<W> {
    /// Create a new JSON formatter
    pub fn new(writer: W, pretty: bool) -> Self {
        Self {
            writer,
            pretty,
            records: Vec::new(),
        }
    }
}

impl<W: Write + Send + Sync> OutputFormatter for JsonFormatter<W> {
    fn format_outcome(&mut self, outcome: &ScenarioOutcome) -> Result<()> {
        self.records.push(ScenarioRecord::from(outcome));
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        if self.pretty {
            serde_json::to_writer_pretty(&mut self.writer, &self.records)?;
        } else {
            serde_json::to_writer(&mut self.writer, &self.records)?;
        }
        writeln!(self.writer)?;
        self.writer.flush()?;
        Ok(())
    }
}
