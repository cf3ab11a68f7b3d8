//! Serializable fault snapshots

use std::collections::BTreeMap;

use serde::Serialize;

use crate::fault::{ContextValue, Fault};

/// Owned, serializable view of a fault and its causes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FaultReport {
    /// Kind name as registered
    pub kind: String,
    /// Fault message
    pub message: String,
    /// Context entries, ordered by key
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub context: BTreeMap<String, ContextEntry>,
    /// Report of the cause, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<Box<FaultReport>>,
}

/// Serializable context value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ContextEntry {
    /// Free text
    Text(String),
    /// Signed integer
    Integer(i64),
    /// Floating point number
    Float(f64),
    /// Boolean flag
    Bool(bool),
    /// Related faults
    Faults(Vec<FaultReport>),
}

impl From<&ContextValue> for ContextEntry {
    fn from(value: &ContextValue) -> Self {
        match value {
            ContextValue::Text(text) => ContextEntry::Text(text.clone()),
            ContextValue::Integer(value) => ContextEntry::Integer(*value),
            ContextValue::Float(value) => ContextEntry::Float(*value),
            ContextValue::Bool(value) => ContextEntry::Bool(*value),
            ContextValue::Faults(faults) => {
                ContextEntry::Faults(faults.iter().map(FaultReport::from).collect())
            }
        }
    }
}

impl From<&Fault> for FaultReport {
    fn from(fault: &Fault) -> Self {
        FaultReport {
            kind: fault.kind().to_string(),
            message: fault.message().to_string(),
            context: fault
                .context()
                .iter()
                .map(|(key, value)| (key.clone(), ContextEntry::from(value)))
                .collect(),
            cause: fault.cause().map(|cause| Box::new(FaultReport::from(cause))),
        }
    }
}

impl Fault {
    /// Snapshot this fault for serialization
    pub fn report(&self) -> FaultReport {
        FaultReport::from(self)
    }
}
