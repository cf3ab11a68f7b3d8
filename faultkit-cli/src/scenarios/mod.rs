//! Demonstration scenarios
//!
//! Each scenario drives one fault-handling pattern end to end and reports
//! what happened as a [`ScenarioOutcome`]. Scenarios run inside a
//! [`PropagationChannel`], so a panic inside one is reported as a fault
//! rather than aborting the whole run.

use faultkit_core::{Fault, PropagationChannel, PropagationResult};

mod basic;
mod handlers;
mod resources;
mod state;

/// Name of the application-defined kind used by the `custom-kind` scenario
pub const INSUFFICIENT_FUNDS: &str = "InsufficientFunds";

/// Scenario body: records steps and returns a resolution or a fault
pub type ScenarioFn = fn(&mut Steps) -> PropagationResult<String>;

/// A named, runnable scenario
#[derive(Debug, Clone, Copy)]
pub struct Scenario {
    /// Command-line name
    pub name: &'static str,
    /// One-line description
    pub summary: &'static str,
    body: ScenarioFn,
}

/// Every scenario, in presentation order
pub const CATALOG: &[Scenario] = &[
    Scenario {
        name: "division-by-zero",
        summary: "Arithmetic fault resolved to a fallback value",
        body: basic::division_by_zero,
    },
    Scenario {
        name: "array-bounds",
        summary: "Foreign index error reclassified as Bounds and recovered",
        body: basic::array_bounds,
    },
    Scenario {
        name: "null-reference",
        summary: "Absent value surfaces as NullReference",
        body: basic::null_reference,
    },
    Scenario {
        name: "number-format",
        summary: "Parse error classified as Format",
        body: basic::number_format,
    },
    Scenario {
        name: "class-cast",
        summary: "Lossy integer conversion classified as Cast",
        body: basic::class_cast,
    },
    Scenario {
        name: "resource-cleanup",
        summary: "Release failure recorded as suppressed under the primary fault",
        body: resources::resource_cleanup,
    },
    Scenario {
        name: "nested-resources",
        summary: "Nested guards release in reverse acquisition order",
        body: resources::nested_resources,
    },
    Scenario {
        name: "multi-catch",
        summary: "One rule handles several kinds",
        body: handlers::multi_catch,
    },
    Scenario {
        name: "nested-catch",
        summary: "Unhandled fault falls through to an outer dispatcher",
        body: handlers::nested_catch,
    },
    Scenario {
        name: "chained-escalation",
        summary: "Handler escalates a fault, keeping it as the cause",
        body: handlers::chained_escalation,
    },
    Scenario {
        name: "custom-kind",
        summary: "Application-registered kind dispatched like a built-in",
        body: handlers::custom_kind,
    },
    Scenario {
        name: "interrupted-wait",
        summary: "Cancelled wait yields Interruption while the lock is still released",
        body: resources::interrupted_wait,
    },
    Scenario {
        name: "concurrent-modification",
        summary: "Stale versioned update rejected as ConcurrencyConflict",
        body: state::concurrent_modification,
    },
    Scenario {
        name: "unsupported-operation",
        summary: "Write to a read-only view observed and propagated",
        body: state::unsupported_operation,
    },
    Scenario {
        name: "illegal-state",
        summary: "Operation rejected in the wrong lifecycle state",
        body: state::illegal_state,
    },
];

/// Look a scenario up by name
pub fn find(name: &str) -> Option<&'static Scenario> {
    CATALOG.iter().find(|scenario| scenario.name == name)
}

/// Ordered notes taken while a scenario runs
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Steps(Vec<String>);

impl Steps {
    /// Record a step
    pub fn note(&mut self, step: impl Into<String>) {
        let step = step.into();
        log::debug!("{step}");
        self.0.push(step);
    }

    /// Recorded steps in order
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

/// How a scenario ended
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// A handler produced a value
    Resolved(String),
    /// The fault reached the top of the scenario unhandled
    Failed(Fault),
}

/// Report of a single scenario run
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioOutcome {
    /// Scenario name
    pub name: &'static str,
    /// Scenario description
    pub summary: &'static str,
    /// Steps noted while running
    pub steps: Vec<String>,
    /// Final result
    pub resolution: Resolution,
}

impl ScenarioOutcome {
    /// Whether a handler resolved the scenario
    pub fn is_resolved(&self) -> bool {
        matches!(self.resolution, Resolution::Resolved(_))
    }
}

impl Scenario {
    /// Run this scenario, capturing panics as faults
    pub fn run(&self) -> ScenarioOutcome {
        log::info!("Running scenario {}", self.name);
        let mut steps = Steps::default();
        let result = PropagationChannel::new().run(|| (self.body)(&mut steps));

        let resolution = match result {
            Ok(value) => Resolution::Resolved(value),
            Err(fault) => {
                log::info!("Scenario {} ended with {fault}", self.name);
                Resolution::Failed(fault)
            }
        };

        ScenarioOutcome {
            name: self.name,
            summary: self.summary,
            steps: steps.0,
            resolution,
        }
    }
}
