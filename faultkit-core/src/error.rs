//! Core error types
//!
//! These describe misuse of the fault machinery itself (bad registrations,
//! malformed faults). Failures of the operations being wrapped are never
//! reported here; they travel as [`Fault`](crate::Fault) values.

use thiserror::Error;

/// Errors raised by the registry and by fault construction
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A kind with this name is already registered
    #[error("fault kind '{name}' is already registered")]
    DuplicateKind {
        /// The name that was registered twice
        name: String,
    },

    /// Kind names must contain at least one non-whitespace character
    #[error("fault kind name must not be empty")]
    EmptyKindName,

    /// The process-wide registry was already frozen
    #[error("fault kind registry is already installed")]
    RegistryInstalled,

    /// A fault could not be constructed
    #[error("invalid fault: {reason}")]
    InvalidFault {
        /// Why the fault was rejected
        reason: String,
    },

    /// The cause chain exceeds the depth bound
    #[error("cause chain depth {depth} exceeds the limit of {limit}")]
    CauseChainTooDeep {
        /// Depth the new fault would have had
        depth: usize,
        /// Maximum permitted depth
        limit: usize,
    },
}

impl CoreError {
    pub(crate) fn invalid_fault(reason: impl Into<String>) -> Self {
        CoreError::InvalidFault {
            reason: reason.into(),
        }
    }
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
