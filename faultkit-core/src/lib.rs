//! Structured fault reporting and propagation
//!
//! This crate captures failures as typed, immutable [`Fault`] values and
//! moves them through explicit [`PropagationResult`]s instead of unwinding.
//!
//! # Architecture
//!
//! - **Kinds** ([`kind`]): flat category tags held in an append-only registry
//! - **Faults** ([`fault`]): kind, message, cause chain and diagnostic context
//! - **Propagation** ([`propagation`]): captures returned errors and panics
//!   as faults, with optional reclassification
//! - **Guards** ([`guard`]): guaranteed single release of acquired resources,
//!   with suppressed-failure bookkeeping
//! - **Dispatch** ([`dispatcher`]): ordered, first-match handler rules keyed
//!   on kind sets
//!
//! # Example
//!
//! ```rust
//! use faultkit_core::{run, Dispatcher, Fault, FaultKind, PropagationResult};
//!
//! fn divide(a: i32, b: i32) -> PropagationResult<i32> {
//!     if b == 0 {
//!         return Err(Fault::new(FaultKind::ARITHMETIC, "division by zero").unwrap());
//!     }
//!     Ok(a / b)
//! }
//!
//! let handlers = Dispatcher::builder()
//!     .on([FaultKind::ARITHMETIC], |_| Ok(0))
//!     .build();
//!
//! let result = handlers.recover(run(|| divide(10, 0)));
//! assert_eq!(result, Ok(0));
//! ```

#![warn(missing_docs)]

pub mod cancel;
pub mod dispatcher;
pub mod error;
pub mod fault;
pub mod guard;
pub mod kind;
pub mod propagation;
#[cfg(feature = "serde")]
pub mod report;

// Re-export key types
pub use cancel::CancelFlag;
pub use dispatcher::{dispatch, dispatch_nested, Dispatcher, DispatcherBuilder, HandlerRule, KindSet};
pub use error::{CoreError, Result};
pub use fault::{
    Chain, ContextValue, Fault, FaultBuilder, FaultId, MAX_CAUSE_DEPTH, SUPPRESSED_KEY,
};
pub use guard::{with_resource, ResourceHandle};
pub use kind::{FaultKind, FaultKindRegistry};
pub use propagation::{
    and_then, map, run, IntoFault, OptionExt, PropagationChannel, PropagationResult, ResultExt,
};
#[cfg(feature = "serde")]
pub use report::{ContextEntry, FaultReport};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_division_by_zero_resolves_to_fallback() {
        let operation = || -> PropagationResult<i32> {
            Err(Fault::new(FaultKind::ARITHMETIC, "division by zero")?)
        };
        let handlers = Dispatcher::new(vec![HandlerRule::resolve_with([FaultKind::ARITHMETIC], 0)]);

        assert_eq!(run(operation).or_dispatch(&handlers), Ok(0));
    }

    #[test]
    fn test_guard_fault_flows_into_dispatcher() {
        let handlers = Dispatcher::builder()
            .on([FaultKind::RESOURCE_UNAVAILABLE], |fault| {
                Ok(format!("fallback after {}", fault.message()))
            })
            .build();

        let result = with_resource(
            || Ok(()),
            |_| -> PropagationResult<String> { Ok("read".to_string()) },
            |_| Err(Fault::of(FaultKind::RESOURCE_UNAVAILABLE, "close failed")),
        );

        assert_eq!(
            handlers.recover(result),
            Ok("fallback after close failed".to_string())
        );
    }
}
