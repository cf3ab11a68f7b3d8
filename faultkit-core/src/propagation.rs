//! Propagation channel
//!
//! Operations report failure either by returning an error value or by
//! unwinding. [`PropagationChannel::run`] turns both into an explicit
//! [`PropagationResult`], classifying foreign errors into faults on the way.

use std::any::Any;
use std::error::Error as StdError;
use std::io;
use std::num::{ParseFloatError, ParseIntError, TryFromIntError};
use std::panic::{self, AssertUnwindSafe};
use std::str::{ParseBoolError, Utf8Error};
use std::string::FromUtf8Error;

use crate::dispatcher::Dispatcher;
use crate::error::CoreError;
use crate::fault::{Fault, MAX_CAUSE_DEPTH};
use crate::kind::FaultKind;

/// Outcome of any operation that can fail
pub type PropagationResult<T> = std::result::Result<T, Fault>;

/// Conversion of a failure into a fault
///
/// Faults convert to themselves unchanged. Everything the classifier does
/// not recognise becomes [`FaultKind::UNCLASSIFIED`] with its message kept.
pub trait IntoFault {
    /// Classify this failure
    fn into_fault(self) -> Fault;

    /// Whether this failure already is a fault
    ///
    /// Such failures are never reclassified by a [`PropagationChannel`].
    fn is_fault(&self) -> bool {
        false
    }
}

impl IntoFault for Fault {
    fn into_fault(self) -> Fault {
        self
    }

    fn is_fault(&self) -> bool {
        true
    }
}

impl IntoFault for io::Error {
    fn into_fault(self) -> Fault {
        let kind = match self.kind() {
            io::ErrorKind::NotFound
            | io::ErrorKind::PermissionDenied
            | io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::NotConnected
            | io::ErrorKind::AddrInUse
            | io::ErrorKind::AddrNotAvailable
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::TimedOut
            | io::ErrorKind::UnexpectedEof => FaultKind::RESOURCE_UNAVAILABLE,
            io::ErrorKind::InvalidInput | io::ErrorKind::InvalidData => FaultKind::FORMAT,
            io::ErrorKind::Interrupted => FaultKind::INTERRUPTION,
            io::ErrorKind::Unsupported => FaultKind::UNSUPPORTED_OPERATION,
            io::ErrorKind::WouldBlock => FaultKind::CONCURRENCY_CONFLICT,
            _ => FaultKind::UNCLASSIFIED,
        };
        let io_kind = format!("{:?}", self.kind());
        Fault::of(kind, self.to_string()).with_context("io_kind", io_kind)
    }
}

macro_rules! classify_as {
    ($kind:expr => $($error:ty),+ $(,)?) => {
        $(
            impl IntoFault for $error {
                fn into_fault(self) -> Fault {
                    Fault::of($kind, self.to_string())
                }
            }
        )+
    };
}

classify_as!(FaultKind::FORMAT => ParseIntError, ParseFloatError, ParseBoolError, Utf8Error, FromUtf8Error);
classify_as!(FaultKind::CAST => TryFromIntError);
classify_as!(FaultKind::STATE_INVALID => CoreError);

impl From<CoreError> for Fault {
    fn from(error: CoreError) -> Self {
        error.into_fault()
    }
}

impl IntoFault for Box<dyn StdError + Send + Sync> {
    fn into_fault(self) -> Fault {
        let error = match self.downcast::<Fault>() {
            Ok(fault) => return *fault,
            Err(error) => error,
        };
        let error = match error.downcast::<io::Error>() {
            Ok(io_error) => return io_error.into_fault(),
            Err(error) => error,
        };
        foreign_fault(error.as_ref())
    }

    fn is_fault(&self) -> bool {
        self.is::<Fault>()
    }
}

/// Classify an arbitrary error, keeping its `source()` chain as causes
pub fn foreign_fault(error: &(dyn StdError + 'static)) -> Fault {
    let mut messages = Vec::new();
    let mut current = Some(error);
    while let Some(err) = current {
        if messages.len() == MAX_CAUSE_DEPTH {
            break;
        }
        messages.push(err.to_string());
        current = err.source();
    }

    let mut fault: Option<Fault> = None;
    for message in messages.into_iter().rev() {
        let outer = Fault::of(FaultKind::UNCLASSIFIED, message);
        fault = Some(match fault {
            Some(cause) => outer.with_cause_unchecked(cause),
            None => outer,
        });
    }
    fault.unwrap_or_else(|| Fault::of(FaultKind::UNCLASSIFIED, "unknown failure"))
}

/// Turn a panic payload into a fault
///
/// A payload raised with `std::panic::panic_any(fault)` is returned as is.
pub fn panic_fault(payload: Box<dyn Any + Send>) -> Fault {
    let payload = match payload.downcast::<Fault>() {
        Ok(fault) => return *fault,
        Err(payload) => payload,
    };

    let message = if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    };
    Fault::of(FaultKind::UNCLASSIFIED, message).with_context("panic", true)
}

type Classifier = Box<dyn Fn(&Fault) -> Option<FaultKind> + Send + Sync>;

/// Executes fallible operations and captures their failures as faults
///
/// Classifiers run only on failures the channel itself converted into
/// [`FaultKind::UNCLASSIFIED`] faults. The first classifier to answer
/// decides the new kind, and the original fault becomes the cause of the
/// reclassified one. A fault the operation returned or panicked with passes
/// through untouched, whatever its kind.
#[derive(Default)]
pub struct PropagationChannel {
    classifiers: Vec<Classifier>,
}

impl std::fmt::Debug for PropagationChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropagationChannel")
            .field("classifiers", &self.classifiers.len())
            .finish()
    }
}

impl PropagationChannel {
    /// Channel without reclassification
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a reclassification rule for unclassified faults
    pub fn classify<F>(mut self, classifier: F) -> Self
    where
        F: Fn(&Fault) -> Option<FaultKind> + Send + Sync + 'static,
    {
        self.classifiers.push(Box::new(classifier));
        self
    }

    /// Run `operation` once and capture its outcome
    pub fn run<T, E, F>(&self, operation: F) -> PropagationResult<T>
    where
        F: FnOnce() -> Result<T, E>,
        E: IntoFault,
    {
        tracing::trace!("running operation");
        let fault = match panic::catch_unwind(AssertUnwindSafe(operation)) {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(error)) if error.is_fault() => return Err(error.into_fault()),
            Ok(Err(error)) => error.into_fault(),
            Err(payload) if payload.is::<Fault>() => return Err(panic_fault(payload)),
            Err(payload) => panic_fault(payload),
        };
        Err(self.reclassify(fault))
    }

    /// Run independent operations, returning results in input order
    #[cfg(feature = "parallel")]
    pub fn run_all<T, E, F>(&self, operations: Vec<F>) -> Vec<PropagationResult<T>>
    where
        F: FnOnce() -> Result<T, E> + Send,
        E: IntoFault,
        T: Send,
    {
        use rayon::prelude::*;

        operations
            .into_par_iter()
            .map(|operation| self.run(operation))
            .collect()
    }

    /// Run independent operations, returning results in input order
    #[cfg(not(feature = "parallel"))]
    pub fn run_all<T, E, F>(&self, operations: Vec<F>) -> Vec<PropagationResult<T>>
    where
        F: FnOnce() -> Result<T, E> + Send,
        E: IntoFault,
        T: Send,
    {
        operations
            .into_iter()
            .map(|operation| self.run(operation))
            .collect()
    }

    fn reclassify(&self, fault: Fault) -> Fault {
        if !fault.is(FaultKind::UNCLASSIFIED) {
            return fault;
        }

        let Some(kind) = self
            .classifiers
            .iter()
            .find_map(|classifier| classifier(&fault))
        else {
            return fault;
        };
        if kind == FaultKind::UNCLASSIFIED {
            return fault;
        }

        let message = fault.message().to_string();
        match Fault::wrap(kind, message, fault.clone()) {
            Ok(reclassified) => {
                tracing::debug!(%kind, "reclassified fault");
                reclassified
            }
            Err(error) => {
                tracing::warn!(%error, "could not reclassify fault");
                fault
            }
        }
    }
}

/// Run `operation` on a channel without reclassification
pub fn run<T, E, F>(operation: F) -> PropagationResult<T>
where
    F: FnOnce() -> Result<T, E>,
    E: IntoFault,
{
    PropagationChannel::new().run(operation)
}

/// Transform the success value, leaving a fault untouched
pub fn map<T, U, F>(result: PropagationResult<T>, f: F) -> PropagationResult<U>
where
    F: FnOnce(T) -> U,
{
    result.map(f)
}

/// Chain another fallible step; `f` is never called on a fault
pub fn and_then<T, U, F>(result: PropagationResult<T>, f: F) -> PropagationResult<U>
where
    F: FnOnce(T) -> PropagationResult<U>,
{
    result.and_then(f)
}

/// Fault-aware combinators for results
pub trait ResultExt<T> {
    /// Classify the error side into a fault
    fn classified(self) -> PropagationResult<T>;

    /// Escalate a failure: the classified error becomes the cause of a new
    /// fault of `kind`
    ///
    /// If the chain is already at its depth limit the original fault is kept.
    fn wrap_err(self, kind: FaultKind, message: impl Into<String>) -> PropagationResult<T>;

    /// Hand a failure to `dispatcher`
    fn or_dispatch(self, dispatcher: &Dispatcher<T>) -> PropagationResult<T>;
}

impl<T, E: IntoFault> ResultExt<T> for Result<T, E> {
    fn classified(self) -> PropagationResult<T> {
        self.map_err(IntoFault::into_fault)
    }

    fn wrap_err(self, kind: FaultKind, message: impl Into<String>) -> PropagationResult<T> {
        self.map_err(|error| {
            let cause = error.into_fault();
            match Fault::wrap(kind, message, cause.clone()) {
                Ok(wrapped) => wrapped,
                Err(error) => {
                    tracing::warn!(%error, "keeping unwrapped fault");
                    cause
                }
            }
        })
    }

    fn or_dispatch(self, dispatcher: &Dispatcher<T>) -> PropagationResult<T> {
        self.map_err(IntoFault::into_fault)
            .or_else(|fault| dispatcher.dispatch(fault))
    }
}

/// Turn an absent value into a null-reference fault
pub trait OptionExt<T> {
    /// `what` names the missing value in the fault message
    fn required(self, what: &str) -> PropagationResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn required(self, what: &str) -> PropagationResult<T> {
        self.ok_or_else(|| {
            Fault::of(FaultKind::NULL_REFERENCE, format!("{what} is absent"))
                .with_context("value", what)
        })
    }
}
