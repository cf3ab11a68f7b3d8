//! Cooperative cancellation
//!
//! A [`CancelFlag`] is shared between the party that requests cancellation
//! and the work that honours it. Work calls [`CancelFlag::checkpoint`] or
//! waits with [`CancelFlag::wait`]; both report cancellation as an
//! [`FaultKind::INTERRUPTION`] fault so it propagates like any other failure.

use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::Duration;

use crate::fault::Fault;
use crate::kind::FaultKind;
use crate::propagation::PropagationResult;

#[derive(Debug, Default)]
struct State {
    cancelled: Mutex<bool>,
    signal: Condvar,
}

/// Shared cancellation request
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    state: Arc<State>,
}

impl CancelFlag {
    /// Create a flag that is not cancelled
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation and wake every waiter
    pub fn cancel(&self) {
        let mut cancelled = self
            .state
            .cancelled
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *cancelled = true;
        self.state.signal.notify_all();
        tracing::debug!("cancellation requested");
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        *self
            .state
            .cancelled
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Fail with an interruption fault if cancellation was requested
    pub fn checkpoint(&self) -> PropagationResult<()> {
        if self.is_cancelled() {
            return Err(interrupted("operation cancelled"));
        }
        Ok(())
    }

    /// Sleep for `duration` unless cancelled first
    pub fn wait(&self, duration: Duration) -> PropagationResult<()> {
        let cancelled = self
            .state
            .cancelled
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let (cancelled, _timeout) = self
            .state
            .signal
            .wait_timeout_while(cancelled, duration, |cancelled| !*cancelled)
            .unwrap_or_else(PoisonError::into_inner);

        if *cancelled {
            return Err(interrupted("wait interrupted").with_context(
                "requested_ms",
                i64::try_from(duration.as_millis()).unwrap_or(i64::MAX),
            ));
        }
        Ok(())
    }
}

fn interrupted(message: &str) -> Fault {
    Fault::of(FaultKind::INTERRUPTION, message)
}
