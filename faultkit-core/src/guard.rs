//! Scoped resource guard
//!
//! [`with_resource`] acquires a resource, hands it to a closure and releases
//! it exactly once on every exit path. Nested calls release in reverse order
//! of acquisition because each inner scope finishes before its outer one.
//!
//! Release failure policy:
//!
//! | use     | release | result                                   |
//! |---------|---------|------------------------------------------|
//! | `Ok`    | `Ok`    | `Ok(value)`                              |
//! | `Ok`    | `Err`   | `Err(release fault)`                     |
//! | `Err`   | `Ok`    | `Err(use fault)`                         |
//! | `Err`   | `Err`   | `Err(use fault)` with the release fault suppressed |
//!
//! If the closure unwinds, the resource is released before the unwind
//! resumes. A failed release replaces the payload with a [`Fault`] built from
//! the panic, carrying the release fault as suppressed, so a surrounding
//! [`run`](crate::propagation::run) reports both.
//!
//! [`Fault`]: crate::fault::Fault

use std::ops::{Deref, DerefMut};
use std::panic::{self, AssertUnwindSafe};

use crate::propagation::{panic_fault, PropagationResult};

struct Acquired<R, F> {
    resource: R,
    release: F,
}

/// An acquired resource that is released exactly once
///
/// Release happens either through [`release`](Self::release), which reports
/// the outcome, or when the handle is dropped, which can only log it.
pub struct ResourceHandle<R, F>
where
    F: FnOnce(R) -> PropagationResult<()>,
{
    inner: Option<Acquired<R, F>>,
}

impl<R, F> ResourceHandle<R, F>
where
    F: FnOnce(R) -> PropagationResult<()>,
{
    /// Wrap an already acquired resource
    pub fn new(resource: R, release: F) -> Self {
        Self {
            inner: Some(Acquired { resource, release }),
        }
    }

    /// Run `acquire` and wrap its resource; nothing is wrapped on failure
    pub fn acquire<A>(acquire: A, release: F) -> PropagationResult<Self>
    where
        A: FnOnce() -> PropagationResult<R>,
    {
        let resource = acquire()?;
        Ok(Self::new(resource, release))
    }

    /// Whether the resource is still held
    pub fn is_acquired(&self) -> bool {
        self.inner.is_some()
    }

    /// Release now and report the outcome
    pub fn release(mut self) -> PropagationResult<()> {
        match self.inner.take() {
            Some(Acquired { resource, release }) => {
                tracing::trace!("releasing resource");
                release(resource)
            }
            None => Ok(()),
        }
    }
}

impl<R, F> Deref for ResourceHandle<R, F>
where
    F: FnOnce(R) -> PropagationResult<()>,
{
    type Target = R;

    fn deref(&self) -> &R {
        match &self.inner {
            Some(acquired) => &acquired.resource,
            None => unreachable!("resource handle used after release"),
        }
    }
}

impl<R, F> DerefMut for ResourceHandle<R, F>
where
    F: FnOnce(R) -> PropagationResult<()>,
{
    fn deref_mut(&mut self) -> &mut R {
        match &mut self.inner {
            Some(acquired) => &mut acquired.resource,
            None => unreachable!("resource handle used after release"),
        }
    }
}

impl<R, F> Drop for ResourceHandle<R, F>
where
    F: FnOnce(R) -> PropagationResult<()>,
{
    fn drop(&mut self) {
        if let Some(Acquired { resource, release }) = self.inner.take() {
            tracing::debug!(
                unwinding = std::thread::panicking(),
                "releasing resource from drop"
            );
            if let Err(fault) = release(resource) {
                tracing::warn!(%fault, "resource release failed during drop");
            }
        }
    }
}

impl<R, F> std::fmt::Debug for ResourceHandle<R, F>
where
    F: FnOnce(R) -> PropagationResult<()>,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceHandle")
            .field("acquired", &self.is_acquired())
            .finish()
    }
}

/// Acquire, use and release a resource
///
/// `release` is not called when `acquire` fails. Otherwise it runs exactly
/// once after `use_resource` has finished, including when `use_resource`
/// unwinds. The unwind then resumes, with a [`Fault`](crate::fault::Fault)
/// payload if the release failed.
pub fn with_resource<R, T, A, U, F>(acquire: A, use_resource: U, release: F) -> PropagationResult<T>
where
    A: FnOnce() -> PropagationResult<R>,
    U: FnOnce(&mut R) -> PropagationResult<T>,
    F: FnOnce(R) -> PropagationResult<()>,
{
    let mut handle = ResourceHandle::acquire(acquire, release)?;
    let outcome = match panic::catch_unwind(AssertUnwindSafe(|| use_resource(&mut *handle))) {
        Ok(outcome) => outcome,
        Err(payload) => match handle.release() {
            Ok(()) => panic::resume_unwind(payload),
            Err(release_fault) => {
                tracing::warn!(%release_fault, "release failed while unwinding");
                let fault = panic_fault(payload).with_suppressed(release_fault);
                panic::resume_unwind(Box::new(fault))
            }
        },
    };
    let released = handle.release();

    match (outcome, released) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(release_fault)) => Err(release_fault),
        (Err(fault), Ok(())) => Err(fault),
        (Err(fault), Err(release_fault)) => {
            tracing::warn!(%release_fault, "suppressing release failure");
            Err(fault.with_suppressed(release_fault))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fault::{ContextValue, Fault, SUPPRESSED_KEY};
    use crate::kind::FaultKind;
    use std::cell::RefCell;
    use std::panic::{self, AssertUnwindSafe};

    fn fault(kind: FaultKind, message: &str) -> Fault {
        Fault::of(kind, message)
    }

    #[test]
    fn test_success_releases_once() {
        let releases = RefCell::new(0);
        let result = with_resource(
            || Ok(String::from("reader")),
            |reader| Ok(reader.len()),
            |_| {
                *releases.borrow_mut() += 1;
                Ok(())
            },
        );
        assert_eq!(result, Ok(6));
        assert_eq!(*releases.borrow(), 1);
    }

    #[test]
    fn test_acquire_failure_skips_release() {
        let released = RefCell::new(false);
        let result: PropagationResult<()> = with_resource(
            || -> PropagationResult<u32> {
                Err(fault(FaultKind::RESOURCE_UNAVAILABLE, "file not found"))
            },
            |_| Ok(()),
            |_| {
                *released.borrow_mut() = true;
                Ok(())
            },
        );
        assert!(result.unwrap_err().is(FaultKind::RESOURCE_UNAVAILABLE));
        assert!(!*released.borrow());
    }

    #[test]
    fn test_use_failure_still_releases() {
        let released = RefCell::new(false);
        let result: PropagationResult<()> = with_resource(
            || Ok(()),
            |_| Err(fault(FaultKind::FORMAT, "bad header")),
            |_| {
                *released.borrow_mut() = true;
                Ok(())
            },
        );
        let err = result.unwrap_err();
        assert!(err.is(FaultKind::FORMAT));
        assert!(err.suppressed().is_empty());
        assert!(*released.borrow());
    }

    #[test]
    fn test_release_failure_after_success_is_returned() {
        let result = with_resource(
            || Ok(()),
            |_| Ok(42),
            |_| Err(fault(FaultKind::RESOURCE_UNAVAILABLE, "close failed")),
        );
        let err = result.unwrap_err();
        assert_eq!(err.message(), "close failed");
    }

    #[test]
    fn test_release_failure_after_failure_is_suppressed() {
        let close_failure = fault(FaultKind::RESOURCE_UNAVAILABLE, "close failed");
        let expected = close_failure.clone();

        let result: PropagationResult<()> = with_resource(
            || Ok(()),
            |_| Err(fault(FaultKind::FORMAT, "bad header")),
            move |_| Err(close_failure),
        );

        let err = result.unwrap_err();
        assert_eq!(err.message(), "bad header");
        assert_eq!(
            err.context_value(SUPPRESSED_KEY),
            Some(&ContextValue::Faults(vec![expected]))
        );
    }

    #[test]
    fn test_nested_release_is_lifo() {
        let log = RefCell::new(Vec::new());
        let result = with_resource(
            || {
                log.borrow_mut().push("acquire A");
                Ok("A")
            },
            |_| {
                with_resource(
                    || {
                        log.borrow_mut().push("acquire B");
                        Ok("B")
                    },
                    |_| Ok(()),
                    |name| {
                        log.borrow_mut().push(name);
                        Ok(())
                    },
                )
            },
            |name| {
                log.borrow_mut().push(name);
                Ok(())
            },
        );

        assert!(result.is_ok());
        assert_eq!(*log.borrow(), vec!["acquire A", "acquire B", "B", "A"]);
    }

    #[test]
    fn test_release_runs_before_unwind_continues() {
        let released = RefCell::new(false);
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            with_resource(
                || Ok(()),
                |_| -> PropagationResult<()> { panic!("worker aborted") },
                |_| {
                    *released.borrow_mut() = true;
                    Ok(())
                },
            )
        }));
        assert!(outcome.is_err());
        assert!(*released.borrow());
    }

    #[test]
    fn test_release_failure_during_unwind_is_reported() {
        let result = crate::propagation::run(|| {
            with_resource(
                || Ok(()),
                |_| -> PropagationResult<()> { panic!("worker aborted") },
                |_| Err(fault(FaultKind::RESOURCE_UNAVAILABLE, "close failed")),
            )
        });

        let fault = result.unwrap_err();
        assert_eq!(fault.kind(), FaultKind::UNCLASSIFIED);
        assert_eq!(fault.message(), "worker aborted");
        assert_eq!(fault.suppressed().len(), 1);
        assert_eq!(fault.suppressed()[0].message(), "close failed");
    }

    #[test]
    fn test_handle_releases_exactly_once() {
        let count = RefCell::new(0);
        let handle = ResourceHandle::new(7_u32, |_| {
            *count.borrow_mut() += 1;
            Ok(())
        });
        assert!(handle.is_acquired());
        assert_eq!(*handle, 7);
        handle.release().unwrap();
        assert_eq!(*count.borrow(), 1);

        {
            let _dropped = ResourceHandle::new(8_u32, |_| {
                *count.borrow_mut() += 1;
                Ok(())
            });
        }
        assert_eq!(*count.borrow(), 2);
    }
}
