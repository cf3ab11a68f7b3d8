//! Guaranteed release of acquired resources

use std::cell::{Cell, RefCell};
use std::io;
use std::thread;
use std::time::Duration;

use faultkit_core::{
    with_resource, CancelFlag, Dispatcher, Fault, FaultKind, IntoFault, PropagationResult,
    ResourceHandle,
};

use super::Steps;

/// How long the cancelling thread lets the waiter block
const CANCEL_AFTER: Duration = Duration::from_millis(20);

/// Upper bound on the wait; cancellation arrives long before this
const WAIT_LIMIT: Duration = Duration::from_secs(5);

pub(super) fn resource_cleanup(steps: &mut Steps) -> PropagationResult<String> {
    steps.note("opening record reader");
    let result: PropagationResult<String> = with_resource(
        || Ok("records.dat"),
        |_| Err(Fault::of(FaultKind::FORMAT, "corrupt record at offset 512")),
        |_| Err(io::Error::new(io::ErrorKind::BrokenPipe, "close failed").into_fault()),
    );

    if let Err(fault) = &result {
        steps.note(format!("reading failed: {fault}"));
        for suppressed in fault.suppressed() {
            steps.note(format!("release failure kept as suppressed: {suppressed}"));
        }
    }
    result
}

pub(super) fn nested_resources(steps: &mut Steps) -> PropagationResult<String> {
    let released = RefCell::new(Vec::new());
    let log = &released;
    let release = move |name: &'static str| {
        move |_: &'static str| -> PropagationResult<()> {
            log.borrow_mut().push(name);
            Ok(())
        }
    };

    steps.note("acquiring connection");
    let connection = ResourceHandle::acquire(|| Ok("connection"), release("connection"))?;
    steps.note("acquiring transaction inside the connection");
    let committed = with_resource(
        || Ok("transaction"),
        |transaction| Ok(format!("{} on {}", *transaction, *connection)),
        release("transaction"),
    );
    let closed = connection.release();
    let committed = committed?;
    closed?;
    steps.note(format!("committed {committed}"));

    let order = released.borrow().join(", then ");
    Ok(format!("released {order}"))
}

pub(super) fn interrupted_wait(steps: &mut Steps) -> PropagationResult<String> {
    let flag = CancelFlag::new();
    let lock_released = Cell::new(false);
    let handlers = Dispatcher::builder()
        .on([FaultKind::INTERRUPTION], |fault| {
            Ok(format!("stopped waiting ({})", fault.message()))
        })
        .build();

    steps.note("taking the ledger lock and waiting for a signal");
    let result = thread::scope(|scope| {
        let canceller = flag.clone();
        scope.spawn(move || {
            thread::sleep(CANCEL_AFTER);
            canceller.cancel();
        });

        with_resource(
            || Ok("ledger lock"),
            |_| flag.wait(WAIT_LIMIT).map(|()| "signal received".to_string()),
            |_| {
                lock_released.set(true);
                Ok(())
            },
        )
    });

    if let Err(fault) = &result {
        steps.note(format!("caught {fault}"));
    }
    if lock_released.get() {
        steps.note("lock released");
    }
    handlers.recover(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_cleanup_notes_suppressed_release() {
        let mut steps = Steps::default();
        let fault = resource_cleanup(&mut steps).unwrap_err();
        assert_eq!(fault.message(), "corrupt record at offset 512");
        assert_eq!(fault.suppressed()[0].message(), "close failed");
        assert!(steps
            .as_slice()
            .iter()
            .any(|step| step.starts_with("release failure kept as suppressed")));
    }

    #[test]
    fn test_nested_resources_commit_uses_both() {
        let mut steps = Steps::default();
        nested_resources(&mut steps).unwrap();
        assert!(steps
            .as_slice()
            .contains(&"committed transaction on connection".to_string()));
    }

    #[test]
    fn test_interrupted_wait_resolves_after_cancel() {
        let mut steps = Steps::default();
        let value = interrupted_wait(&mut steps).unwrap();
        assert_eq!(value, "stopped waiting (wait interrupted)");
    }
}
