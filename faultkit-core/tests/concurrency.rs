//! Faults and guards across threads

use faultkit_core::{
    run, with_resource, CancelFlag, Dispatcher, Fault, FaultKind, PropagationChannel,
    PropagationResult,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[test]
fn test_fault_read_from_many_threads() {
    let fault = Arc::new(
        Fault::wrap(
            FaultKind::UNCLASSIFIED,
            "batch failed",
            Fault::of(FaultKind::ARITHMETIC, "division by zero"),
        )
        .unwrap(),
    );

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let fault = Arc::clone(&fault);
            thread::spawn(move || (fault.depth(), fault.root_cause().kind()))
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), (2, FaultKind::ARITHMETIC));
    }
}

#[test]
fn test_independent_runs_in_parallel() {
    let channel = PropagationChannel::new();
    let operations: Vec<_> = (0..16_i64)
        .map(|n| {
            move || -> PropagationResult<i64> {
                if n % 4 == 0 {
                    Err(Fault::of(FaultKind::ARITHMETIC, format!("rejected {n}")))
                } else {
                    Ok(n * n)
                }
            }
        })
        .collect();

    let results = channel.run_all(operations);
    assert_eq!(results.len(), 16);
    for (n, result) in results.iter().enumerate() {
        if n % 4 == 0 {
            assert_eq!(result.as_ref().unwrap_err().message(), format!("rejected {n}"));
        } else {
            assert_eq!(result, &Ok((n * n) as i64));
        }
    }
}

#[test]
fn test_release_waits_for_scoped_workers() {
    let finished = AtomicUsize::new(0);
    let released_after = Mutex::new(None);

    let result = with_resource(
        || Ok(()),
        |_| {
            thread::scope(|scope| {
                for _ in 0..4 {
                    scope.spawn(|| {
                        thread::sleep(Duration::from_millis(10));
                        finished.fetch_add(1, Ordering::SeqCst);
                    });
                }
            });
            Ok(())
        },
        |_| {
            *released_after.lock().unwrap() = Some(finished.load(Ordering::SeqCst));
            Ok(())
        },
    );

    assert!(result.is_ok());
    assert_eq!(*released_after.lock().unwrap(), Some(4));
}

#[test]
fn test_cancelled_wait_still_releases() {
    let flag = CancelFlag::new();
    let remote = flag.clone();
    let released = Arc::new(AtomicBool::new(false));
    let released_flag = Arc::clone(&released);

    let worker = thread::spawn(move || {
        with_resource(
            || Ok("lock"),
            |_| remote.wait(Duration::from_secs(30)),
            move |_| {
                released_flag.store(true, Ordering::SeqCst);
                Ok(())
            },
        )
    });

    thread::sleep(Duration::from_millis(20));
    flag.cancel();

    let fault = worker.join().unwrap().unwrap_err();
    assert_eq!(fault.kind(), FaultKind::INTERRUPTION);
    assert!(released.load(Ordering::SeqCst));
}

#[test]
fn test_dispatcher_shared_between_threads() {
    let dispatcher = Arc::new(
        Dispatcher::builder()
            .on([FaultKind::ARITHMETIC], |_| Ok(0_i64))
            .build(),
    );

    let handles: Vec<_> = (1..=4_i64)
        .map(|divisor| {
            let dispatcher = Arc::clone(&dispatcher);
            thread::spawn(move || {
                dispatcher.recover(run(move || -> PropagationResult<i64> {
                    if divisor % 2 == 0 {
                        Err(Fault::of(FaultKind::ARITHMETIC, "division by zero"))
                    } else {
                        Ok(100 / divisor)
                    }
                }))
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(results, vec![Ok(100), Ok(0), Ok(33), Ok(0)]);
}
