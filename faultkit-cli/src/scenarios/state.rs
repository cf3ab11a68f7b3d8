//! Conflicting updates and operations the receiver refuses

use std::sync::{Mutex, PoisonError};
use std::thread;

use faultkit_core::{and_then, map, Dispatcher, Fault, FaultKind, HandlerRule, PropagationResult};

use super::Steps;

#[derive(Debug, Default)]
struct Ledger {
    version: usize,
    entries: Vec<i64>,
}

/// Append to `ledger` if nobody changed it since `seen` was read
fn append(ledger: &Mutex<Ledger>, seen: usize, amount: i64) -> PropagationResult<usize> {
    let mut ledger = ledger.lock().unwrap_or_else(PoisonError::into_inner);
    if ledger.version != seen {
        return Err(
            Fault::of(FaultKind::CONCURRENCY_CONFLICT, "ledger modified since it was read")
                .with_context("expected_version", seen)
                .with_context("found_version", ledger.version),
        );
    }
    ledger.entries.push(amount);
    ledger.version += 1;
    Ok(ledger.version)
}

fn current_version(ledger: &Mutex<Ledger>) -> usize {
    ledger.lock().unwrap_or_else(PoisonError::into_inner).version
}

pub(super) fn concurrent_modification(steps: &mut Steps) -> PropagationResult<String> {
    let ledger = Mutex::new(Ledger::default());
    let retry = Dispatcher::new(vec![HandlerRule::resolve_with(
        [FaultKind::CONCURRENCY_CONFLICT],
        None,
    )]);

    let seen = current_version(&ledger);
    steps.note(format!("read ledger at version {seen}"));
    let competing = thread::scope(|scope| scope.spawn(|| append(&ledger, seen, 40)).join());
    match competing {
        Ok(Ok(version)) => steps.note(format!("another writer moved the ledger to version {version}")),
        Ok(Err(fault)) => return Err(fault),
        Err(payload) => return Err(faultkit_core::propagation::panic_fault(payload)),
    }

    let first = append(&ledger, seen, 25);
    if let Err(fault) = &first {
        steps.note(format!("caught {fault}"));
    }
    let version = match retry.recover(first.map(Some))? {
        Some(version) => version,
        None => {
            let fresh = current_version(&ledger);
            steps.note(format!("retrying at version {fresh}"));
            append(&ledger, fresh, 25)?
        }
    };
    Ok(format!("appended after retry at version {version}"))
}

/// View that refuses every mutation
struct ReadOnlyView<'a> {
    items: &'a [&'a str],
}

impl ReadOnlyView<'_> {
    fn push(&self, item: &str) -> PropagationResult<usize> {
        Err(
            Fault::of(FaultKind::UNSUPPORTED_OPERATION, "cannot add to a read-only view")
                .with_context("item", item)
                .with_context("len", self.items.len()),
        )
    }
}

pub(super) fn unsupported_operation(steps: &mut Steps) -> PropagationResult<String> {
    let handlers = Dispatcher::builder()
        .rule(HandlerRule::observe(
            [FaultKind::UNSUPPORTED_OPERATION],
            |fault| log::warn!("propagating {fault}"),
        ))
        .build();
    let view = ReadOnlyView {
        items: &["alpha", "beta"],
    };

    steps.note("adding \"gamma\" through a read-only view");
    let result = map(view.push("gamma"), |len| format!("view now holds {len} items"));
    if let Err(fault) = &result {
        steps.note(format!("observer saw {} and passed it on", fault.kind()));
    }
    handlers.recover(result)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Closed,
    Open,
}

#[derive(Debug)]
struct Connection {
    phase: Phase,
}

impl Connection {
    fn send(&self, payload: &str) -> PropagationResult<usize> {
        if self.phase != Phase::Open {
            return Err(Fault::builder(FaultKind::STATE_INVALID, "send on a closed connection")
                .context("phase", format!("{:?}", self.phase))
                .build()?);
        }
        Ok(payload.len())
    }
}

pub(super) fn illegal_state(steps: &mut Steps) -> PropagationResult<String> {
    let connection = Connection {
        phase: Phase::Closed,
    };
    let handlers = Dispatcher::builder()
        .on([FaultKind::STATE_INVALID], |fault| {
            let phase = fault
                .context_value("phase")
                .map(ToString::to_string)
                .unwrap_or_default();
            Ok(format!("queued until the connection leaves {phase}"))
        })
        .build();

    steps.note("sending before the connection is opened");
    let result = and_then(connection.send("hello"), |sent| {
        Ok(format!("sent {sent} bytes"))
    });
    if let Err(fault) = &result {
        steps.note(format!("caught {fault}"));
    }
    handlers.recover(result)
}
