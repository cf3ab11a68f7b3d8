//! Handler selection, nesting and escalation

use faultkit_core::{
    dispatch_nested, kind, Dispatcher, Fault, FaultKind, HandlerRule, PropagationResult,
    ResultExt,
};

use super::{Steps, INSUFFICIENT_FUNDS};

pub(super) fn multi_catch(steps: &mut Steps) -> PropagationResult<String> {
    let handlers = Dispatcher::builder()
        .on([FaultKind::FORMAT, FaultKind::CAST], |fault| {
            Ok(format!("{} handled", fault.kind()))
        })
        .on_any(|fault| Ok(format!("fallback for {}", fault.kind())))
        .build();

    steps.note("parsing \"forty\" and narrowing 70000 to u16");
    let parsed = "forty".parse::<i32>().classified().map(|n| n.to_string());
    let narrowed = u16::try_from(70_000_u32).classified().map(|n| n.to_string());

    let mut handled = Vec::new();
    for result in [parsed, narrowed] {
        let value = handlers.recover(result)?;
        steps.note(value.clone());
        handled.push(value);
    }
    Ok(format!("{} faults handled by one rule", handled.len()))
}

pub(super) fn nested_catch(steps: &mut Steps) -> PropagationResult<String> {
    let inner = Dispatcher::builder()
        .on([FaultKind::ARITHMETIC], |_| Ok("inner".to_string()))
        .build();
    let outer = Dispatcher::builder()
        .on([FaultKind::BOUNDS], |fault| {
            Ok(format!("outer handler recovered {}", fault.kind()))
        })
        .build();

    let fault = Fault::of(FaultKind::BOUNDS, "index 7 out of bounds for length 4");
    steps.note(format!("raised {fault}"));
    steps.note(format!(
        "inner handles {}: {}",
        FaultKind::BOUNDS,
        inner.handles(FaultKind::BOUNDS)
    ));
    dispatch_nested(fault, &[&inner, &outer])
}

fn invoice_total(quantities: &[i64], splits: i64) -> PropagationResult<i64> {
    let total: i64 = quantities.iter().sum();
    total.checked_div(splits).ok_or_else(|| {
        Fault::of(FaultKind::ARITHMETIC, "division by zero").with_context("total", total)
    })
}

pub(super) fn chained_escalation(steps: &mut Steps) -> PropagationResult<String> {
    let handlers: Dispatcher<i64> = Dispatcher::builder()
        .rule(HandlerRule::observe([FaultKind::ARITHMETIC], |fault| {
            log::debug!("escalating {fault}");
        }))
        .build();
    let escalation: Dispatcher<i64> = Dispatcher::builder()
        .rule(HandlerRule::escalate(
            [FaultKind::ARITHMETIC],
            FaultKind::STATE_INVALID,
            "invoice total failed",
        ))
        .build();

    steps.note("splitting an invoice zero ways");
    let result = handlers.recover(invoice_total(&[3, 4, 5], 0));
    if let Err(fault) = &result {
        steps.note(format!("observer passed on {fault}"));
    }
    let result = escalation.recover(result);
    if let Err(fault) = &result {
        steps.note(format!("escalated to {}", fault.kind()));
        steps.note(format!("root cause is {}", fault.root_cause()));
    }
    result.map(|share| share.to_string())
}

fn withdraw(balance: i64, amount: i64) -> PropagationResult<i64> {
    if amount <= balance {
        return Ok(balance - amount);
    }
    let funds = kind::global().lookup(INSUFFICIENT_FUNDS).ok_or_else(|| {
        Fault::of(
            FaultKind::STATE_INVALID,
            format!("fault kind {INSUFFICIENT_FUNDS} is not registered"),
        )
    })?;
    Err(Fault::builder(funds, "balance too low for withdrawal")
        .context("balance", balance)
        .context("requested", amount)
        .build()?)
}

pub(super) fn custom_kind(steps: &mut Steps) -> PropagationResult<String> {
    let funds = kind::global()
        .lookup(INSUFFICIENT_FUNDS)
        .unwrap_or(FaultKind::UNCLASSIFIED);
    let handlers = Dispatcher::builder()
        .on([funds], |fault| {
            let shortfall = fault
                .context_value("requested")
                .map(ToString::to_string)
                .unwrap_or_default();
            Ok(format!("withdrawal of {shortfall} declined"))
        })
        .build();

    steps.note(format!("withdrawing 80 from a balance of 50 ({funds} registered)"));
    let result = withdraw(50, 80).map(|left| left.to_string());
    if let Err(fault) = &result {
        steps.note(format!("caught {fault}"));
    }
    handlers.recover(result)
}
