//! Single-step failures and their classification

use std::collections::HashMap;
use std::error::Error;
use std::fmt;

use faultkit_core::{
    Dispatcher, Fault, FaultKind, OptionExt, PropagationChannel, PropagationResult, ResultExt,
};

use super::Steps;

fn divide(dividend: i32, divisor: i32) -> PropagationResult<i32> {
    dividend.checked_div(divisor).ok_or_else(|| {
        Fault::of(FaultKind::ARITHMETIC, "division by zero")
            .with_context("dividend", dividend)
            .with_context("divisor", divisor)
    })
}

pub(super) fn division_by_zero(steps: &mut Steps) -> PropagationResult<String> {
    let handlers = Dispatcher::builder()
        .on([FaultKind::ARITHMETIC], |_| Ok(0))
        .build();

    steps.note("computing 10 / 0");
    let result = divide(10, 0);
    if let Err(fault) = &result {
        steps.note(format!("caught {fault}"));
    }
    let value = handlers.recover(result)?;
    steps.note("Arithmetic handler supplied 0");
    Ok(format!("10 / 0 = {value} (fallback)"))
}

/// Error raised by code that knows nothing about faults
#[derive(Debug)]
struct IndexError {
    index: usize,
    len: usize,
}

impl fmt::Display for IndexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "index {} out of bounds for length {}",
            self.index, self.len
        )
    }
}

impl Error for IndexError {}

fn element(values: &[i64], index: usize) -> Result<i64, Box<dyn Error + Send + Sync>> {
    values.get(index).copied().ok_or_else(|| {
        Box::new(IndexError {
            index,
            len: values.len(),
        }) as Box<dyn Error + Send + Sync>
    })
}

pub(super) fn array_bounds(steps: &mut Steps) -> PropagationResult<String> {
    let values = [4, 8, 15];
    let channel = PropagationChannel::new().classify(|fault| {
        fault
            .message()
            .contains("out of bounds")
            .then_some(FaultKind::BOUNDS)
    });
    let handlers = Dispatcher::builder()
        .on([FaultKind::BOUNDS], |_| Ok(-1))
        .build();

    steps.note("reading element 3 of a 3-element array");
    let result = channel.run(|| element(&values, 3));
    if let Err(fault) = &result {
        steps.note(format!(
            "classified as {} (originally {})",
            fault.kind(),
            fault.root_cause().kind()
        ));
    }
    let value = handlers.recover(result)?;
    Ok(format!("element 3 unavailable, using {value}"))
}

pub(super) fn null_reference(steps: &mut Steps) -> PropagationResult<String> {
    let emails: HashMap<&str, &str> = HashMap::from([("ada", "ada@example.com")]);
    let handlers = Dispatcher::builder()
        .on([FaultKind::NULL_REFERENCE], |fault| {
            Ok(format!("skipped ({})", fault.message()))
        })
        .build();

    steps.note("looking up the email of customer 'grace'");
    let result = emails
        .get("grace")
        .required("customer email")
        .map(|email| email.to_string());
    if let Err(fault) = &result {
        steps.note(format!("caught {fault}"));
    }
    handlers.recover(result)
}

pub(super) fn number_format(steps: &mut Steps) -> PropagationResult<String> {
    let input = "12a";
    let handlers = Dispatcher::builder()
        .on([FaultKind::FORMAT], |fault| {
            Ok(format!("rejected input ({})", fault.message()))
        })
        .build();

    steps.note(format!("parsing {input:?} as an integer"));
    let result = input.parse::<i32>().classified();
    if let Err(fault) = &result {
        steps.note(format!("classified as {}", fault.kind()));
    }
    handlers
        .recover(result.map(|n| n.to_string()))
        .map(|value| format!("{value}, input was {input:?}"))
}

pub(super) fn class_cast(steps: &mut Steps) -> PropagationResult<String> {
    let wide = 300_i32;
    let handlers = Dispatcher::builder()
        .on([FaultKind::CAST], |_| Ok(u8::MAX))
        .build();

    steps.note(format!("converting {wide} to u8"));
    let result = u8::try_from(wide).classified();
    if let Err(fault) = &result {
        steps.note(format!("caught {fault}"));
    }
    let narrow = handlers.recover(result)?;
    Ok(format!("{wide} clamped to {narrow}"))
}
