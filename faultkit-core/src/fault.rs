//! The fault value
//!
//! A [`Fault`] records one detected failure: its kind, a message, an
//! optional cause and free-form diagnostic context. Faults are immutable.
//! Methods that "add" to a fault consume it and hand back the updated value,
//! so there is only ever one owner as a fault moves up the call chain.

use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{CoreError, Result};
use crate::kind::FaultKind;

/// Longest permitted cause chain, counting the fault itself
pub const MAX_CAUSE_DEPTH: usize = 64;

/// Context key under which suppressed faults are collected
pub const SUPPRESSED_KEY: &str = "suppressed";

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a fault instance
///
/// Clones share the identity of the fault they were cloned from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FaultId(u64);

impl FaultId {
    fn next() -> Self {
        FaultId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value
    pub fn get(self) -> u64 {
        self.0
    }
}

/// A diagnostic value attached to a fault
#[derive(Debug, Clone, PartialEq)]
pub enum ContextValue {
    /// Free text
    Text(String),
    /// Signed integer
    Integer(i64),
    /// Floating point number
    Float(f64),
    /// Boolean flag
    Bool(bool),
    /// Related faults, e.g. suppressed cleanup failures
    Faults(Vec<Fault>),
}

impl fmt::Display for ContextValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextValue::Text(text) => f.write_str(text),
            ContextValue::Integer(value) => write!(f, "{value}"),
            ContextValue::Float(value) => write!(f, "{value}"),
            ContextValue::Bool(value) => write!(f, "{value}"),
            ContextValue::Faults(faults) => {
                f.write_str("[")?;
                for (i, fault) in faults.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{fault}")?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<&str> for ContextValue {
    fn from(value: &str) -> Self {
        ContextValue::Text(value.to_string())
    }
}

impl From<String> for ContextValue {
    fn from(value: String) -> Self {
        ContextValue::Text(value)
    }
}

impl From<i64> for ContextValue {
    fn from(value: i64) -> Self {
        ContextValue::Integer(value)
    }
}

impl From<i32> for ContextValue {
    fn from(value: i32) -> Self {
        ContextValue::Integer(value.into())
    }
}

impl From<u32> for ContextValue {
    fn from(value: u32) -> Self {
        ContextValue::Integer(value.into())
    }
}

impl From<usize> for ContextValue {
    fn from(value: usize) -> Self {
        ContextValue::Integer(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<f64> for ContextValue {
    fn from(value: f64) -> Self {
        ContextValue::Float(value)
    }
}

impl From<bool> for ContextValue {
    fn from(value: bool) -> Self {
        ContextValue::Bool(value)
    }
}

impl From<Fault> for ContextValue {
    fn from(value: Fault) -> Self {
        ContextValue::Faults(vec![value])
    }
}

/// One detected failure
#[derive(Debug, Clone, PartialEq)]
pub struct Fault {
    id: FaultId,
    kind: FaultKind,
    message: String,
    cause: Option<Box<Fault>>,
    context: BTreeMap<String, ContextValue>,
}

impl Fault {
    /// Create a fault with no cause and no context
    pub fn new(kind: FaultKind, message: impl Into<String>) -> Result<Self> {
        Self::builder(kind, message).build()
    }

    /// Create a fault that records `cause` as the failure that led to it
    pub fn wrap(kind: FaultKind, message: impl Into<String>, cause: Fault) -> Result<Self> {
        Self::builder(kind, message).cause(cause).build()
    }

    /// Start building a fault with cause and context
    pub fn builder(kind: FaultKind, message: impl Into<String>) -> FaultBuilder {
        FaultBuilder {
            kind,
            message: message.into(),
            cause: None,
            context: BTreeMap::new(),
        }
    }

    /// Create a fault without a validation step
    ///
    /// An empty message is replaced by the kind's name, so the result always
    /// satisfies the non-empty message rule. Meant for classifying failures
    /// whose text the caller does not control.
    pub fn of(kind: FaultKind, message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() {
            format!("{kind} failure")
        } else {
            message
        };

        Self {
            id: FaultId::next(),
            kind,
            message,
            cause: None,
            context: BTreeMap::new(),
        }
    }

    /// Identity shared by this fault and its clones
    pub fn id(&self) -> FaultId {
        self.id
    }

    /// The fault's category
    pub fn kind(&self) -> FaultKind {
        self.kind
    }

    /// Whether the fault has the given kind
    pub fn is(&self, kind: FaultKind) -> bool {
        self.kind == kind
    }

    /// Human-readable description
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The fault that led to this one
    pub fn cause(&self) -> Option<&Fault> {
        self.cause.as_deref()
    }

    /// Take the cause out, discarding this fault
    pub fn into_cause(self) -> Option<Fault> {
        self.cause.map(|cause| *cause)
    }

    /// Diagnostic context, ordered by key
    pub fn context(&self) -> &BTreeMap<String, ContextValue> {
        &self.context
    }

    /// Look up a single context entry
    pub fn context_value(&self, key: &str) -> Option<&ContextValue> {
        self.context.get(key)
    }

    /// Faults recorded as suppressed while this one propagated
    pub fn suppressed(&self) -> &[Fault] {
        match self.context.get(SUPPRESSED_KEY) {
            Some(ContextValue::Faults(faults)) => faults,
            _ => &[],
        }
    }

    /// This fault followed by each transitive cause, outermost first
    pub fn chain(&self) -> Chain<'_> {
        Chain { next: Some(self) }
    }

    /// The innermost fault of the chain
    pub fn root_cause(&self) -> &Fault {
        let mut current = self;
        while let Some(cause) = current.cause() {
            current = cause;
        }
        current
    }

    /// Number of faults in the chain, including this one
    pub fn depth(&self) -> usize {
        self.chain().count()
    }

    /// Attach a cause to a fault that has none
    ///
    /// Identity is kept, so this is the way to reject self-causation: the
    /// call fails when `cause` or anything below it is this fault.
    pub fn with_cause(mut self, cause: Fault) -> Result<Self> {
        if self.cause.is_some() {
            return Err(CoreError::invalid_fault("cause is already set"));
        }
        check_cause(self.id, &cause)?;
        self.cause = Some(Box::new(cause));
        Ok(self)
    }

    /// Add or replace one context entry
    ///
    /// The `suppressed` key is maintained by [`with_suppressed`](Self::with_suppressed);
    /// writing it here replaces whatever was collected.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<ContextValue>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Record a secondary fault without replacing this one
    pub fn with_suppressed(mut self, suppressed: Fault) -> Self {
        match self.context.get_mut(SUPPRESSED_KEY) {
            Some(ContextValue::Faults(faults)) => faults.push(suppressed),
            _ => {
                self.context.insert(
                    SUPPRESSED_KEY.to_string(),
                    ContextValue::Faults(vec![suppressed]),
                );
            }
        }
        self
    }

    /// Wrap this fault as the cause of a new one
    pub fn escalate(self, kind: FaultKind, message: impl Into<String>) -> Result<Self> {
        Self::wrap(kind, message, self)
    }

    /// Attach a cause the caller has already bounded
    pub(crate) fn with_cause_unchecked(mut self, cause: Fault) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)?;
        if f.alternate() {
            for cause in self.chain().skip(1) {
                write!(f, "\n  caused by {}: {}", cause.kind, cause.message)?;
            }
        }
        Ok(())
    }
}

impl StdError for Fault {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.cause
            .as_deref()
            .map(|cause| cause as &(dyn StdError + 'static))
    }
}

/// Walk from a fault through its causes
#[derive(Debug, Clone)]
pub struct Chain<'a> {
    next: Option<&'a Fault>,
}

impl<'a> Iterator for Chain<'a> {
    type Item = &'a Fault;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.cause();
        Some(current)
    }
}

impl std::iter::FusedIterator for Chain<'_> {}

/// Builder for faults with cause and context
#[derive(Debug)]
pub struct FaultBuilder {
    kind: FaultKind,
    message: String,
    cause: Option<Fault>,
    context: BTreeMap<String, ContextValue>,
}

impl FaultBuilder {
    /// Record the fault that led to this one
    pub fn cause(mut self, cause: Fault) -> Self {
        self.cause = Some(cause);
        self
    }

    /// Add a context entry
    pub fn context(mut self, key: impl Into<String>, value: impl Into<ContextValue>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Validate and construct the fault
    pub fn build(self) -> Result<Fault> {
        if self.message.trim().is_empty() {
            return Err(CoreError::invalid_fault("message must not be empty"));
        }

        let id = FaultId::next();
        if let Some(cause) = &self.cause {
            check_cause(id, cause)?;
        }

        Ok(Fault {
            id,
            kind: self.kind,
            message: self.message,
            cause: self.cause.map(Box::new),
            context: self.context,
        })
    }
}

/// Validate that `cause` may sit directly below the fault `owner`
///
/// The walk is bounded by [`MAX_CAUSE_DEPTH`], which also bounds the
/// cycle check.
fn check_cause(owner: FaultId, cause: &Fault) -> Result<()> {
    let mut depth = 1;
    for link in cause.chain() {
        depth += 1;
        if depth > MAX_CAUSE_DEPTH {
            return Err(CoreError::CauseChainTooDeep {
                depth,
                limit: MAX_CAUSE_DEPTH,
            });
        }
        if link.id == owner {
            return Err(CoreError::invalid_fault("a fault cannot be its own cause"));
        }
    }
    Ok(())
}
