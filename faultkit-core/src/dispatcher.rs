//! Rule-based fault dispatch
//!
//! A [`Dispatcher`] holds an ordered list of [`HandlerRule`]s. A fault goes
//! to the first rule whose kind set contains the fault's kind; later rules
//! are never consulted. Unmatched faults come back unchanged.
//!
//! Nesting works like nested catch blocks: whatever leaves an inner
//! dispatcher as `Err`, whether unmatched or escalated by a handler, is the
//! input of the next dispatcher outward.

use smallvec::SmallVec;

use crate::fault::Fault;
use crate::kind::FaultKind;
use crate::propagation::PropagationResult;

type Action<T> = Box<dyn Fn(Fault) -> PropagationResult<T> + Send + Sync>;

/// Which kinds a rule accepts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KindSet {
    /// Exactly these kinds
    Only(SmallVec<[FaultKind; 4]>),
    /// Every kind, registered now or later
    Any,
}

impl KindSet {
    /// Set holding the given kinds, duplicates dropped
    pub fn of(kinds: impl IntoIterator<Item = FaultKind>) -> Self {
        let mut set: SmallVec<[FaultKind; 4]> = SmallVec::new();
        for kind in kinds {
            if !set.contains(&kind) {
                set.push(kind);
            }
        }
        KindSet::Only(set)
    }

    /// Membership test
    pub fn contains(&self, kind: FaultKind) -> bool {
        match self {
            KindSet::Only(kinds) => kinds.contains(&kind),
            KindSet::Any => true,
        }
    }
}

/// One `(kinds, action)` pair
pub struct HandlerRule<T> {
    kinds: KindSet,
    action: Action<T>,
}

impl<T> std::fmt::Debug for HandlerRule<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRule")
            .field("kinds", &self.kinds)
            .finish_non_exhaustive()
    }
}

impl<T: 'static> HandlerRule<T> {
    /// Rule that runs `action` for any of `kinds`
    pub fn new<A>(kinds: impl IntoIterator<Item = FaultKind>, action: A) -> Self
    where
        A: Fn(Fault) -> PropagationResult<T> + Send + Sync + 'static,
    {
        Self {
            kinds: KindSet::of(kinds),
            action: Box::new(action),
        }
    }

    /// Rule that matches every fault
    pub fn any<A>(action: A) -> Self
    where
        A: Fn(Fault) -> PropagationResult<T> + Send + Sync + 'static,
    {
        Self {
            kinds: KindSet::Any,
            action: Box::new(action),
        }
    }

    /// Rule that resolves matching faults to a fixed value
    pub fn resolve_with(kinds: impl IntoIterator<Item = FaultKind>, value: T) -> Self
    where
        T: Clone + Send + Sync,
    {
        Self::new(kinds, move |_| Ok(value.clone()))
    }

    /// Rule that wraps matching faults in a new fault of `kind`
    pub fn escalate(
        kinds: impl IntoIterator<Item = FaultKind>,
        kind: FaultKind,
        message: impl Into<String>,
    ) -> Self {
        let message = message.into();
        Self::new(kinds, move |fault| Err(escalated(fault, kind, &message)))
    }

    /// Rule that inspects matching faults and passes them on unchanged
    pub fn observe<O>(kinds: impl IntoIterator<Item = FaultKind>, observer: O) -> Self
    where
        O: Fn(&Fault) + Send + Sync + 'static,
    {
        Self::new(kinds, move |fault| {
            observer(&fault);
            Err(fault)
        })
    }
}

impl<T> HandlerRule<T> {
    /// Kinds this rule accepts
    pub fn kinds(&self) -> &KindSet {
        &self.kinds
    }

    /// Whether this rule accepts `kind`
    pub fn matches(&self, kind: FaultKind) -> bool {
        self.kinds.contains(kind)
    }

    fn invoke(&self, fault: Fault) -> PropagationResult<T> {
        (self.action)(fault)
    }
}

/// Wrap `fault` as the cause of a new fault, keeping it if the chain is full
pub fn escalated(fault: Fault, kind: FaultKind, message: &str) -> Fault {
    match Fault::wrap(kind, message, fault.clone()) {
        Ok(wrapped) => wrapped,
        Err(error) => {
            tracing::warn!(%error, "escalation dropped, rethrowing original fault");
            fault
        }
    }
}

/// Send `fault` to the first rule in `rules` that accepts its kind
pub fn dispatch<T>(fault: Fault, rules: &[HandlerRule<T>]) -> PropagationResult<T> {
    match rules.iter().position(|rule| rule.matches(fault.kind())) {
        Some(index) => {
            tracing::debug!(kind = %fault.kind(), rule = index, "fault matched handler");
            rules[index].invoke(fault)
        }
        None => {
            tracing::trace!(kind = %fault.kind(), "no handler matched");
            Err(fault)
        }
    }
}

/// Ordered handler rules
pub struct Dispatcher<T> {
    rules: Vec<HandlerRule<T>>,
}

impl<T> std::fmt::Debug for Dispatcher<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("rules", &self.rules)
            .finish()
    }
}

impl<T> Default for Dispatcher<T> {
    fn default() -> Self {
        Self { rules: Vec::new() }
    }
}

impl<T> Dispatcher<T> {
    /// Dispatcher over `rules`, in priority order
    pub fn new(rules: Vec<HandlerRule<T>>) -> Self {
        Self { rules }
    }

    /// Start building a dispatcher
    pub fn builder() -> DispatcherBuilder<T> {
        DispatcherBuilder { rules: Vec::new() }
    }

    /// The configured rules
    pub fn rules(&self) -> &[HandlerRule<T>] {
        &self.rules
    }

    /// Number of rules
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether there are no rules
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Whether some rule accepts `kind`
    pub fn handles(&self, kind: FaultKind) -> bool {
        self.rules.iter().any(|rule| rule.matches(kind))
    }

    /// Route `fault` to the first matching rule
    pub fn dispatch(&self, fault: Fault) -> PropagationResult<T> {
        dispatch(fault, &self.rules)
    }

    /// Route the fault of a failed result; success passes through
    pub fn recover(&self, result: PropagationResult<T>) -> PropagationResult<T> {
        result.or_else(|fault| self.dispatch(fault))
    }
}

/// Route `fault` through nested dispatchers, innermost first
///
/// Each dispatcher sees what the previous one let escape.
pub fn dispatch_nested<T>(fault: Fault, layers: &[&Dispatcher<T>]) -> PropagationResult<T> {
    layers
        .iter()
        .fold(Err(fault), |result, layer| layer.recover(result))
}

/// Builder for [`Dispatcher`]
pub struct DispatcherBuilder<T> {
    rules: Vec<HandlerRule<T>>,
}

impl<T: 'static> DispatcherBuilder<T> {
    /// Append a rule for `kinds`
    pub fn on<A>(mut self, kinds: impl IntoIterator<Item = FaultKind>, action: A) -> Self
    where
        A: Fn(Fault) -> PropagationResult<T> + Send + Sync + 'static,
    {
        self.rules.push(HandlerRule::new(kinds, action));
        self
    }

    /// Append a catch-all rule
    pub fn on_any<A>(mut self, action: A) -> Self
    where
        A: Fn(Fault) -> PropagationResult<T> + Send + Sync + 'static,
    {
        self.rules.push(HandlerRule::any(action));
        self
    }

    /// Append a prepared rule
    pub fn rule(mut self, rule: HandlerRule<T>) -> Self {
        self.rules.push(rule);
        self
    }

    /// Finish building
    pub fn build(self) -> Dispatcher<T> {
        Dispatcher { rules: self.rules }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn fault(kind: FaultKind) -> Fault {
        Fault::of(kind, "failure")
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let rules = vec![
            HandlerRule::new([FaultKind::ARITHMETIC], |_| Ok("h1")),
            HandlerRule::new([FaultKind::ARITHMETIC, FaultKind::BOUNDS], |_| Ok("h2")),
        ];

        assert_eq!(dispatch(fault(FaultKind::BOUNDS), &rules), Ok("h2"));
        assert_eq!(dispatch(fault(FaultKind::ARITHMETIC), &rules), Ok("h1"));
    }

    #[test]
    fn test_unmatched_fault_returned_unchanged() {
        let rules = vec![HandlerRule::new([FaultKind::ARITHMETIC], |_| Ok(0))];
        let original = fault(FaultKind::CAST);

        let result = dispatch(original.clone(), &rules);
        assert_eq!(result, Err(original));
    }

    #[test]
    fn test_no_rules_propagates() {
        let dispatcher: Dispatcher<i32> = Dispatcher::default();
        assert!(dispatcher.is_empty());
        let original = fault(FaultKind::FORMAT);
        assert_eq!(dispatcher.dispatch(original.clone()), Err(original));
    }

    #[test]
    fn test_later_rules_not_invoked() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let dispatcher = Dispatcher::builder()
            .on([FaultKind::FORMAT], |_| Ok(1))
            .on([FaultKind::FORMAT], move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(2)
            })
            .build();

        assert_eq!(dispatcher.dispatch(fault(FaultKind::FORMAT)), Ok(1));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_escalation_chains_original() {
        let rules: Vec<HandlerRule<()>> = vec![HandlerRule::escalate(
            [FaultKind::ARITHMETIC],
            FaultKind::UNCLASSIFIED,
            "report generation failed",
        )];
        let inner = fault(FaultKind::ARITHMETIC);

        let outer = dispatch(inner.clone(), &rules).unwrap_err();
        assert_eq!(outer.kind(), FaultKind::UNCLASSIFIED);
        assert_eq!(outer.cause(), Some(&inner));
        assert_eq!(outer.chain().count(), 2);
    }

    #[test]
    fn test_catch_all_rule() {
        let dispatcher = Dispatcher::builder()
            .on([FaultKind::ARITHMETIC], |_| Ok("arithmetic"))
            .on_any(|_| Ok("general"))
            .build();

        assert_eq!(dispatcher.dispatch(fault(FaultKind::CAST)), Ok("general"));
        assert!(dispatcher.handles(FaultKind::INTERRUPTION));
    }

    #[test]
    fn test_observe_passes_fault_on() {
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        let rules: Vec<HandlerRule<()>> = vec![HandlerRule::observe([FaultKind::BOUNDS], move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        })];

        let original = fault(FaultKind::BOUNDS);
        assert_eq!(dispatch(original.clone(), &rules), Err(original));
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_nested_dispatch() {
        let inner = Dispatcher::builder()
            .on([FaultKind::FORMAT], |_| Ok(-1))
            .rule(HandlerRule::escalate(
                [FaultKind::BOUNDS],
                FaultKind::STATE_INVALID,
                "lookup failed",
            ))
            .build();
        let outer = Dispatcher::builder()
            .on([FaultKind::ARITHMETIC], |_| Ok(0))
            .on([FaultKind::STATE_INVALID], |fault| Ok(fault.depth() as i32))
            .build();

        // Handled by the inner layer
        assert_eq!(dispatch_nested(fault(FaultKind::FORMAT), &[&inner, &outer]), Ok(-1));
        // Unmatched inside, handled outside
        assert_eq!(dispatch_nested(fault(FaultKind::ARITHMETIC), &[&inner, &outer]), Ok(0));
        // Escalated inside, handled outside
        assert_eq!(dispatch_nested(fault(FaultKind::BOUNDS), &[&inner, &outer]), Ok(2));
        // Matched nowhere
        let stray = fault(FaultKind::CAST);
        assert_eq!(dispatch_nested(stray.clone(), &[&inner, &outer]), Err(stray));
    }

    #[test]
    fn test_recover_leaves_success_alone() {
        let dispatcher = Dispatcher::new(vec![HandlerRule::resolve_with([FaultKind::ARITHMETIC], 0)]);
        assert_eq!(dispatcher.recover(Ok(7)), Ok(7));
        assert_eq!(dispatcher.recover(Err(fault(FaultKind::ARITHMETIC))), Ok(0));
    }

    #[test]
    fn test_kind_set_deduplicates() {
        let set = KindSet::of([FaultKind::CAST, FaultKind::CAST, FaultKind::FORMAT]);
        assert_eq!(
            set,
            KindSet::Only(SmallVec::from_slice(&[FaultKind::CAST, FaultKind::FORMAT]))
        );
        assert!(!set.contains(FaultKind::BOUNDS));
        assert!(KindSet::Any.contains(FaultKind::BOUNDS));
    }
}
