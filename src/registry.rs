//! Per-double binding registry.
//!
//! Resolution is two-pass: the first specific binding whose pattern matches
//! wins; only when none does is the first default binding used. A default
//! registered before a specific binding therefore still loses to it.
//!
//! Dispatch is serialized per registry: matching, captor recording and the
//! response cursor advance under one lock, so captor histories follow the
//! order in which responses were handed out. Compute responses run after the
//! lock is released. Matchers run under it and must not call the same double.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use crate::binding::Binding;
use crate::config::{MatcherFailurePolicy, StubConfig};
use crate::double::DoubleId;
use crate::error::MatcherError;
use crate::response::{Outcome, Response};
use crate::value::Value;

/// The binding that answers a call and the response its cursor handed out.
#[derive(Debug)]
pub struct Resolved {
    /// The answering binding.
    pub binding: Arc<Binding>,
    /// `None` when the binding has no responses.
    pub response: Option<Response>,
}

impl Resolved {
    /// Produces the call's outcome, running compute responses.
    #[must_use]
    pub fn produce(self, args: &[Value]) -> Outcome {
        Outcome::from_next(self.response, args)
    }
}

/// Ordered bindings registered for one double.
#[derive(Debug)]
pub struct StubRegistry {
    double: DoubleId,
    config: StubConfig,
    bindings: RwLock<Vec<Arc<Binding>>>,
    dispatch: Mutex<()>,
}

impl StubRegistry {
    /// Creates an empty registry for `double`.
    #[must_use]
    pub fn new(double: DoubleId, config: StubConfig) -> Self {
        Self {
            double,
            config,
            bindings: RwLock::new(Vec::new()),
            dispatch: Mutex::new(()),
        }
    }

    /// The double this registry belongs to.
    #[must_use]
    pub const fn double(&self) -> DoubleId {
        self.double
    }

    #[allow(missing_docs)]
    #[must_use]
    pub const fn config(&self) -> &StubConfig {
        &self.config
    }

    /// Appends a binding. Existing bindings are never replaced.
    pub fn register(&self, binding: Binding) -> Arc<Binding> {
        let binding = Arc::new(binding);
        tracing::debug!(
            double = %self.double,
            binding = %binding.id(),
            kind = %binding.kind(),
            arity = ?binding.pattern().arity(),
            "registered binding"
        );
        self.bindings
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::clone(&binding));
        binding
    }

    /// Resolves the binding that answers a call, recording its captors.
    ///
    /// # Errors
    /// Returns `MatcherError` only under [`MatcherFailurePolicy::Propagate`].
    pub fn resolve(&self, args: &[Value]) -> Result<Option<Arc<Binding>>, MatcherError> {
        let _serial = self.serialize();
        self.resolve_serialized(args)
    }

    /// Resolves a call and advances the winning binding's cursor atomically.
    ///
    /// # Errors
    /// Returns `MatcherError` only under [`MatcherFailurePolicy::Propagate`].
    pub fn advance(&self, args: &[Value]) -> Result<Option<Resolved>, MatcherError> {
        let _serial = self.serialize();
        Ok(self.resolve_serialized(args)?.map(|binding| {
            let response = binding.next_response();
            Resolved { binding, response }
        }))
    }

    fn serialize(&self) -> MutexGuard<'_, ()> {
        self.dispatch.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn resolve_serialized(&self, args: &[Value]) -> Result<Option<Arc<Binding>>, MatcherError> {
        // Snapshot so registration never waits on user matchers.
        let bindings = self.bindings();

        for binding in bindings.iter().filter(|b| !b.is_default()) {
            if self.try_match(binding, args)? {
                binding.commit_captures(args);
                tracing::trace!(double = %self.double, binding = %binding.id(), "resolved specific binding");
                return Ok(Some(Arc::clone(binding)));
            }
        }

        let fallback = bindings.iter().find(|b| b.is_default()).cloned();
        match &fallback {
            Some(binding) => {
                tracing::trace!(double = %self.double, binding = %binding.id(), "resolved default binding");
            }
            None => tracing::trace!(double = %self.double, "no binding matched"),
        }
        Ok(fallback)
    }

    fn try_match(&self, binding: &Binding, args: &[Value]) -> Result<bool, MatcherError> {
        match binding.matches(args) {
            Ok(matched) => Ok(matched),
            Err(err) => match self.config.matcher_failure {
                MatcherFailurePolicy::NonMatch => {
                    tracing::warn!(
                        double = %self.double,
                        binding = %binding.id(),
                        error = %err,
                        "matcher failed; treating binding as not matching"
                    );
                    Ok(false)
                }
                MatcherFailurePolicy::Propagate => Err(err),
            },
        }
    }

    /// Snapshot of the bindings in registration order.
    #[must_use]
    pub fn bindings(&self) -> Vec<Arc<Binding>> {
        self.bindings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of registered bindings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every binding.
    pub fn clear(&self) {
        let mut bindings = self.bindings.write().unwrap_or_else(PoisonError::into_inner);
        tracing::debug!(double = %self.double, dropped = bindings.len(), "cleared bindings");
        bindings.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::{ArgumentMatcher, Matcher};
    use crate::{args, captor};
    use tracing_test::traced_test;

    struct Exploding;

    impl ArgumentMatcher for Exploding {
        fn matches(&self, value: &Value) -> Result<bool, MatcherError> {
            Err(MatcherError::failed("exploding", value, "cannot evaluate"))
        }
    }

    fn registry() -> StubRegistry {
        StubRegistry::new(DoubleId::new(), StubConfig::default())
    }

    fn answer(registry: &StubRegistry, args: &[Value]) -> Option<Value> {
        registry
            .resolve(args)
            .unwrap()
            .map(|b| b.consume(args).into_result().unwrap())
    }

    #[test]
    fn test_empty_registry_resolves_nothing() {
        let registry = registry();
        assert!(registry.is_empty());
        assert!(registry.resolve(&[Value::from("foo")]).unwrap().is_none());
    }

    #[test]
    fn test_specific_beats_earlier_default() {
        let registry = registry();
        let default = registry.register(Binding::any_call());
        default.push(crate::response::Response::Return(Value::from("bing")));
        let specific = registry.register(Binding::specific(args!["foo"]));
        specific.push(crate::response::Response::Return(Value::from("bar")));

        assert_eq!(answer(&registry, &[Value::from("foo")]), Some(Value::from("bar")));
        assert_eq!(answer(&registry, &[Value::from("baz")]), Some(Value::from("bing")));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_first_registered_specific_wins() {
        let registry = registry();
        let first = registry.register(Binding::specific(args![Matcher::Any]));
        registry.register(Binding::specific(args!["foo"]));
        let resolved = registry.resolve(&[Value::from("foo")]).unwrap().unwrap();
        assert_eq!(resolved.id(), first.id());
    }

    #[test]
    fn test_advance_hands_out_responses_in_order() {
        let registry = registry();
        let seen = captor();
        let binding = registry.register(Binding::specific(args![&seen]));
        for i in 0..3 {
            binding.push(crate::response::Response::Return(Value::from(i)));
        }

        for arg in ["a", "b", "c"] {
            let resolved = registry.advance(&[Value::from(arg)]).unwrap().unwrap();
            assert_eq!(resolved.binding.id(), binding.id());
            resolved.produce(&[]).into_result().unwrap();
        }
        assert_eq!(seen.values(), vec![Value::from("a"), Value::from("b"), Value::from("c")]);
        assert!(registry.advance(&[]).unwrap().is_none());
    }

    #[test]
    fn test_advance_on_empty_binding_has_no_response() {
        let registry = registry();
        registry.register(Binding::any_call());
        let resolved = registry.advance(&[]).unwrap().unwrap();
        assert!(resolved.response.is_none());
        assert!(matches!(resolved.produce(&[]), Outcome::Empty));
    }

    #[test]
    fn test_first_default_wins() {
        let registry = registry();
        let first = registry.register(Binding::any_call());
        registry.register(Binding::any_call());
        let resolved = registry.resolve(&[]).unwrap().unwrap();
        assert_eq!(resolved.id(), first.id());
    }

    #[test]
    fn test_only_winner_captures() {
        let registry = registry();
        let winner = captor();
        let loser = captor();
        registry.register(Binding::specific(args!["foo", &winner]));
        registry.register(Binding::specific(args![Matcher::Any, &loser]));

        registry.resolve(&[Value::from("foo"), Value::from(1)]).unwrap();
        registry.resolve(&[Value::from("bar"), Value::from(2)]).unwrap();

        assert_eq!(winner.values(), vec![Value::from(1)]);
        assert_eq!(loser.values(), vec![Value::from(2)]);
    }

    #[test]
    fn test_no_partial_capture_on_mismatch() {
        let registry = registry();
        let c = captor();
        registry.register(Binding::specific(args![&c, "foo"]));
        assert!(registry
            .resolve(&[Value::from(1), Value::from("bar")])
            .unwrap()
            .is_none());
        assert!(c.is_empty());
    }

    #[test]
    fn test_captor_only_binding_is_empty_outcome() {
        let registry = registry();
        let c = captor();
        registry.register(Binding::specific(args![&c]));
        let binding = registry.resolve(&[Value::from("foo")]).unwrap().unwrap();
        assert!(matches!(binding.consume(&[]), Outcome::Empty));
        assert_eq!(c.latest(), Some(Value::from("foo")));
    }

    #[traced_test]
    #[test]
    fn test_failing_matcher_is_non_match_by_default() {
        let registry = registry();
        registry.register(Binding::specific(args![Matcher::capability(Exploding)]));
        let fallback = registry.register(Binding::any_call());

        let resolved = registry.resolve(&[Value::from(1)]).unwrap().unwrap();
        assert_eq!(resolved.id(), fallback.id());
        assert!(logs_contain("treating binding as not matching"));
    }

    #[test]
    fn test_failing_matcher_propagates_when_configured() {
        let registry = StubRegistry::new(
            DoubleId::new(),
            StubConfig::default().with_matcher_failure(MatcherFailurePolicy::Propagate),
        );
        registry.register(Binding::specific(args![Matcher::capability(Exploding)]));
        registry.register(Binding::any_call());

        let err = registry.resolve(&[Value::from(1)]).unwrap_err();
        assert!(err.to_string().contains("exploding"));
    }

    #[test]
    fn test_clear() {
        let registry = registry();
        registry.register(Binding::any_call());
        registry.clear();
        assert!(registry.is_empty());
        assert!(registry.resolve(&[]).unwrap().is_none());
    }
}
