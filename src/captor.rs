//! Argument captors.
//!
//! A captor is a matcher that records every argument it accepted, in call
//! order, for later assertions. Recording only happens when the whole
//! argument list of a binding matched.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use crate::matcher::Matcher;
use crate::value::Value;

struct CaptorInner {
    pattern: Matcher,
    history: Mutex<Vec<Value>>,
}

/// Records matched arguments across calls.
///
/// Clones share the same history.
#[derive(Clone)]
pub struct Captor {
    inner: Arc<CaptorInner>,
}

impl Captor {
    /// Creates a captor that accepts any argument.
    #[must_use]
    pub fn new() -> Self {
        Self::matching(Matcher::Any)
    }

    /// Creates a captor narrowed by `pattern`.
    #[must_use]
    pub fn matching(pattern: impl Into<Matcher>) -> Self {
        Self {
            inner: Arc::new(CaptorInner {
                pattern: pattern.into(),
                history: Mutex::new(Vec::new()),
            }),
        }
    }

    /// The pattern that narrows this captor.
    #[must_use]
    pub fn pattern(&self) -> &Matcher {
        &self.inner.pattern
    }

    /// Most recently captured value.
    #[must_use]
    pub fn latest(&self) -> Option<Value> {
        self.history().last().cloned()
    }

    /// Snapshot of every captured value, oldest first.
    #[must_use]
    pub fn values(&self) -> Vec<Value> {
        self.history().clone()
    }

    /// Number of captured values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.history().len()
    }

    /// Returns true if nothing has been captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.history().is_empty()
    }

    /// Returns true if both handles share the same history.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn record(&self, value: Value) {
        self.history().push(value);
    }

    fn history(&self) -> std::sync::MutexGuard<'_, Vec<Value>> {
        self.inner
            .history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Captor {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Captor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Captor")
            .field("pattern", &self.inner.pattern)
            .field("captured", &self.len())
            .finish()
    }
}

/// Creates a captor that accepts any argument.
#[must_use]
pub fn captor() -> Captor {
    Captor::new()
}

/// Creates a captor that only accepts arguments matching `pattern`.
#[must_use]
pub fn captor_matching(pattern: impl Into<Matcher>) -> Captor {
    Captor::matching(pattern)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_captor() {
        let c = captor();
        assert!(c.is_empty());
        assert_eq!(c.len(), 0);
        assert!(c.latest().is_none());
        assert!(c.values().is_empty());
    }

    #[test]
    fn test_record_order_and_latest() {
        let c = captor();
        c.record(Value::from("foo"));
        c.record(Value::from("bar"));
        assert_eq!(c.latest(), Some(Value::from("bar")));
        assert_eq!(c.values(), vec![Value::from("foo"), Value::from("bar")]);
    }

    #[test]
    fn test_values_is_snapshot() {
        let c = captor();
        c.record(Value::from(1));
        let snapshot = c.values();
        c.record(Value::from(2));
        assert_eq!(snapshot.len(), 1);
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn test_clones_share_history() {
        let c = captor();
        let other = c.clone();
        other.record(Value::from(5));
        assert!(c.ptr_eq(&other));
        assert_eq!(c.latest(), Some(Value::from(5)));
    }

    #[test]
    fn test_captor_pattern() {
        let c = captor_matching("foo");
        assert!(c.pattern().evaluate(&Value::from("foo")).unwrap());
        assert!(!c.pattern().evaluate(&Value::from("bar")).unwrap());
        assert!(captor().pattern().evaluate(&Value::Undefined).unwrap());
    }
}
