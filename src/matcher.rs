//! Argument matchers.
//!
//! A [`Matcher`] decides whether a single call argument is acceptable. Pattern
//! elements are classified once, when a binding is registered: plain values
//! become literal matchers, closures become predicates, external matcher
//! objects become capability matchers and captors stay captors.

use std::fmt;
use std::sync::Arc;

use crate::captor::Captor;
use crate::error::MatcherError;
use crate::value::Value;

/// Predicate over a single argument.
pub type Predicate = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// A matcher supplied from outside the crate.
///
/// Type checks, shape checks and similar matcher libraries plug in through
/// this trait; the engine only ever asks whether a value matches.
pub trait ArgumentMatcher: Send + Sync {
    /// Returns whether `value` satisfies this matcher.
    ///
    /// # Errors
    /// Returns `MatcherError` when the value cannot be evaluated at all.
    fn matches(&self, value: &Value) -> Result<bool, MatcherError>;

    /// Short description used in logs.
    fn describe(&self) -> String {
        "capability".to_string()
    }
}

/// Decides whether a single argument matches.
#[derive(Clone)]
pub enum Matcher {
    /// Matches anything, including `Undefined`.
    Any,
    /// Strict (primitives) or structural (composites) equality.
    Literal(Value),
    /// Loose equality; see [`Value::loose_eq`].
    Loose(Value),
    /// Matches when the predicate returns true.
    ///
    /// Predicates cannot fail, so the matcher failure policy never applies to
    /// them; a panicking predicate unwinds out of the call. Use
    /// [`Matcher::try_predicate`] for checks that can fail.
    Predicate(Predicate),
    /// Delegates to an external matcher.
    Capability(Arc<dyn ArgumentMatcher>),
    /// Matches through the captor's own pattern and records on commit.
    Captor(Captor),
}

impl Matcher {
    /// Creates a literal matcher.
    #[must_use]
    pub fn literal(value: impl Into<Value>) -> Self {
        Self::Literal(value.into())
    }

    /// Creates a predicate matcher.
    #[must_use]
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Self::Predicate(Arc::new(f))
    }

    /// Creates a predicate that may fail.
    ///
    /// Failures are handled by the registry's
    /// [`MatcherFailurePolicy`](crate::config::MatcherFailurePolicy), like
    /// those of capability matchers.
    #[must_use]
    pub fn try_predicate<F>(f: F) -> Self
    where
        F: Fn(&Value) -> Result<bool, MatcherError> + Send + Sync + 'static,
    {
        Self::Capability(Arc::new(FalliblePredicate(f)))
    }

    /// Wraps an external matcher.
    #[must_use]
    pub fn capability<M>(matcher: M) -> Self
    where
        M: ArgumentMatcher + 'static,
    {
        Self::Capability(Arc::new(matcher))
    }

    /// Evaluates the matcher without side effects.
    ///
    /// Captors are not recorded here; see [`Matcher::commit`].
    ///
    /// # Errors
    /// Propagates failures of capability matchers.
    pub fn evaluate(&self, value: &Value) -> Result<bool, MatcherError> {
        match self {
            Self::Any => Ok(true),
            Self::Literal(expected) => Ok(expected.strict_eq(value)),
            Self::Loose(expected) => Ok(expected.loose_eq(value)),
            Self::Predicate(f) => Ok(f(value)),
            Self::Capability(m) => m.matches(value),
            Self::Captor(captor) => captor.pattern().evaluate(value),
        }
    }

    /// Records `value` into every captor reachable from this matcher.
    ///
    /// Only called once the whole argument list has matched.
    pub(crate) fn commit(&self, value: &Value) {
        if let Self::Captor(captor) = self {
            captor.record(value.clone());
            captor.pattern().commit(value);
        }
    }

    /// Short description used in logs.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Any => "any".to_string(),
            Self::Literal(v) => v.to_string(),
            Self::Loose(v) => format!("is({v})"),
            Self::Predicate(_) => "predicate".to_string(),
            Self::Capability(m) => m.describe(),
            Self::Captor(c) => format!("captor({})", c.pattern().describe()),
        }
    }
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Matcher({})", self.describe())
    }
}

struct FalliblePredicate<F>(F);

impl<F> ArgumentMatcher for FalliblePredicate<F>
where
    F: Fn(&Value) -> Result<bool, MatcherError> + Send + Sync,
{
    fn matches(&self, value: &Value) -> Result<bool, MatcherError> {
        (self.0)(value)
    }

    fn describe(&self) -> String {
        "predicate".to_string()
    }
}

/// Loose-equality matcher: `is(123)` accepts both `123` and `"123"`.
#[must_use]
pub fn is(value: impl Into<Value>) -> Matcher {
    Matcher::Loose(value.into())
}

macro_rules! literal_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Matcher {
                fn from(v: $ty) -> Self {
                    Self::Literal(Value::from(v))
                }
            }
        )*
    };
}

literal_from!(Value, bool, i32, i64, u32, f32, f64, String, &str, serde_json::Value);

impl From<Captor> for Matcher {
    fn from(captor: Captor) -> Self {
        Self::Captor(captor)
    }
}

impl From<&Captor> for Matcher {
    fn from(captor: &Captor) -> Self {
        Self::Captor(captor.clone())
    }
}

/// Argument pattern of a binding.
#[derive(Debug, Clone)]
pub enum ArgPattern {
    /// Matches any argument list, of any length.
    AnyArgs,
    /// Per-position matchers for a prefix of the argument list.
    Positional(Vec<Matcher>),
}

impl ArgPattern {
    /// Tests an argument list against the pattern.
    ///
    /// Positions are evaluated left to right and evaluation stops at the
    /// first mismatch. Calls with fewer arguments than matchers never match;
    /// trailing arguments beyond the pattern are ignored.
    ///
    /// # Errors
    /// Propagates failures of capability matchers.
    pub fn matches(&self, args: &[Value]) -> Result<bool, MatcherError> {
        let Self::Positional(matchers) = self else {
            return Ok(true);
        };
        if args.len() < matchers.len() {
            return Ok(false);
        }
        for (matcher, arg) in matchers.iter().zip(args) {
            if !matcher.evaluate(arg)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Records arguments into captors after a successful match.
    pub(crate) fn commit(&self, args: &[Value]) {
        if let Self::Positional(matchers) = self {
            for (matcher, arg) in matchers.iter().zip(args) {
                matcher.commit(arg);
            }
        }
    }

    /// Number of constrained positions; `None` for [`ArgPattern::AnyArgs`].
    #[must_use]
    pub fn arity(&self) -> Option<usize> {
        match self {
            Self::AnyArgs => None,
            Self::Positional(matchers) => Some(matchers.len()),
        }
    }
}

/// Builds a `Vec<Matcher>` from heterogeneous pattern elements.
///
/// ```
/// use saywhen::{args, captor, Matcher};
///
/// let c = captor();
/// let pattern = args!["foo", 123, &c, Matcher::predicate(|v| v.is_string())];
/// assert_eq!(pattern.len(), 4);
/// ```
#[macro_export]
macro_rules! args {
    () => {
        ::std::vec::Vec::<$crate::Matcher>::new()
    };
    ($($element:expr),+ $(,)?) => {
        ::std::vec![$($crate::Matcher::from($element)),+]
    };
}
