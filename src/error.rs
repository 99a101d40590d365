//! Error types for saywhen.
//!
//! Errors raised through a double keep their identity: a configured throw
//! reaches the caller as the very same error object that was registered.

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// An error raised by a double at the call site.
///
/// Cloning shares the underlying error, so [`Thrown::ptr_eq`] can assert that
/// the error observed by a caller is the one that was configured.
#[derive(Clone)]
pub struct Thrown(Arc<dyn StdError + Send + Sync + 'static>);

impl Thrown {
    /// Wraps a concrete error.
    pub fn new<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self(Arc::new(error))
    }

    /// Builds an error from a plain message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self::new(Message(message.into()))
    }

    /// Returns true if both handles refer to the same error object.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Attempts to view the concrete error.
    #[must_use]
    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        self.0.downcast_ref::<E>()
    }
}

impl fmt::Debug for Thrown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Thrown").field(&self.0).finish()
    }
}

impl fmt::Display for Thrown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl StdError for Thrown {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.0.source()
    }
}

#[derive(Debug, Error)]
#[error("{0}")]
struct Message(String);

/// Failure of a capability matcher while evaluating an argument.
#[derive(Debug, Clone, Error)]
pub enum MatcherError {
    /// The matcher could not evaluate the value.
    #[error("Matcher '{matcher}' failed on {value}: {reason}")]
    Failed {
        /// Description of the failing matcher.
        matcher: String,
        /// Rendered argument value.
        value: String,
        /// Why evaluation failed.
        reason: String,
    },
}

impl MatcherError {
    /// Creates a matcher failure.
    #[must_use]
    pub fn failed(
        matcher: impl Into<String>,
        value: &crate::value::Value,
        reason: impl Into<String>,
    ) -> Self {
        Self::Failed {
            matcher: matcher.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// Top-level error for a call made through a double.
#[derive(Debug, Error)]
pub enum CallError {
    /// The double raised an error: a configured throw, a failing compute
    /// response, or a failing fallback.
    #[error("{0}")]
    Thrown(#[from] Thrown),

    /// A matcher failed and the context propagates matcher failures.
    #[error("Matcher error: {0}")]
    Matcher(#[from] MatcherError),
}

impl CallError {
    /// Returns the raised error, if this is a throw.
    #[must_use]
    pub const fn thrown(&self) -> Option<&Thrown> {
        match self {
            Self::Thrown(t) => Some(t),
            Self::Matcher(_) => None,
        }
    }

    /// Returns true if this is a throw.
    #[must_use]
    pub const fn is_thrown(&self) -> bool {
        matches!(self, Self::Thrown(_))
    }

    /// Returns true if this is a matcher failure.
    #[must_use]
    pub const fn is_matcher(&self) -> bool {
        matches!(self, Self::Matcher(_))
    }
}

/// Result of calling a double.
pub type CallResult = Result<crate::value::Value, CallError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[derive(Debug, Error, PartialEq)]
    #[error("boom {code}")]
    struct Boom {
        code: u32,
    }

    #[test]
    fn test_thrown_identity() {
        let err = Thrown::msg("foo");
        let same = err.clone();
        let other = Thrown::msg("foo");
        assert!(err.ptr_eq(&same));
        assert!(!err.ptr_eq(&other));
        assert_eq!(err.to_string(), "foo");
    }

    #[test]
    fn test_thrown_downcast() {
        let err = Thrown::new(Boom { code: 7 });
        assert_eq!(err.downcast_ref::<Boom>(), Some(&Boom { code: 7 }));
        assert_eq!(err.to_string(), "boom 7");
    }

    #[test]
    fn test_matcher_error_display() {
        let err = MatcherError::failed("object containing", &Value::from(3), "not an object");
        let msg = format!("{err}");
        assert!(msg.contains("object containing"));
        assert!(msg.contains("not an object"));
        assert!(msg.contains('3'));
    }

    #[test]
    fn test_call_error_kinds() {
        let thrown: CallError = Thrown::msg("x").into();
        assert!(thrown.is_thrown());
        assert!(!thrown.is_matcher());
        assert_eq!(thrown.thrown().map(ToString::to_string).as_deref(), Some("x"));

        let matcher: CallError = MatcherError::failed("m", &Value::Null, "r").into();
        assert!(matcher.is_matcher());
        assert!(matcher.thrown().is_none());
        assert!(format!("{matcher}").contains("Matcher error"));
    }
}
