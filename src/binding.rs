//! Bindings: an argument pattern paired with a queue of responses.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{MatcherError, Thrown};
use crate::matcher::{ArgPattern, Matcher};
use crate::response::{Outcome, Response, ResponseQueue};
use crate::value::Value;

/// Unique identifier for a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BindingId(Uuid);

impl BindingId {
    /// Creates a new random binding ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BindingId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BindingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Priority class of a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BindingKind {
    /// Registered with an explicit argument pattern.
    Specific,
    /// Answers any call no specific binding answered.
    Default,
}

impl fmt::Display for BindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Specific => write!(f, "specific"),
            Self::Default => write!(f, "default"),
        }
    }
}

/// A registered rule: argument pattern plus response queue.
pub struct Binding {
    id: BindingId,
    kind: BindingKind,
    pattern: ArgPattern,
    queue: Mutex<ResponseQueue>,
}

impl Binding {
    /// Creates a specific binding for the given per-position matchers.
    #[must_use]
    pub fn specific(matchers: Vec<Matcher>) -> Self {
        Self::with_pattern(BindingKind::Specific, ArgPattern::Positional(matchers))
    }

    /// Creates a default binding that accepts any argument list.
    #[must_use]
    pub fn any_call() -> Self {
        Self::with_pattern(BindingKind::Default, ArgPattern::AnyArgs)
    }

    fn with_pattern(kind: BindingKind, pattern: ArgPattern) -> Self {
        Self {
            id: BindingId::new(),
            kind,
            pattern,
            queue: Mutex::new(ResponseQueue::new()),
        }
    }

    #[allow(missing_docs)]
    #[must_use]
    pub const fn id(&self) -> BindingId {
        self.id
    }

    #[allow(missing_docs)]
    #[must_use]
    pub const fn kind(&self) -> BindingKind {
        self.kind
    }

    #[allow(missing_docs)]
    #[must_use]
    pub const fn is_default(&self) -> bool {
        matches!(self.kind, BindingKind::Default)
    }

    #[allow(missing_docs)]
    #[must_use]
    pub const fn pattern(&self) -> &ArgPattern {
        &self.pattern
    }

    /// Tests the call's arguments without recording captors.
    ///
    /// # Errors
    /// Propagates failures of capability matchers.
    pub fn matches(&self, args: &[Value]) -> Result<bool, MatcherError> {
        self.pattern.matches(args)
    }

    /// Records the call's arguments into this binding's captors.
    pub(crate) fn commit_captures(&self, args: &[Value]) {
        self.pattern.commit(args);
    }

    /// Appends a response to the queue.
    pub fn push(&self, response: Response) {
        self.queue().push(response);
    }

    /// Consumes the next response.
    ///
    /// The queue lock is released before a compute function runs, so the
    /// function may call back into the same double.
    pub fn consume(&self, args: &[Value]) -> Outcome {
        Outcome::from_next(self.next_response(), args)
    }

    /// Advances the cursor and returns the response it pointed at.
    pub(crate) fn next_response(&self) -> Option<Response> {
        self.queue().next_response()
    }

    /// Number of configured responses.
    #[must_use]
    pub fn response_count(&self) -> usize {
        self.queue().len()
    }

    fn queue(&self) -> MutexGuard<'_, ResponseQueue> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("pattern", &self.pattern)
            .field("queue", &*self.queue())
            .finish()
    }
}

/// Fluent handle for appending responses to one binding.
///
/// # Example
/// ```rust,ignore
/// ctx.when(&spy)
///     .is_called_with(args![Matcher::capability(IsString)])
///     .then(|_| 1)
///     .then_return(2)
///     .then_throw(Thrown::msg("exhausted"));
/// ```
#[derive(Debug, Clone)]
pub struct BindingHandle {
    binding: Arc<Binding>,
}

impl BindingHandle {
    pub(crate) fn new(binding: Arc<Binding>) -> Self {
        Self { binding }
    }

    /// Appends a response computed from the call's arguments.
    pub fn then<F, R>(self, f: F) -> Self
    where
        F: Fn(&[Value]) -> R + Send + Sync + 'static,
        R: Into<Value>,
    {
        self.then_try(move |args| Ok(f(args)))
    }

    /// Appends a fallible computed response; an `Err` is raised at the call site.
    pub fn then_try<F, R>(self, f: F) -> Self
    where
        F: Fn(&[Value]) -> Result<R, Thrown> + Send + Sync + 'static,
        R: Into<Value>,
    {
        self.binding
            .push(Response::Compute(Arc::new(move |args: &[Value]| -> Result<Value, Thrown> {
                f(args).map(Into::into)
            })));
        self
    }

    /// Appends a fixed return value.
    pub fn then_return(self, value: impl Into<Value>) -> Self {
        self.binding.push(Response::Return(value.into()));
        self
    }

    /// Appends an error raised at the call site.
    pub fn then_throw(self, error: Thrown) -> Self {
        self.binding.push(Response::Throw(error));
        self
    }

    /// The underlying binding.
    #[must_use]
    pub fn binding(&self) -> &Arc<Binding> {
        &self.binding
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{args, captor};

    #[test]
    fn test_binding_id() {
        assert_ne!(BindingId::new(), BindingId::new());
    }

    #[test]
    fn test_binding_kinds() {
        let specific = Binding::specific(args!["foo"]);
        assert_eq!(specific.kind(), BindingKind::Specific);
        assert!(!specific.is_default());
        assert_eq!(specific.pattern().arity(), Some(1));

        let default = Binding::any_call();
        assert!(default.is_default());
        assert_eq!(format!("{}", default.kind()), "default");
    }

    #[test]
    fn test_matching_does_not_capture_until_commit() {
        let c = captor();
        let binding = Binding::specific(args!["foo", &c]);
        let args = [Value::from("foo"), Value::from(1)];
        assert!(binding.matches(&args).unwrap());
        assert!(c.is_empty());
        binding.commit_captures(&args);
        assert_eq!(c.values(), vec![Value::from(1)]);
    }

    #[test]
    fn test_handle_chains_in_order() {
        let handle = BindingHandle::new(Arc::new(Binding::any_call()))
            .then(|_| 1)
            .then_return(2)
            .then_throw(Thrown::msg("done"));
        let binding = Arc::clone(handle.binding());
        assert_eq!(binding.response_count(), 3);

        assert_eq!(binding.consume(&[]).into_result().unwrap(), Value::from(1));
        assert_eq!(binding.consume(&[]).into_result().unwrap(), Value::from(2));
        assert!(binding.consume(&[]).into_result().is_err());
        assert!(binding.consume(&[]).into_result().is_err());
    }

    #[test]
    fn test_then_try_error_is_raised() {
        let handle = BindingHandle::new(Arc::new(Binding::any_call()))
            .then_try(|_| Err::<Value, _>(Thrown::msg("nope")));
        let err = handle.binding().consume(&[]).into_result().unwrap_err();
        assert_eq!(err.to_string(), "nope");
    }

    #[test]
    fn test_empty_binding_consumes_empty() {
        let binding = Binding::specific(args![]);
        assert!(matches!(binding.consume(&[]), Outcome::Empty));
    }

    #[test]
    fn test_compute_may_reenter_binding() {
        let binding = Arc::new(Binding::any_call());
        let inner = Arc::clone(&binding);
        let handle = BindingHandle::new(Arc::clone(&binding))
            .then(move |_| inner.response_count() as i64);
        assert_eq!(
            handle.binding().consume(&[]).into_result().unwrap(),
            Value::from(1)
        );
    }
}
