//! Canned responses and the queue that serves them.
//!
//! Responses are consumed in the order they were appended. Once the cursor
//! reaches the last entry, that entry repeats for every further call.

use std::fmt;
use std::sync::Arc;

use crate::error::Thrown;
use crate::value::Value;

/// Function computing a result from the call's arguments.
pub type ComputeFn = Arc<dyn Fn(&[Value]) -> Result<Value, Thrown> + Send + Sync>;

/// A single canned response.
#[derive(Clone)]
pub enum Response {
    /// Return the value as is.
    Return(Value),
    /// Raise the error at the call site.
    Throw(Thrown),
    /// Invoke the function with the call's arguments.
    Compute(ComputeFn),
}

impl Response {
    /// Produces the outcome of this response for one call.
    ///
    /// Compute functions run here, so callers must not hold any lock.
    #[must_use]
    pub fn produce(&self, args: &[Value]) -> Outcome {
        match self {
            Self::Return(v) => Outcome::Return(v.clone()),
            Self::Throw(err) => Outcome::Throw(err.clone()),
            Self::Compute(f) => match f(args) {
                Ok(v) => Outcome::ComputeResult(v),
                Err(err) => Outcome::Throw(err),
            },
        }
    }

    #[allow(missing_docs)]
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Return(_) => "return",
            Self::Throw(_) => "throw",
            Self::Compute(_) => "compute",
        }
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Return(v) => f.debug_tuple("Return").field(v).finish(),
            Self::Throw(err) => f.debug_tuple("Throw").field(err).finish(),
            Self::Compute(_) => f.write_str("Compute(..)"),
        }
    }
}

/// Result of consuming one response.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// A configured return value.
    Return(Value),
    /// A configured throw, or a compute function that failed.
    Throw(Thrown),
    /// Value returned by a compute function.
    ComputeResult(Value),
    /// The binding matched but has no responses.
    Empty,
}

impl Outcome {
    /// Produces the outcome of a dequeued response; `None` is [`Outcome::Empty`].
    ///
    /// Compute functions run here, so callers must not hold any lock.
    #[must_use]
    pub fn from_next(next: Option<Response>, args: &[Value]) -> Self {
        next.map_or(Self::Empty, |response| response.produce(args))
    }

    /// Converts into what the caller of the double observes.
    ///
    /// # Errors
    /// Returns the thrown error for [`Outcome::Throw`].
    pub fn into_result(self) -> Result<Value, Thrown> {
        match self {
            Self::Return(v) | Self::ComputeResult(v) => Ok(v),
            Self::Throw(err) => Err(err),
            Self::Empty => Ok(Value::Undefined),
        }
    }
}

/// Ordered responses with a read cursor.
#[derive(Debug, Clone, Default)]
pub struct ResponseQueue {
    entries: Vec<Response>,
    pos: usize,
}

impl ResponseQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a response.
    pub fn push(&mut self, response: Response) {
        self.entries.push(response);
    }

    /// Takes the response at the cursor and advances it.
    ///
    /// Reads are clamped to the last entry. Returns `None` for an empty queue.
    pub fn next_response(&mut self) -> Option<Response> {
        let last = self.entries.len().checked_sub(1)?;
        let response = self.entries[self.pos.min(last)].clone();
        self.pos = self.pos.saturating_add(1);
        Some(response)
    }

    /// Number of responses.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no response was configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// How many times the queue has been consumed.
    #[must_use]
    pub const fn consumed(&self) -> usize {
        self.pos
    }
}
