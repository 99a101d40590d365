//! The seam between the stubbing engine and a test double.
//!
//! The engine never creates doubles. It needs three things from one: a stable
//! identity, the cell holding its current fallback implementation, and a way
//! to install a [`Dispatcher`] that intercepts its calls.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dispatcher::Dispatcher;
use crate::error::Thrown;
use crate::response::ComputeFn;
use crate::value::Value;

/// Stable identity of a double.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DoubleId(Uuid);

impl DoubleId {
    /// Creates a new random double ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for DoubleId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DoubleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Shared, overwritable slot holding a double's native implementation.
///
/// The dispatcher reads this cell on every unmatched call, so replacing the
/// implementation after stubbing still takes effect.
#[derive(Clone, Default)]
pub struct FallbackCell(Arc<RwLock<Option<ComputeFn>>>);

impl FallbackCell {
    /// Creates an empty cell.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the implementation.
    pub fn set(&self, fallback: ComputeFn) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = Some(fallback);
    }

    /// Removes the implementation; unmatched calls then return `Undefined`.
    pub fn clear(&self) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// The implementation installed right now.
    #[must_use]
    pub fn current(&self) -> Option<ComputeFn> {
        self.0.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn is_set(&self) -> bool {
        self.0.read().unwrap_or_else(PoisonError::into_inner).is_some()
    }

    /// Runs the current implementation, or returns `Undefined` if there is none.
    ///
    /// # Errors
    /// Propagates the implementation's error unchanged.
    pub fn invoke(&self, args: &[Value]) -> Result<Value, Thrown> {
        match self.current() {
            Some(fallback) => fallback(args),
            None => Ok(Value::Undefined),
        }
    }
}

impl fmt::Debug for FallbackCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FallbackCell")
            .field("set", &self.is_set())
            .finish()
    }
}

/// A callable test double the engine can stub.
pub trait Double {
    /// Stable identity; clones of the same double must report the same id.
    fn id(&self) -> DoubleId;

    /// Handle to the cell holding the double's native implementation.
    fn fallback_cell(&self) -> FallbackCell;

    /// Routes every later call through `dispatcher`.
    fn install(&self, dispatcher: Dispatcher);
}
