//! Call interception.
//!
//! The dispatcher is installed on a double and answers each call: the
//! resolved binding's next response if one matches, otherwise whatever the
//! double's fallback cell holds at that moment.

use std::sync::Arc;

use crate::double::FallbackCell;
use crate::error::CallResult;
use crate::registry::StubRegistry;
use crate::value::Value;

/// Answers calls to one double.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<StubRegistry>,
    fallback: FallbackCell,
}

impl Dispatcher {
    /// Binds a registry to the double's fallback cell.
    #[must_use]
    pub fn new(registry: Arc<StubRegistry>, fallback: FallbackCell) -> Self {
        Self { registry, fallback }
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn registry(&self) -> &Arc<StubRegistry> {
        &self.registry
    }

    /// Answers one call.
    ///
    /// # Errors
    /// - `CallError::Thrown` for a configured throw, a failing compute
    ///   response, or a failing fallback, each unchanged.
    /// - `CallError::Matcher` when a matcher fails under the propagate policy.
    pub fn dispatch(&self, args: &[Value]) -> CallResult {
        match self.registry.advance(args)? {
            Some(resolved) => Ok(resolved.produce(args).into_result()?),
            None => Ok(self.fallback.invoke(args)?),
        }
    }
}
