//! Registration entry point.
//!
//! A [`StubContext`] owns one registry per double and lives as long as the
//! test that uses it. Registering against a double for the first time
//! installs a dispatcher on it.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::binding::{Binding, BindingHandle};
use crate::config::StubConfig;
use crate::dispatcher::Dispatcher;
use crate::double::{Double, DoubleId};
use crate::matcher::Matcher;
use crate::registry::StubRegistry;

/// Owns the stub registries of every double it has touched.
///
/// # Example
/// ```
/// use saywhen::{args, values, Spy, StubContext, Value};
///
/// let ctx = StubContext::new();
/// let spy = Spy::new("lookup");
///
/// ctx.when(&spy).is_called_with(args!["foo"]).then_return("bar");
/// ctx.when(&spy).is_called().then_return("bing");
///
/// assert_eq!(spy.call(&values!["foo"]).unwrap(), Value::from("bar"));
/// assert_eq!(spy.call(&values!["baz"]).unwrap(), Value::from("bing"));
/// ```
#[derive(Debug, Default)]
pub struct StubContext {
    config: StubConfig,
    registries: RwLock<HashMap<DoubleId, Arc<StubRegistry>>>,
}

impl StubContext {
    /// Creates a context with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a context with `config`.
    #[must_use]
    pub fn with_config(config: StubConfig) -> Self {
        Self {
            config,
            registries: RwLock::new(HashMap::new()),
        }
    }

    #[allow(missing_docs)]
    #[must_use]
    pub const fn config(&self) -> &StubConfig {
        &self.config
    }

    /// Starts a registration against `double`.
    ///
    /// The first call for a double creates its registry and installs a
    /// dispatcher bound to the double's fallback cell.
    pub fn when<D: Double + ?Sized>(&self, double: &D) -> Registration {
        let id = double.id();
        let (registry, created) = {
            let mut registries = self
                .registries
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            match registries.get(&id) {
                Some(registry) => (Arc::clone(registry), false),
                None => {
                    let registry =
                        Arc::new(StubRegistry::new(id, self.config.clone()));
                    registries.insert(id, Arc::clone(&registry));
                    (registry, true)
                }
            }
        };

        if created {
            tracing::debug!(double = %id, "installing dispatcher");
            double.install(Dispatcher::new(Arc::clone(&registry), double.fallback_cell()));
        }

        Registration { registry }
    }

    /// The registry of `double`, if anything was registered for it.
    #[must_use]
    pub fn registry<D: Double + ?Sized>(&self, double: &D) -> Option<Arc<StubRegistry>> {
        self.registries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&double.id())
            .cloned()
    }

    /// Number of doubles with a registry.
    #[must_use]
    pub fn len(&self) -> usize {
        self.registries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns true if no double has been registered against.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every binding of every double.
    ///
    /// Dispatchers stay installed, so doubles fall through to their fallback
    /// until new bindings are registered.
    pub fn reset(&self) {
        let registries = self.registries.read().unwrap_or_else(PoisonError::into_inner);
        for registry in registries.values() {
            registry.clear();
        }
    }
}

/// Registration handle for one double.
#[derive(Debug, Clone)]
pub struct Registration {
    registry: Arc<StubRegistry>,
}

impl Registration {
    /// Appends a specific binding for calls whose leading arguments match
    /// `patterns` position by position.
    pub fn is_called_with<I>(&self, patterns: I) -> BindingHandle
    where
        I: IntoIterator,
        I::Item: Into<Matcher>,
    {
        let matchers = patterns.into_iter().map(Into::into).collect();
        BindingHandle::new(self.registry.register(Binding::specific(matchers)))
    }

    /// Appends a default binding that answers any call no specific binding
    /// answers.
    pub fn is_called(&self) -> BindingHandle {
        BindingHandle::new(self.registry.register(Binding::any_call()))
    }

    /// The registry bindings are appended to.
    #[must_use]
    pub fn registry(&self) -> &Arc<StubRegistry> {
        &self.registry
    }
}
