//! A minimal spy: the double implementation shipped with the crate.
//!
//! A spy records the arguments of every call and answers through an
//! installed [`Dispatcher`], or through its fallback when nothing is installed.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Index;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use crate::dispatcher::Dispatcher;
use crate::double::{Double, DoubleId, FallbackCell};
use crate::error::{CallResult, Thrown};
use crate::value::Value;

struct SpyInner {
    id: DoubleId,
    name: String,
    calls: Mutex<Vec<Vec<Value>>>,
    fallback: FallbackCell,
    dispatcher: RwLock<Option<Dispatcher>>,
}

/// A callable test double.
///
/// Clones share identity, call history and stubbing.
#[derive(Clone)]
pub struct Spy {
    inner: Arc<SpyInner>,
}

impl Spy {
    /// Creates a spy with no fallback; every call returns `Undefined`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(SpyInner {
                id: DoubleId::new(),
                name: name.into(),
                calls: Mutex::new(Vec::new()),
                fallback: FallbackCell::new(),
                dispatcher: RwLock::new(None),
            }),
        }
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Invokes the spy.
    ///
    /// # Errors
    /// Returns whatever the installed dispatcher or the fallback raises.
    pub fn call(&self, args: &[Value]) -> CallResult {
        self.calls().push(args.to_vec());
        let dispatcher = self
            .inner
            .dispatcher
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match dispatcher {
            Some(dispatcher) => dispatcher.dispatch(args),
            None => Ok(self.inner.fallback.invoke(args)?),
        }
    }

    /// Replaces the native implementation with `f`.
    pub fn and_call_fake<F, R>(&self, f: F) -> &Self
    where
        F: Fn(&[Value]) -> R + Send + Sync + 'static,
        R: Into<Value>,
    {
        self.inner
            .fallback
            .set(Arc::new(move |args: &[Value]| -> Result<Value, Thrown> {
                Ok(f(args).into())
            }));
        self
    }

    /// Makes the native implementation return `value`.
    pub fn and_return_value(&self, value: impl Into<Value>) -> &Self {
        let value = value.into();
        self.inner
            .fallback
            .set(Arc::new(move |_: &[Value]| Ok(value.clone())));
        self
    }

    /// Makes the native implementation raise `error`.
    pub fn and_throw_error(&self, error: Thrown) -> &Self {
        self.inner
            .fallback
            .set(Arc::new(move |_: &[Value]| Err(error.clone())));
        self
    }

    /// Removes the native implementation.
    pub fn and_stub(&self) -> &Self {
        self.inner.fallback.clear();
        self
    }

    /// Arguments of every call so far, oldest first.
    #[must_use]
    pub fn all_args(&self) -> Vec<Vec<Value>> {
        self.calls().clone()
    }

    /// Arguments of the latest call.
    #[must_use]
    pub fn most_recent_args(&self) -> Option<Vec<Value>> {
        self.calls().last().cloned()
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls().len()
    }

    /// Forgets recorded calls; stubbing is untouched.
    pub fn reset_calls(&self) {
        self.calls().clear();
    }

    fn calls(&self) -> MutexGuard<'_, Vec<Vec<Value>>> {
        self.inner.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Double for Spy {
    fn id(&self) -> DoubleId {
        self.inner.id
    }

    fn fallback_cell(&self) -> FallbackCell {
        self.inner.fallback.clone()
    }

    fn install(&self, dispatcher: Dispatcher) {
        *self
            .inner
            .dispatcher
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(dispatcher);
    }
}

impl fmt::Debug for Spy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Spy")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .field("calls", &self.call_count())
            .field("fallback", &self.inner.fallback)
            .finish()
    }
}

/// A named collection of spies, one per method.
#[derive(Debug, Clone)]
pub struct SpyObj {
    name: String,
    methods: BTreeMap<String, Spy>,
}

impl SpyObj {
    /// Creates one spy per method name, named `"{name}.{method}"`.
    #[must_use]
    pub fn new<I, S>(name: impl Into<String>, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        let methods = methods
            .into_iter()
            .map(|method| {
                let method = method.into();
                let spy = Spy::new(format!("{name}.{method}"));
                (method, spy)
            })
            .collect();
        Self { name, methods }
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Looks up the spy for a method.
    #[must_use]
    pub fn method(&self, method: &str) -> Option<&Spy> {
        self.methods.get(method)
    }

    /// Method names, sorted.
    pub fn method_names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }
}

impl Index<&str> for SpyObj {
    type Output = Spy;

    /// # Panics
    /// Panics if the method does not exist.
    fn index(&self, method: &str) -> &Spy {
        match self.methods.get(method) {
            Some(spy) => spy,
            None => panic!("spy object '{}' has no method '{method}'", self.name),
        }
    }
}
