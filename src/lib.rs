//! # saywhen - Conditional Stubbing for Test Doubles
//!
//! saywhen gives a test double argument-dependent, stateful behavior. Each
//! call is matched against registered bindings; the most specific matching
//! binding answers from its queue of canned responses, and captors record the
//! arguments they matched for later assertions.
//!
//! ## Core Concepts
//!
//! - **Matcher**: decides whether a single argument matches (literal, loose,
//!   predicate, external capability, captor)
//! - **Binding**: an argument pattern with an ordered, repeating response queue
//! - **StubRegistry**: per-double bindings; specific bindings beat the default one
//! - **Dispatcher**: answers calls, falling through to the double's live fallback
//! - **Captor**: records every argument it matched, in call order
//!
//! ## Usage
//!
//! ```rust
//! use saywhen::{args, captor, values, Spy, StubContext, Thrown, Value};
//!
//! let ctx = StubContext::new();
//! let spy = Spy::new("fetch");
//! let ids = captor();
//!
//! ctx.when(&spy)
//!     .is_called_with(args!["user", &ids])
//!     .then(|args| format!("user-{}", args[1]))
//!     .then_throw(Thrown::msg("rate limited"));
//! ctx.when(&spy).is_called().then_return(Value::Null);
//!
//! assert_eq!(spy.call(&values!["user", 7]).unwrap(), Value::from("user-7"));
//! assert!(spy.call(&values!["user", 8]).is_err());
//! assert_eq!(spy.call(&values!["group", 9]).unwrap(), Value::Null);
//! assert_eq!(ids.values(), values![7, 8]);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Engine
pub mod binding;
pub mod captor;
pub mod dispatcher;
pub mod matcher;
pub mod registry;
pub mod response;

// Surface
pub mod config;
pub mod context;
pub mod double;
pub mod error;
pub mod spy;
pub mod value;

// Re-export primary types at crate root for convenience
pub use binding::{Binding, BindingHandle, BindingId, BindingKind};
pub use captor::{captor, captor_matching, Captor};
pub use config::{MatcherFailurePolicy, StubConfig};
pub use context::{Registration, StubContext};
pub use dispatcher::Dispatcher;
pub use double::{Double, DoubleId, FallbackCell};
pub use error::{CallError, CallResult, MatcherError, Thrown};
pub use matcher::{is, ArgPattern, ArgumentMatcher, Matcher, Predicate};
pub use registry::{Resolved, StubRegistry};
pub use response::{ComputeFn, Outcome, Response, ResponseQueue};
pub use spy::{Spy, SpyObj};
pub use value::Value;
