//! Matchers a third-party matcher library would provide.

#![allow(dead_code)]

use std::collections::BTreeMap;

use saywhen::{ArgumentMatcher, Matcher, MatcherError, Value};

/// Value kinds recognised by [`any`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    String,
    Number,
    Object,
    Array,
}

struct AnyOf(Kind);

impl ArgumentMatcher for AnyOf {
    fn matches(&self, value: &Value) -> Result<bool, MatcherError> {
        Ok(match self.0 {
            Kind::String => value.is_string(),
            Kind::Number => value.is_number(),
            // Arrays count as objects, as in most dynamic runtimes.
            Kind::Object => value.is_object() || value.is_array(),
            Kind::Array => value.is_array(),
        })
    }

    fn describe(&self) -> String {
        format!("any({:?})", self.0)
    }
}

/// Matches any value of the given kind.
pub fn any(kind: Kind) -> Matcher {
    Matcher::capability(AnyOf(kind))
}

struct ObjectContaining(BTreeMap<String, Value>);

impl ArgumentMatcher for ObjectContaining {
    fn matches(&self, value: &Value) -> Result<bool, MatcherError> {
        let Some(fields) = value.as_object() else {
            return Ok(false);
        };
        Ok(self
            .0
            .iter()
            .all(|(k, expected)| fields.get(k).is_some_and(|actual| expected.strict_eq(actual))))
    }

    fn describe(&self) -> String {
        "object_containing".to_string()
    }
}

/// Matches objects that contain every field of `shape` with an equal value.
pub fn object_containing(shape: serde_json::Value) -> Matcher {
    let Value::Object(fields) = Value::from(shape) else {
        panic!("object_containing expects a JSON object");
    };
    Matcher::capability(ObjectContaining(fields))
}

/// A matcher that cannot evaluate anything.
pub struct Broken;

impl ArgumentMatcher for Broken {
    fn matches(&self, value: &Value) -> Result<bool, MatcherError> {
        Err(MatcherError::failed("broken", value, "unsupported value"))
    }
}
