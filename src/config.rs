//! Stub context configuration.

use serde::{Deserialize, Serialize};

/// What happens when a capability matcher fails while evaluating an argument.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatcherFailurePolicy {
    /// The binding is treated as not matching and resolution moves on.
    #[default]
    NonMatch,
    /// The call fails with `CallError::Matcher`.
    Propagate,
}

/// Configuration shared by every registry a `StubContext` creates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StubConfig {
    /// Policy for failing capability matchers.
    pub matcher_failure: MatcherFailurePolicy,
}

impl StubConfig {
    /// Sets the matcher failure policy.
    #[must_use]
    pub const fn with_matcher_failure(mut self, policy: MatcherFailurePolicy) -> Self {
        self.matcher_failure = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_is_non_match() {
        assert_eq!(StubConfig::default().matcher_failure, MatcherFailurePolicy::NonMatch);
    }

    #[test]
    fn test_config_from_json() {
        let cfg: StubConfig = serde_json::from_str(r#"{"matcher_failure":"propagate"}"#).unwrap();
        assert_eq!(cfg.matcher_failure, MatcherFailurePolicy::Propagate);

        let empty: StubConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, StubConfig::default());
    }

    #[test]
    fn test_with_matcher_failure() {
        let cfg = StubConfig::default().with_matcher_failure(MatcherFailurePolicy::Propagate);
        assert_eq!(cfg.matcher_failure, MatcherFailurePolicy::Propagate);
    }
}
