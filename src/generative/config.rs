//! Configuration for static generative functions

use serde::{Deserialize, Serialize};

/// What to do when constraints or replayed choices name addresses that the
/// execution never visited
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstraintPolicy {
    /// Fail with `AddressNotFound`
    #[default]
    Error,
    /// Silently drop them, e.g. for addresses behind untaken branches
    Ignore,
}

/// Per-function configuration of a static generative function
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GenConfig {
    /// Policy for constraint addresses the execution does not reach
    pub unreached_constraints: ConstraintPolicy,
    /// Optional display name; defaults to the model's type name
    pub name: Option<String>,
}

impl GenConfig {
    /// Create a new configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the policy for unreached constraint addresses
    pub fn with_unreached_constraints(mut self, policy: ConstraintPolicy) -> Self {
        self.unreached_constraints = policy;
        self
    }

    /// Set the display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_strict() {
        let config = GenConfig::default();
        assert_eq!(config.unreached_constraints, ConstraintPolicy::Error);
        assert!(config.name.is_none());
    }

    #[test]
    fn test_builder() {
        let config = GenConfig::new()
            .with_unreached_constraints(ConstraintPolicy::Ignore)
            .with_name("coin");
        assert_eq!(config.unreached_constraints, ConstraintPolicy::Ignore);
        assert_eq!(config.name.as_deref(), Some("coin"));
    }

    #[test]
    fn test_serde_round_trip() {
        let config = GenConfig::new().with_name("model");
        let json = serde_json::to_string(&config).unwrap();
        let back: GenConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
