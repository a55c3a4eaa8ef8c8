//! Search configuration

use mosa_goal::Criterion;
use serde::{Deserialize, Serialize};

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML could not be decoded
    #[error("invalid TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON could not be decoded
    #[error("invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// No criterion is enabled
    #[error("at least one coverage criterion must be enabled")]
    NoCriteria,

    /// Exception coverage needs the class exception goals are attributed to
    #[error("exception coverage requires a target class")]
    MissingTargetClass,
}

/// Settings of one goal-selection run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Enabled coverage criteria
    pub criteria: Vec<Criterion>,
    /// Class exception goals are attributed to
    pub target_class: Option<String>,
    /// Verify archive partitions after every evaluation
    pub check_invariants: bool,
    /// Treat a run that covered no source line like a timed-out run
    pub skip_empty_traces: bool,
}

impl SearchConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With enabled criteria
    #[must_use]
    pub fn with_criteria(mut self, criteria: impl IntoIterator<Item = Criterion>) -> Self {
        self.criteria = criteria.into_iter().collect();
        self
    }

    /// With one more enabled criterion
    #[must_use]
    pub fn with_criterion(mut self, criterion: Criterion) -> Self {
        if !self.criteria.contains(&criterion) {
            self.criteria.push(criterion);
        }
        self
    }

    /// With target class for exception goals
    #[inline]
    #[must_use]
    pub fn with_target_class(mut self, class: impl Into<String>) -> Self {
        self.target_class = Some(class.into());
        self
    }

    /// With invariant checking after every evaluation
    #[inline]
    #[must_use]
    pub fn with_check_invariants(mut self, enabled: bool) -> Self {
        self.check_invariants = enabled;
        self
    }

    /// With skipping of runs that covered no line
    #[inline]
    #[must_use]
    pub fn with_skip_empty_traces(mut self, enabled: bool) -> Self {
        self.skip_empty_traces = enabled;
        self
    }

    /// Decode and validate a TOML document
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Decode and validate a JSON document
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Check settings that cannot be expressed in the type
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.criteria.is_empty() {
            return Err(ConfigError::NoCriteria);
        }
        if self.exception_coverage() && self.target_class.is_none() {
            return Err(ConfigError::MissingTargetClass);
        }
        Ok(())
    }

    /// Whether `criterion` is enabled
    #[inline]
    #[must_use]
    pub fn is_enabled(&self, criterion: Criterion) -> bool {
        self.criteria.contains(&criterion)
    }

    /// Whether raised exceptions are turned into goals
    #[inline]
    #[must_use]
    pub fn exception_coverage(&self) -> bool {
        self.is_enabled(Criterion::Exception)
    }

    /// Whether a mutation criterion is enabled
    #[inline]
    #[must_use]
    pub fn mutation_criterion(&self) -> bool {
        self.criteria.iter().any(|c| c.is_mutation())
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            criteria: vec![Criterion::Branch],
            target_class: None,
            check_invariants: false,
            skip_empty_traces: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_branch_only() {
        let config = SearchConfig::default();
        assert_eq!(config.criteria, vec![Criterion::Branch]);
        assert!(!config.exception_coverage());
        assert!(!config.mutation_criterion());
        config.validate().unwrap();
    }

    #[test]
    fn from_toml() {
        let config = SearchConfig::from_toml_str(
            r#"
            criteria = ["branch", "strong_mutation", "exception"]
            target_class = "com.acme.Stack"
            "#,
        )
        .unwrap();
        assert!(config.mutation_criterion());
        assert!(config.exception_coverage());
        assert_eq!(config.target_class.as_deref(), Some("com.acme.Stack"));
        assert!(!config.check_invariants);
    }

    #[test]
    fn from_json() {
        let config = SearchConfig::from_json_str(r#"{"criteria":["line"],"check_invariants":true}"#).unwrap();
        assert_eq!(config.criteria, vec![Criterion::Line]);
        assert!(config.check_invariants);
    }

    #[test]
    fn rejects_empty_criteria() {
        let err = SearchConfig::from_toml_str("criteria = []").unwrap_err();
        assert!(matches!(err, ConfigError::NoCriteria));
    }

    #[test]
    fn exception_coverage_needs_target_class() {
        let config = SearchConfig::new().with_criterion(Criterion::Exception);
        assert!(matches!(config.validate(), Err(ConfigError::MissingTargetClass)));
        config.with_target_class("Stack").validate().unwrap();
    }

    #[test]
    fn rejects_unknown_criterion() {
        let err = SearchConfig::from_json_str(r#"{"criteria":["dataflow"]}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn with_criterion_is_idempotent() {
        let config = SearchConfig::new()
            .with_criterion(Criterion::Branch)
            .with_criterion(Criterion::Line);
        assert_eq!(config.criteria, vec![Criterion::Branch, Criterion::Line]);
    }
}
