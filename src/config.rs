//! Retry configuration loaded from data.
//!
//! Only fixed budgets can be described this way; predicates are code.
//!
//! ```rust
//! # #[cfg(feature = "serde")] {
//! use secondwind::config::RetryConfig;
//!
//! let config = RetryConfig::from_json(r#"{ "retries": 2 }"#).unwrap();
//! assert_eq!(config.policy().max(), 2);
//! # }
//! ```

use crate::error::{ConfigError, MAX_CONFIGURED_RETRIES};
use crate::policy::FixedRetries;
use crate::retry::Retry;

/// Declarative retry settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(deny_unknown_fields))]
pub struct RetryConfig {
    /// Retries after the first attempt.
    #[cfg_attr(feature = "serde", serde(default))]
    pub retries: usize,
}

impl RetryConfig {
    /// Config with a retry budget, validated against [`MAX_CONFIGURED_RETRIES`].
    pub fn new(retries: usize) -> Result<Self, ConfigError> {
        let config = Self { retries };
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a JSON document such as `{"retries": 3}`.
    #[cfg(feature = "serde")]
    pub fn from_json(input: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(input).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the budget bound.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.retries > MAX_CONFIGURED_RETRIES {
            return Err(ConfigError::TooManyRetries {
                requested: self.retries,
                max: MAX_CONFIGURED_RETRIES,
            });
        }
        Ok(())
    }

    /// Policy described by this config.
    pub fn policy(&self) -> FixedRetries {
        FixedRetries::new(self.retries)
    }

    /// Wrapping configuration using this budget.
    pub fn into_retry(self) -> Retry<FixedRetries> {
        Retry::new(self.policy())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_validates_budget() {
        assert_eq!(RetryConfig::new(3).unwrap().policy(), FixedRetries::new(3));
        let err = RetryConfig::new(MAX_CONFIGURED_RETRIES + 1).unwrap_err();
        assert!(err.is_too_many_retries());
    }

    #[test]
    fn default_is_single_attempt() {
        assert_eq!(RetryConfig::default().policy().max(), 0);
        assert_eq!(RetryConfig::default().into_retry().policy().max(), 0);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn parses_json() {
        assert_eq!(RetryConfig::from_json(r#"{"retries": 4}"#).unwrap().retries, 4);
        assert_eq!(RetryConfig::from_json("{}").unwrap().retries, 0);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn rejects_negative_and_unknown_fields() {
        assert!(matches!(
            RetryConfig::from_json(r#"{"retries": -1}"#),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            RetryConfig::from_json(r#"{"retries": 1, "delay": 5}"#),
            Err(ConfigError::Parse(_))
        ));
        assert!(RetryConfig::from_json(r#"{"retries": 2000000}"#)
            .unwrap_err()
            .is_too_many_retries());
    }
}
