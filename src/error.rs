//! Error types owned by this crate.
//!
//! The retry loop itself never produces these: a wrapped call always fails with the error of
//! its last attempt. They only arise while building configuration.

/// Upper bound accepted for retry budgets read from configuration.
pub const MAX_CONFIGURED_RETRIES: usize = 1_000_000;

/// Errors produced while loading retry configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration document could not be parsed.
    #[error("invalid retry configuration: {0}")]
    Parse(String),
    /// The retry budget exceeds [`MAX_CONFIGURED_RETRIES`].
    #[error("retry budget {requested} exceeds the configurable maximum of {max}")]
    TooManyRetries {
        /// Budget found in the configuration.
        requested: usize,
        /// Largest accepted budget.
        max: usize,
    },
}

impl ConfigError {
    /// Check if this error came from an out-of-range budget.
    pub fn is_too_many_retries(&self) -> bool {
        matches!(self, Self::TooManyRetries { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn too_many_retries_display() {
        let err = ConfigError::TooManyRetries { requested: 2_000_000, max: MAX_CONFIGURED_RETRIES };
        let msg = err.to_string();
        assert!(msg.contains("2000000"));
        assert!(msg.contains("1000000"));
        assert!(err.is_too_many_retries());
    }

    #[test]
    fn parse_display() {
        let err = ConfigError::Parse("expected value at line 1".into());
        assert!(err.to_string().starts_with("invalid retry configuration"));
        assert!(!err.is_too_many_retries());
    }
}
