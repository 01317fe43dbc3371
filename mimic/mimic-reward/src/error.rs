//! Error types for mimic-reward crate.

use thiserror::Error;

/// Errors that can occur while configuring or evaluating rewards.
#[derive(Debug, Error)]
pub enum RewardError {
    /// Invalid reward configuration.
    #[error("invalid reward config: {0}")]
    InvalidConfig(String),

    /// Input vector has the wrong length.
    #[error("{what}: expected {expected} entries, got {actual}")]
    DimensionMismatch {
        /// Which input was checked.
        what: &'static str,
        /// Expected length.
        expected: usize,
        /// Actual length.
        actual: usize,
    },

    /// Energy reward left its valid range, meaning the joint power exceeded
    /// what the actuators can deliver or was not a number.
    #[error("energy reward should be at most 1 but was {0}")]
    EnergyOutOfBounds(f64),

    /// Parse error.
    #[error("parse error: {0}")]
    Parse(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(String),
}

impl RewardError {
    /// Creates an invalid config error.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig(reason.into())
    }

    /// Creates a dimension mismatch error.
    #[must_use]
    pub const fn dimension_mismatch(what: &'static str, expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch {
            what,
            expected,
            actual,
        }
    }

    /// Checks that `actual` equals `expected`.
    ///
    /// # Errors
    ///
    /// Returns [`RewardError::DimensionMismatch`] if the lengths differ.
    pub const fn check_len(what: &'static str, expected: usize, actual: usize) -> Result<()> {
        if expected == actual {
            Ok(())
        } else {
            Err(Self::dimension_mismatch(what, expected, actual))
        }
    }
}

impl From<std::io::Error> for RewardError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for RewardError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

/// Result type for reward operations.
pub type Result<T> = std::result::Result<T, RewardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = RewardError::invalid_config("weights sum to 0.9");
        assert!(err.to_string().contains("0.9"));

        let err = RewardError::EnergyOutOfBounds(1.5);
        assert!(err.to_string().contains("1.5"));
    }

    #[test]
    fn length_check() {
        assert!(RewardError::check_len("torques", 6, 6).is_ok());
        assert!(matches!(
            RewardError::check_len("torques", 6, 5),
            Err(RewardError::DimensionMismatch { expected: 6, actual: 5, .. })
        ));
    }
}
