//! Error types for mimic-env crate.

use thiserror::Error;

/// Errors that can occur while running imitation episodes.
#[derive(Debug, Error)]
pub enum EnvError {
    /// Invalid environment configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The imitation reward right after state initialization was too low,
    /// meaning simulator and reference disagree about the initial state.
    #[error("reward should be around 1 after state initialization, but was {reward} (threshold {threshold})")]
    InitializationMismatch {
        /// Reward measured after initialization.
        reward: f64,
        /// Threshold it had to exceed.
        threshold: f64,
    },

    /// Out-of-distribution check requested without a distribution table.
    #[error("trajectory distribution unavailable: {0}")]
    DistributionUnavailable(String),

    /// Action has the wrong length.
    #[error("action has {actual} entries, expected {expected}")]
    InvalidAction {
        /// Number of actuated joints.
        expected: usize,
        /// Entries received.
        actual: usize,
    },

    /// Physics backend failure.
    #[error("physics error: {0}")]
    Physics(String),

    /// Reference trajectory failure.
    #[error("trajectory error: {0}")]
    Trajectory(#[from] mimic_trajectory::TrajectoryError),

    /// Body model failure.
    #[error("body model error: {0}")]
    Body(#[from] mimic_body::BodyError),

    /// Reward failure.
    #[error("reward error: {0}")]
    Reward(#[from] mimic_reward::RewardError),

    /// Parse error.
    #[error("parse error: {0}")]
    Parse(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(String),
}

impl EnvError {
    /// Creates an invalid configuration error.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig(reason.into())
    }

    /// Creates a physics error.
    #[must_use]
    pub fn physics(reason: impl Into<String>) -> Self {
        Self::Physics(reason.into())
    }

    /// Returns true if the error means training must stop rather than
    /// reset and continue.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::InitializationMismatch { .. } | Self::InvalidConfig(_) | Self::Body(_)
        )
    }
}

impl From<std::io::Error> for EnvError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for EnvError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

/// Result type for environment operations.
pub type Result<T> = std::result::Result<T, EnvError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = EnvError::InitializationMismatch {
            reward: 0.4,
            threshold: 0.95,
        };
        assert!(err.to_string().contains("0.4"));
        assert!(err.is_fatal());

        let err = EnvError::InvalidAction {
            expected: 6,
            actual: 5,
        };
        assert_eq!(err.to_string(), "action has 5 entries, expected 6");
        assert!(!err.is_fatal());
    }

    #[test]
    fn wraps_lower_errors() {
        let err: EnvError = mimic_reward::RewardError::EnergyOutOfBounds(2.0).into();
        assert!(matches!(err, EnvError::Reward(_)));

        let err: EnvError = std::io::Error::new(std::io::ErrorKind::NotFound, "missing").into();
        assert!(matches!(err, EnvError::Io(_)));
    }
}
