//! Error types for mimic-trajectory crate.

use thiserror::Error;

/// Errors that can occur while loading or querying reference trajectories.
#[derive(Debug, Error)]
pub enum TrajectoryError {
    /// Malformed motion-capture dataset.
    #[error("invalid dataset: {0}")]
    InvalidDataset(String),

    /// Channel layout does not fit the dataset.
    #[error("invalid layout: {0}")]
    InvalidLayout(String),

    /// Malformed distribution table.
    #[error("invalid distribution: {0}")]
    InvalidDistribution(String),

    /// Cursor position outside the recorded steps.
    #[error("cursor ({step}, {position}) out of range")]
    CursorOutOfRange {
        /// Requested step index.
        step: usize,
        /// Requested position within the step.
        position: usize,
    },

    /// Parse error.
    #[error("parse error: {0}")]
    Parse(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(String),
}

impl TrajectoryError {
    /// Creates an invalid dataset error.
    #[must_use]
    pub fn invalid_dataset(reason: impl Into<String>) -> Self {
        Self::InvalidDataset(reason.into())
    }

    /// Creates an invalid layout error.
    #[must_use]
    pub fn invalid_layout(reason: impl Into<String>) -> Self {
        Self::InvalidLayout(reason.into())
    }

    /// Creates an invalid distribution error.
    #[must_use]
    pub fn invalid_distribution(reason: impl Into<String>) -> Self {
        Self::InvalidDistribution(reason.into())
    }
}

impl From<std::io::Error> for TrajectoryError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for TrajectoryError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

/// Result type for trajectory operations.
pub type Result<T> = std::result::Result<T, TrajectoryError>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = TrajectoryError::invalid_dataset("no steps");
        assert!(err.to_string().contains("invalid dataset"));

        let err = TrajectoryError::CursorOutOfRange {
            step: 4,
            position: 300,
        };
        assert!(err.to_string().contains("(4, 300)"));
    }

    #[test]
    fn error_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.json");
        let err: TrajectoryError = io_err.into();
        assert!(matches!(err, TrajectoryError::Io(_)));
    }

    #[test]
    fn error_from_json_error() {
        let json_err = serde_json::from_str::<Vec<f64>>("[1.0,").unwrap_err();
        let err: TrajectoryError = json_err.into();
        assert!(matches!(err, TrajectoryError::Parse(_)));
    }
}
