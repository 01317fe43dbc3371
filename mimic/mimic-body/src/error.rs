//! Error types for mimic-body crate.

use thiserror::Error;

/// Errors raised when kinematic vectors do not fit a body model.
#[derive(Debug, Error)]
pub enum BodyError {
    /// Vector length differs from what the body model declares.
    #[error("{what}: expected {expected} entries, got {actual}")]
    DimensionMismatch {
        /// Which vector was checked.
        what: &'static str,
        /// Length declared by the body model.
        expected: usize,
        /// Length received.
        actual: usize,
    },

    /// Body model declares inconsistent indices.
    #[error("invalid body model: {0}")]
    InvalidModel(String),
}

impl BodyError {
    /// Creates a dimension mismatch error.
    #[must_use]
    pub const fn dimension_mismatch(what: &'static str, expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch {
            what,
            expected,
            actual,
        }
    }

    /// Creates an invalid model error.
    #[must_use]
    pub fn invalid_model(reason: impl Into<String>) -> Self {
        Self::InvalidModel(reason.into())
    }
}

/// Result type for body operations.
pub type Result<T> = std::result::Result<T, BodyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = BodyError::dimension_mismatch("qpos", 9, 7);
        assert_eq!(err.to_string(), "qpos: expected 9 entries, got 7");

        let err = BodyError::invalid_model("index 12 out of range");
        assert!(err.to_string().contains("index 12"));
    }
}
