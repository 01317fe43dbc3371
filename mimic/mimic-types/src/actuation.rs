//! Actuator limits.

use serde::{Deserialize, Serialize};

/// Force (torque) range of a single actuator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForceRange {
    /// Lower force limit.
    pub lower: f64,
    /// Upper force limit.
    pub upper: f64,
}

impl ForceRange {
    /// Create a force range.
    #[must_use]
    pub const fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    /// Symmetric range `[-limit, limit]`.
    #[must_use]
    pub const fn symmetric(limit: f64) -> Self {
        Self {
            lower: -limit,
            upper: limit,
        }
    }

    /// Largest entry of the range, used as the peak actuator torque.
    #[must_use]
    pub fn peak(&self) -> f64 {
        self.lower.max(self.upper)
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn peak_is_row_maximum() {
        assert_eq!(ForceRange::symmetric(300.0).peak(), 300.0);
        assert_eq!(ForceRange::new(-50.0, 20.0).peak(), 20.0);
    }
}
