//! Per-phase state distribution of the reference steps.
//!
//! The table stores, for left and right steps separately, the mean and
//! standard deviation of every channel at every in-step position. Episode
//! controllers use it to detect states that drift far outside the recorded
//! motion.

use std::path::Path;

use mimic_types::StepSide;
use nalgebra::{DMatrix, DVector};
use serde::Deserialize;

use crate::error::{Result, TrajectoryError};

/// Mean and standard deviation matrices of one step side
/// (`channels x positions`).
#[derive(Debug, Clone, PartialEq)]
pub struct SideDistribution {
    /// Per-channel, per-position mean.
    pub means: DMatrix<f64>,
    /// Per-channel, per-position standard deviation.
    pub stds: DMatrix<f64>,
}

impl SideDistribution {
    /// Creates a side distribution.
    ///
    /// # Errors
    ///
    /// Returns an error if the matrices differ in shape, are empty, or a
    /// standard deviation is negative or non-finite.
    pub fn new(means: DMatrix<f64>, stds: DMatrix<f64>) -> Result<Self> {
        if means.shape() != stds.shape() {
            return Err(TrajectoryError::invalid_distribution(format!(
                "means {:?} and stds {:?} differ in shape",
                means.shape(),
                stds.shape()
            )));
        }
        if means.is_empty() {
            return Err(TrajectoryError::invalid_distribution(
                "distribution has no entries",
            ));
        }
        if stds.iter().any(|s| !s.is_finite() || *s < 0.0) {
            return Err(TrajectoryError::invalid_distribution(
                "standard deviations must be finite and non-negative",
            ));
        }
        Ok(Self { means, stds })
    }

    /// Number of channels.
    #[must_use]
    pub fn channel_count(&self) -> usize {
        self.means.nrows()
    }

    /// Number of in-step positions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.means.ncols()
    }

    /// Returns true if the distribution holds no positions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.means.is_empty()
    }
}

/// Left and right step distributions.
///
/// # Example
///
/// ```
/// use mimic_trajectory::DistributionTable;
/// use mimic_types::StepSide;
///
/// let json = r#"{
///     "means_left":  [[0.0, 0.1, 0.2]],
///     "stds_left":   [[1.0, 1.0, 1.0]],
///     "means_right": [[0.0, 0.1]],
///     "stds_right":  [[1.0, 1.0]]
/// }"#;
/// let table = DistributionTable::from_json(json)?;
/// assert_eq!(table.step_len(), 2);
/// // Positions past the shortest side are clamped
/// assert_eq!(table.clamp_position(7), 1);
/// assert_eq!(table.mean_at(StepSide::Left, 7)[0], 0.1);
/// # Ok::<(), mimic_trajectory::TrajectoryError>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DistributionTable {
    left: SideDistribution,
    right: SideDistribution,
}

#[derive(Deserialize)]
struct DistributionFile {
    means_left: Vec<Vec<f64>>,
    stds_left: Vec<Vec<f64>>,
    means_right: Vec<Vec<f64>>,
    stds_right: Vec<Vec<f64>>,
}

impl DistributionTable {
    /// Creates a table from both sides.
    ///
    /// # Errors
    ///
    /// Returns an error if the sides differ in channel count.
    pub fn new(left: SideDistribution, right: SideDistribution) -> Result<Self> {
        if left.channel_count() != right.channel_count() {
            return Err(TrajectoryError::invalid_distribution(format!(
                "left side has {} channels, right side {}",
                left.channel_count(),
                right.channel_count()
            )));
        }
        Ok(Self { left, right })
    }

    /// Number of usable positions: the shorter of both sides.
    #[must_use]
    pub fn step_len(&self) -> usize {
        self.left.len().min(self.right.len())
    }

    /// Number of channels.
    #[must_use]
    pub fn channel_count(&self) -> usize {
        self.left.channel_count()
    }

    /// Clamps an in-step position to the last usable table column.
    #[must_use]
    pub fn clamp_position(&self, position: usize) -> usize {
        let last = self.step_len() - 1;
        if position > last {
            tracing::trace!("distribution position {position} clamped to {last}");
        }
        position.min(last)
    }

    /// Distribution of one step side.
    #[must_use]
    pub const fn side(&self, side: StepSide) -> &SideDistribution {
        match side {
            StepSide::Left => &self.left,
            StepSide::Right => &self.right,
        }
    }

    /// Channel means at a (clamped) position.
    #[must_use]
    pub fn mean_at(&self, side: StepSide, position: usize) -> DVector<f64> {
        let column = self.clamp_position(position);
        self.side(side).means.column(column).into_owned()
    }

    /// Channel standard deviations at a (clamped) position.
    #[must_use]
    pub fn std_at(&self, side: StepSide, position: usize) -> DVector<f64> {
        let column = self.clamp_position(position);
        self.side(side).stds.column(column).into_owned()
    }

    /// Parses a table from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the matrices are
    /// inconsistent.
    pub fn from_json(json: &str) -> Result<Self> {
        let file: DistributionFile = serde_json::from_str(json)?;
        let left = SideDistribution::new(
            channel_major(&file.means_left, "means_left")?,
            channel_major(&file.stds_left, "stds_left")?,
        )?;
        let right = SideDistribution::new(
            channel_major(&file.means_right, "means_right")?,
            channel_major(&file.stds_right, "stds_right")?,
        )?;
        Self::new(left, right)
    }

    /// Loads a table from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is invalid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let table = Self::from_json(&json)?;
        tracing::info!(
            "Loaded trajectory distribution ({} channels, {} positions) from {}",
            table.channel_count(),
            table.step_len(),
            path.display()
        );
        Ok(table)
    }
}

fn channel_major(rows: &[Vec<f64>], name: &str) -> Result<DMatrix<f64>> {
    let positions = rows.first().map_or(0, Vec::len);
    if rows.iter().any(|row| row.len() != positions) {
        return Err(TrajectoryError::invalid_distribution(format!(
            "{name} rows differ in length"
        )));
    }
    Ok(DMatrix::from_fn(rows.len(), positions, |c, p| rows[c][p]))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    const TABLE: &str = r#"{
        "means_left":  [[0.0, 1.0, 2.0, 3.0], [10.0, 11.0, 12.0, 13.0]],
        "stds_left":   [[0.5, 0.5, 0.5, 0.5], [1.0, 1.0, 1.0, 1.0]],
        "means_right": [[-0.0, -1.0, -2.0], [-10.0, -11.0, -12.0]],
        "stds_right":  [[0.25, 0.25, 0.25], [2.0, 2.0, 2.0]]
    }"#;

    #[test]
    fn parses_channel_major_matrices() {
        let table = DistributionTable::from_json(TABLE).unwrap();
        assert_eq!(table.channel_count(), 2);
        assert_eq!(table.side(StepSide::Left).len(), 4);
        assert_eq!(table.side(StepSide::Right).len(), 3);
        assert_eq!(table.step_len(), 3);
    }

    #[test]
    fn selects_side() {
        let table = DistributionTable::from_json(TABLE).unwrap();
        assert_eq!(table.mean_at(StepSide::Left, 1)[1], 11.0);
        assert_eq!(table.mean_at(StepSide::Right, 1)[1], -11.0);
        assert_eq!(table.std_at(StepSide::Right, 0)[0], 0.25);
    }

    #[test]
    fn clamps_to_shortest_side() {
        let table = DistributionTable::from_json(TABLE).unwrap();
        // Left has a fourth column, but the table stops at the right side's length
        assert_eq!(table.mean_at(StepSide::Left, 3)[0], 2.0);
        assert_eq!(table.mean_at(StepSide::Left, 100)[0], 2.0);
        assert_eq!(table.clamp_position(0), 0);
    }

    #[test]
    fn rejects_shape_mismatch() {
        let json = r#"{
            "means_left":  [[0.0, 1.0]],
            "stds_left":   [[0.5]],
            "means_right": [[0.0]],
            "stds_right":  [[0.5]]
        }"#;
        let err = DistributionTable::from_json(json).unwrap_err();
        assert!(matches!(err, TrajectoryError::InvalidDistribution(_)));
    }

    #[test]
    fn rejects_ragged_rows() {
        let json = r#"{
            "means_left":  [[0.0, 1.0], [0.0]],
            "stds_left":   [[0.5, 0.5], [0.5, 0.5]],
            "means_right": [[0.0], [0.0]],
            "stds_right":  [[0.5], [0.5]]
        }"#;
        assert!(DistributionTable::from_json(json).is_err());
    }

    #[test]
    fn rejects_negative_std() {
        let json = r#"{
            "means_left":  [[0.0]],
            "stds_left":   [[-0.5]],
            "means_right": [[0.0]],
            "stds_right":  [[0.5]]
        }"#;
        assert!(DistributionTable::from_json(json).is_err());
    }

    #[test]
    fn rejects_channel_mismatch_between_sides() {
        let json = r#"{
            "means_left":  [[0.0], [0.0]],
            "stds_left":   [[0.5], [0.5]],
            "means_right": [[0.0]],
            "stds_right":  [[0.5]]
        }"#;
        assert!(DistributionTable::from_json(json).is_err());
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("distribution.json");
        std::fs::write(&path, TABLE).unwrap();
        let table = DistributionTable::load(&path).unwrap();
        assert_eq!(table.step_len(), 3);
    }
}
