//! Mapping between dataset channels and model-space joint vectors.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrajectoryError};

/// Maps a body model's `qpos`/`qvel` entries to dataset channels.
///
/// `qpos_indices[i]` is the dataset channel holding model position `i`;
/// likewise for velocities. The COM indices are model-space indices.
///
/// # Example
///
/// ```
/// use mimic_trajectory::TrajectoryLayout;
///
/// // 3 positions in channels 0..3, 3 velocities in channels 3..6
/// let layout = TrajectoryLayout::contiguous(3, 3);
/// assert_eq!(layout.qvel_indices, vec![3, 4, 5]);
/// assert!(layout.validate(6).is_ok());
/// assert!(layout.validate(5).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrajectoryLayout {
    /// Dataset channel per model position.
    pub qpos_indices: Vec<usize>,

    /// Dataset channel per model velocity.
    pub qvel_indices: Vec<usize>,

    /// Model position index of the vertical COM position.
    pub com_height_index: usize,

    /// Model velocity index of the forward COM velocity.
    pub com_velocity_index: usize,
}

impl TrajectoryLayout {
    /// Creates a layout with COM height at `qpos[1]` and forward COM
    /// velocity at `qvel[0]`.
    #[must_use]
    pub const fn new(qpos_indices: Vec<usize>, qvel_indices: Vec<usize>) -> Self {
        Self {
            qpos_indices,
            qvel_indices,
            com_height_index: 1,
            com_velocity_index: 0,
        }
    }

    /// Positions in channels `0..nq`, velocities in `nq..nq + nv`.
    #[must_use]
    pub fn contiguous(nq: usize, nv: usize) -> Self {
        Self::new((0..nq).collect(), (nq..nq + nv).collect())
    }

    /// Sets the model position index of the COM height.
    #[must_use]
    pub const fn with_com_height_index(mut self, index: usize) -> Self {
        self.com_height_index = index;
        self
    }

    /// Sets the model velocity index of the forward COM velocity.
    #[must_use]
    pub const fn with_com_velocity_index(mut self, index: usize) -> Self {
        self.com_velocity_index = index;
        self
    }

    /// Number of model positions.
    #[must_use]
    pub fn nq(&self) -> usize {
        self.qpos_indices.len()
    }

    /// Number of model velocities.
    #[must_use]
    pub fn nv(&self) -> usize {
        self.qvel_indices.len()
    }

    /// Dataset channel of the COM height.
    #[must_use]
    pub fn com_height_channel(&self) -> usize {
        self.qpos_indices[self.com_height_index]
    }

    /// Dataset channel of the forward COM velocity.
    #[must_use]
    pub fn com_velocity_channel(&self) -> usize {
        self.qvel_indices[self.com_velocity_index]
    }

    /// Validates the layout against a dataset's channel count.
    ///
    /// # Errors
    ///
    /// Returns an error if a channel index or COM index is out of range.
    pub fn validate(&self, channel_count: usize) -> Result<()> {
        if self.qpos_indices.is_empty() || self.qvel_indices.is_empty() {
            return Err(TrajectoryError::invalid_layout(
                "qpos and qvel indices must not be empty",
            ));
        }

        if let Some(&bad) = self
            .qpos_indices
            .iter()
            .chain(&self.qvel_indices)
            .find(|&&c| c >= channel_count)
        {
            return Err(TrajectoryError::invalid_layout(format!(
                "channel {bad} out of range for {channel_count} channels"
            )));
        }

        if self.com_height_index >= self.nq() {
            return Err(TrajectoryError::invalid_layout(format!(
                "COM height index {} out of range for {} positions",
                self.com_height_index,
                self.nq()
            )));
        }

        if self.com_velocity_index >= self.nv() {
            return Err(TrajectoryError::invalid_layout(format!(
                "COM velocity index {} out of range for {} velocities",
                self.com_velocity_index,
                self.nv()
            )));
        }

        Ok(())
    }
}
