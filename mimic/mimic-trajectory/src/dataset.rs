//! Motion-capture dataset files.
//!
//! A dataset is a list of gait steps. Each step is a list of frames sampled at
//! a fixed rate, and each frame holds one value per recorded channel (COM
//! position, trunk orientation, joint angles, the matching velocities, and
//! any auxiliary channels such as foot positions or ground reaction forces).

use std::path::Path;

use mimic_types::StepSide;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TrajectoryError};

/// A single recorded gait step.
///
/// # Example
///
/// ```
/// use mimic_trajectory::MocapStep;
/// use mimic_types::StepSide;
///
/// let step = MocapStep::new(vec![vec![0.0, 1.0], vec![0.1, 1.0]]).with_side(StepSide::Right);
/// assert_eq!(step.len(), 2);
/// assert_eq!(step.channel_count(), Some(2));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MocapStep {
    /// Leading foot. Steps without a side alternate left/right.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub side: Option<StepSide>,

    /// Frames in time order, each with one value per channel.
    pub frames: Vec<Vec<f64>>,
}

impl MocapStep {
    /// Creates a step from its frames.
    #[must_use]
    pub const fn new(frames: Vec<Vec<f64>>) -> Self {
        Self { side: None, frames }
    }

    /// Sets the leading foot.
    #[must_use]
    pub const fn with_side(mut self, side: StepSide) -> Self {
        self.side = Some(side);
        self
    }

    /// Number of frames.
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Returns true if the step has no frames.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Channel count of the first frame.
    #[must_use]
    pub fn channel_count(&self) -> Option<usize> {
        self.frames.first().map(Vec::len)
    }
}

/// A motion-capture dataset of gait steps.
///
/// # Example
///
/// ```
/// use mimic_trajectory::{MocapDataset, MocapStep};
///
/// let steps = vec![
///     MocapStep::new(vec![vec![0.0; 4]; 10]),
///     MocapStep::new(vec![vec![0.0; 4]; 12]),
/// ];
/// let dataset = MocapDataset::new(400.0, steps);
/// assert!(dataset.validate().is_ok());
/// assert_eq!(dataset.total_frames(), 22);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MocapDataset {
    /// Sampling rate of the recording in Hz.
    pub sample_rate_hz: f64,

    /// Optional human-readable label per channel.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,

    /// Recorded steps.
    pub steps: Vec<MocapStep>,
}

impl MocapDataset {
    /// Creates a dataset without channel labels.
    #[must_use]
    pub const fn new(sample_rate_hz: f64, steps: Vec<MocapStep>) -> Self {
        Self {
            sample_rate_hz,
            labels: Vec::new(),
            steps,
        }
    }

    /// Sets the channel labels.
    #[must_use]
    pub fn with_labels<S: Into<String>>(mut self, labels: impl IntoIterator<Item = S>) -> Self {
        self.labels = labels.into_iter().map(Into::into).collect();
        self
    }

    /// Number of channels per frame (0 for an empty dataset).
    #[must_use]
    pub fn channel_count(&self) -> usize {
        self.steps
            .first()
            .and_then(MocapStep::channel_count)
            .unwrap_or(0)
    }

    /// Total number of frames across all steps.
    #[must_use]
    pub fn total_frames(&self) -> usize {
        self.steps.iter().map(MocapStep::len).sum()
    }

    /// Side of the step at `index`, falling back to alternation.
    #[must_use]
    pub fn side_of(&self, index: usize) -> StepSide {
        self.steps
            .get(index)
            .and_then(|step| step.side)
            .unwrap_or_else(|| StepSide::alternating(index))
    }

    /// Validates the dataset structure.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The sampling rate is not positive and finite
    /// - There are no steps, or a step has no frames
    /// - Frames differ in channel count
    /// - A value is not finite
    /// - Labels are given but do not match the channel count
    pub fn validate(&self) -> Result<()> {
        if !(self.sample_rate_hz.is_finite() && self.sample_rate_hz > 0.0) {
            return Err(TrajectoryError::invalid_dataset(format!(
                "sample rate must be positive, got {}",
                self.sample_rate_hz
            )));
        }

        if self.steps.is_empty() {
            return Err(TrajectoryError::invalid_dataset("dataset has no steps"));
        }

        let channels = self.channel_count();
        if channels == 0 {
            return Err(TrajectoryError::invalid_dataset("frames have no channels"));
        }

        for (i_step, step) in self.steps.iter().enumerate() {
            if step.is_empty() {
                return Err(TrajectoryError::invalid_dataset(format!(
                    "step {i_step} has no frames"
                )));
            }
            for (i_frame, frame) in step.frames.iter().enumerate() {
                if frame.len() != channels {
                    return Err(TrajectoryError::invalid_dataset(format!(
                        "step {i_step} frame {i_frame} has {} channels, expected {channels}",
                        frame.len()
                    )));
                }
                if frame.iter().any(|v| !v.is_finite()) {
                    return Err(TrajectoryError::invalid_dataset(format!(
                        "step {i_step} frame {i_frame} contains non-finite values"
                    )));
                }
            }
        }

        if !self.labels.is_empty() && self.labels.len() != channels {
            return Err(TrajectoryError::invalid_dataset(format!(
                "{} labels for {channels} channels",
                self.labels.len()
            )));
        }

        Ok(())
    }

    /// Serializes the dataset to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(TrajectoryError::from)
    }

    /// Deserializes and validates a dataset from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the dataset is invalid.
    pub fn from_json(json: &str) -> Result<Self> {
        let dataset: Self = serde_json::from_str(json)?;
        dataset.validate()?;
        Ok(dataset)
    }

    /// Loads and validates a dataset from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is invalid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let dataset = Self::from_json(&json)?;
        tracing::info!(
            "Loaded {} mocap steps ({} frames, {} channels) from {}",
            dataset.steps.len(),
            dataset.total_frames(),
            dataset.channel_count(),
            path.display()
        );
        Ok(dataset)
    }
}
