//! Deviation kernels: turning joint deviations into bounded sub-rewards.

use mimic_body::{KinematicsAdapter, remove_by_indices};
use mimic_trajectory::TrajectoryLayout;
use nalgebra::DVector;

use crate::config::{ComTarget, DeviationReward};
use crate::error::{Result, RewardError};

/// Decay of the exponential normalized form.
const NORMALIZED_DECAY: f64 = 2.5;

/// Per-channel deviation scales (two reference standard deviations) used by
/// the normalized reward forms.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviationScales {
    /// Scales of the non-COM positions.
    pub pose: DVector<f64>,
    /// Scales of the non-COM velocities.
    pub velocity: DVector<f64>,
    /// Scales of the compared COM quantities.
    pub com: DVector<f64>,
}

impl DeviationScales {
    /// Derives scales from dataset channel standard deviations.
    ///
    /// `stds` is indexed by dataset channel; `layout` maps model indices to
    /// channels and `body` tells which model indices are the COM.
    ///
    /// # Errors
    ///
    /// Returns an error if `stds` does not cover every referenced channel or
    /// a resulting scale is not positive.
    pub fn from_channel_stds(
        stds: &DVector<f64>,
        layout: &TrajectoryLayout,
        body: &KinematicsAdapter,
        com_target: ComTarget,
    ) -> Result<Self> {
        let widest = layout
            .qpos_indices
            .iter()
            .chain(&layout.qvel_indices)
            .max()
            .map_or(0, |&c| c + 1);
        if stds.len() < widest {
            return Err(RewardError::dimension_mismatch("channel stds", widest, stds.len()));
        }

        let com_indices = body.model().com_indices();
        let two_sigma = |channels: &[usize]| {
            DVector::from_iterator(channels.len(), channels.iter().map(|&c| 2.0 * stds[c]))
        };

        let pose = two_sigma(&remove_by_indices(&layout.qpos_indices, com_indices));
        let velocity = two_sigma(&remove_by_indices(&layout.qvel_indices, com_indices));
        let com = match com_target {
            ComTarget::Position => {
                let channels: Vec<usize> = com_indices
                    .iter()
                    .filter_map(|&i| layout.qpos_indices.get(i).copied())
                    .collect();
                two_sigma(&channels)
            }
            ComTarget::HeightAndForwardVelocity => {
                two_sigma(&[layout.com_height_channel(), layout.com_velocity_channel()])
            }
        };

        let scales = Self {
            pose,
            velocity,
            com,
        };
        scales.validate()?;
        Ok(scales)
    }

    fn validate(&self) -> Result<()> {
        let all = self.pose.iter().chain(&self.velocity).chain(&self.com);
        if let Some(bad) = all.copied().find(|s| !(s.is_finite() && *s > 0.0)) {
            return Err(RewardError::invalid_config(format!(
                "deviation scales must be positive, found {bad}"
            )));
        }
        Ok(())
    }
}

/// A deviation form resolved for one sub-reward.
#[derive(Debug, Clone)]
pub(crate) enum DeviationKernel {
    Squared { decay: f64 },
    Exponential { scales: DVector<f64> },
    Linear { scales: DVector<f64>, slope: f64 },
}

impl DeviationKernel {
    /// Resolves `form` for a sub-reward with the given squared-error decay
    /// and normalization scales.
    pub(crate) fn resolve(
        form: DeviationReward,
        decay: f64,
        scales: Option<&DVector<f64>>,
    ) -> Result<Self> {
        match (form, scales) {
            (DeviationReward::SquaredError, _) => Ok(Self::Squared { decay }),
            (DeviationReward::NormalizedExponential, Some(scales)) => Ok(Self::Exponential {
                scales: scales.clone(),
            }),
            (DeviationReward::NormalizedLinear { slope }, Some(scales)) => Ok(Self::Linear {
                scales: scales.clone(),
                slope: slope.factor(),
            }),
            (_, None) => Err(RewardError::invalid_config(
                "normalized deviation rewards need channel standard deviations",
            )),
        }
    }

    /// Sub-reward for the deviation between `actual` and `reference`.
    pub(crate) fn evaluate(
        &self,
        what: &'static str,
        actual: &DVector<f64>,
        reference: &DVector<f64>,
    ) -> Result<f64> {
        RewardError::check_len(what, reference.len(), actual.len())?;
        let delta = actual - reference;
        match self {
            Self::Squared { decay } => Ok((-decay * delta.norm_squared()).exp()),
            Self::Exponential { scales } => {
                let mean = normalized_mean(what, &delta, scales)?;
                Ok((-NORMALIZED_DECAY * mean).exp())
            }
            Self::Linear { scales, slope } => {
                let mean = normalized_mean(what, &delta, scales)?;
                Ok(1.0 - mean * slope)
            }
        }
    }
}

fn normalized_mean(what: &'static str, delta: &DVector<f64>, scales: &DVector<f64>) -> Result<f64> {
    RewardError::check_len(what, scales.len(), delta.len())?;
    if delta.is_empty() {
        return Ok(0.0);
    }
    Ok(delta.abs().component_div(scales).mean())
}
