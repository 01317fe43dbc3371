//! Imitation reward evaluation.

use mimic_body::{KinematicsAdapter, remove_rows, select_rows};
use mimic_trajectory::TrajectoryLayout;
use mimic_types::{EpisodeStatus, Kinematics, UNINITIALIZED_SENTINEL};
use nalgebra::DVector;
use tracing::debug;

use crate::config::{Aggregation, ComTarget, RewardConfig};
use crate::energy::energy_reward;
use crate::error::{Result, RewardError};
use crate::kernel::{DeviationKernel, DeviationScales};

/// Squared-error decay of the pose reward.
pub const POSE_DECAY: f64 = 4.0;
/// Squared-error decay of the velocity reward.
pub const VELOCITY_DECAY: f64 = 0.2;
/// Squared-error decay of the COM reward.
pub const COM_DECAY: f64 = 12.0;

/// Slack added to the reachable joint travel before a target counts as
/// unrealistic.
pub const ANGLE_DELTA_TOLERANCE: f64 = 0.01;
/// Reward factor applied when a joint target is unrealistic.
pub const UNREALISTIC_TARGET_FACTOR: f64 = 0.75;

/// Joint targets the policy sent, with the actuated joint angles at the
/// time they were sent.
#[derive(Debug, Clone, Copy)]
pub struct AngleTargets<'a> {
    /// Actuated joint angles before the step.
    pub qpos_actuated: &'a DVector<f64>,
    /// Desired actuated joint angles.
    pub targets: &'a DVector<f64>,
}

/// Everything one reward evaluation looks at.
#[derive(Debug, Clone, Copy)]
pub struct RewardInputs<'a> {
    /// Simulated kinematics.
    pub state: &'a Kinematics,
    /// Reference kinematics at the playback cursor.
    pub reference: &'a Kinematics,
    /// Normalized joint power of the last step.
    pub joint_power_normed: f64,
    /// Joint targets for the plausibility factor, if any were sent.
    pub targets: Option<AngleTargets<'a>>,
}

/// Individual reward terms of one evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RewardBreakdown {
    /// Pose sub-reward.
    pub pose: f64,
    /// Velocity sub-reward.
    pub velocity: f64,
    /// COM sub-reward.
    pub com: f64,
    /// Energy sub-reward (0 when its weight is 0).
    pub energy: f64,
    /// Target plausibility factor (1 when disabled).
    pub angle_factor: f64,
    /// Combined imitation reward.
    pub total: f64,
}

/// Scores how closely simulated kinematics follow the reference.
///
/// Reward forms are resolved once at construction; evaluation only does
/// arithmetic.
///
/// # Example
///
/// ```
/// use mimic_body::{KinematicsAdapter, Walker2d};
/// use mimic_reward::{RewardConfig, RewardEngine, RewardInputs};
/// use mimic_types::{EpisodeStatus, Kinematics};
///
/// let body = KinematicsAdapter::new(Walker2d::new())?;
/// let engine = RewardEngine::new(
///     RewardConfig::default(),
///     &body,
///     &Walker2d::trajectory_layout(),
///     None,
///     200.0,
/// )?;
///
/// let state = Kinematics::zeros(9, 9);
/// let inputs = RewardInputs {
///     state: &state,
///     reference: &state,
///     joint_power_normed: 0.0,
///     targets: None,
/// };
/// assert!((engine.imitation_reward(EpisodeStatus::Active, &inputs)? - 1.0).abs() < 1e-12);
/// assert_eq!(engine.imitation_reward(EpisodeStatus::Uninitialized, &inputs)?, -3.33);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct RewardEngine {
    config: RewardConfig,
    pose: DeviationKernel,
    velocity: DeviationKernel,
    com: DeviationKernel,
    compare_com_height_and_velocity: bool,
    com_indices: Vec<usize>,
    com_height_index: usize,
    com_velocity_index: usize,
    trunk_index: usize,
    nq: usize,
    nv: usize,
    max_qpos_deltas: DVector<f64>,
}

impl RewardEngine {
    /// Creates an engine for a body model.
    ///
    /// `channel_stds` (indexed by dataset channel) is required by the
    /// normalized deviation forms and ignored by the squared-error form.
    ///
    /// # Errors
    ///
    /// Returns an error if the config is invalid, a normalized form is
    /// requested without standard deviations, or the control frequency is
    /// not positive.
    pub fn new(
        config: RewardConfig,
        body: &KinematicsAdapter,
        layout: &TrajectoryLayout,
        channel_stds: Option<&DVector<f64>>,
        control_frequency: f64,
    ) -> Result<Self> {
        config.validate()?;
        if !(control_frequency.is_finite() && control_frequency > 0.0) {
            return Err(RewardError::invalid_config(format!(
                "control frequency must be positive, got {control_frequency}"
            )));
        }

        let scales = match (config.deviation.is_normalized(), channel_stds) {
            (true, Some(stds)) => Some(DeviationScales::from_channel_stds(
                stds,
                layout,
                body,
                config.com_target,
            )?),
            _ => None,
        };

        let pose = DeviationKernel::resolve(
            config.deviation,
            POSE_DECAY,
            scales.as_ref().map(|s| &s.pose),
        )?;
        let velocity = DeviationKernel::resolve(
            config.deviation,
            VELOCITY_DECAY,
            scales.as_ref().map(|s| &s.velocity),
        )?;
        let com = DeviationKernel::resolve(
            config.deviation,
            COM_DECAY,
            scales.as_ref().map(|s| &s.com),
        )?;

        let model = body.model();
        debug!(
            body = model.name(),
            deviation = ?config.deviation,
            aggregation = ?config.aggregation,
            weights = ?config.weights,
            normalized_by_stds = scales.is_some(),
            "reward engine configured"
        );
        Ok(Self {
            compare_com_height_and_velocity: config.deviation.is_normalized()
                && config.com_target == ComTarget::HeightAndForwardVelocity,
            com_indices: model.com_indices().to_vec(),
            com_height_index: layout.com_height_index,
            com_velocity_index: layout.com_velocity_index,
            trunk_index: model.trunk_rotation_index(),
            nq: model.qpos_dim(),
            nv: model.qvel_dim(),
            max_qpos_deltas: body.max_qpos_deltas(control_frequency, config.max_delta_scale),
            config,
            pose,
            velocity,
            com,
        })
    }

    /// The configuration the engine was built with.
    #[must_use]
    pub const fn config(&self) -> &RewardConfig {
        &self.config
    }

    /// Largest reachable change of each actuated joint per control period,
    /// already scaled by the configured delta scale.
    #[must_use]
    pub const fn max_qpos_deltas(&self) -> &DVector<f64> {
        &self.max_qpos_deltas
    }

    fn check_dims(&self, what: &'static str, kinematics: &Kinematics) -> Result<()> {
        RewardError::check_len(what, self.nq, kinematics.nq())?;
        RewardError::check_len(what, self.nv, kinematics.nv())
    }

    fn without_com(&self, values: &DVector<f64>, zero_trunk: bool) -> DVector<f64> {
        let mut values = values.clone();
        if zero_trunk && self.trunk_index < values.len() {
            values[self.trunk_index] = 0.0;
        }
        remove_rows(&values, &self.com_indices)
    }

    /// Pose sub-reward over the non-COM positions.
    ///
    /// # Errors
    ///
    /// Returns an error on a dimension mismatch.
    pub fn pose_reward(&self, state: &Kinematics, reference: &Kinematics) -> Result<f64> {
        let actual = self.without_com(&state.qpos, false);
        let target = self.without_com(&reference.qpos, self.config.suspended);
        self.pose.evaluate("pose", &actual, &target)
    }

    /// Velocity sub-reward over the non-COM velocities.
    ///
    /// # Errors
    ///
    /// Returns an error on a dimension mismatch.
    pub fn velocity_reward(&self, state: &Kinematics, reference: &Kinematics) -> Result<f64> {
        let actual = self.without_com(&state.qvel, false);
        let target = self.without_com(&reference.qvel, self.config.suspended);
        self.velocity.evaluate("velocity", &actual, &target)
    }

    fn com_quantities(&self, kinematics: &Kinematics) -> DVector<f64> {
        if self.compare_com_height_and_velocity {
            DVector::from_vec(vec![
                kinematics.qpos[self.com_height_index],
                kinematics.qvel[self.com_velocity_index],
            ])
        } else {
            select_rows(&kinematics.qpos, &self.com_indices)
        }
    }

    /// COM sub-reward.
    ///
    /// # Errors
    ///
    /// Returns an error on a dimension mismatch.
    pub fn com_reward(&self, state: &Kinematics, reference: &Kinematics) -> Result<f64> {
        self.check_dims("state", state)?;
        self.check_dims("reference", reference)?;
        self.com
            .evaluate("com", &self.com_quantities(state), &self.com_quantities(reference))
    }

    /// Plausibility factor of the policy's joint targets.
    ///
    /// Returns 1 while `qpos_actuated` is all zero (right after a reset),
    /// [`UNREALISTIC_TARGET_FACTOR`] if any joint was asked to move further
    /// than it can within one control period, and 1 otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if the vectors do not match the actuated joints.
    pub fn angle_deltas_reward(
        &self,
        qpos_actuated: &DVector<f64>,
        targets: &DVector<f64>,
    ) -> Result<f64> {
        RewardError::check_len("actuated qpos", self.max_qpos_deltas.len(), qpos_actuated.len())?;
        RewardError::check_len("joint targets", self.max_qpos_deltas.len(), targets.len())?;

        if qpos_actuated.iter().all(|q| *q == 0.0) {
            return Ok(1.0);
        }

        let unrealistic = (targets - qpos_actuated)
            .iter()
            .zip(self.max_qpos_deltas.iter())
            .any(|(delta, max)| delta.abs() > max + ANGLE_DELTA_TOLERANCE);

        Ok(if unrealistic {
            UNREALISTIC_TARGET_FACTOR
        } else {
            1.0
        })
    }

    /// Evaluates every reward term.
    ///
    /// # Errors
    ///
    /// Returns an error on a dimension mismatch or an out-of-bounds energy
    /// reward.
    pub fn breakdown(&self, inputs: &RewardInputs<'_>) -> Result<RewardBreakdown> {
        self.check_dims("state", inputs.state)?;
        self.check_dims("reference", inputs.reference)?;

        let weights = &self.config.weights;
        let pose = self.pose_reward(inputs.state, inputs.reference)?;
        let velocity = self.velocity_reward(inputs.state, inputs.reference)?;
        let com = self.com_reward(inputs.state, inputs.reference)?;
        let energy = if weights.energy > 0.0 {
            energy_reward(inputs.joint_power_normed)?
        } else {
            0.0
        };

        let combined = match self.config.aggregation {
            Aggregation::WeightedSum => {
                weights.pose * pose
                    + weights.velocity * velocity
                    + weights.com * com
                    + weights.energy * energy
            }
            Aggregation::PoseComProduct => pose.sqrt() * com.sqrt(),
        };

        let angle_factor = match (self.config.punish_unrealistic_targets, inputs.targets) {
            (true, Some(t)) => self.angle_deltas_reward(t.qpos_actuated, t.targets)?,
            _ => 1.0,
        };

        Ok(RewardBreakdown {
            pose,
            velocity,
            com,
            energy,
            angle_factor,
            total: combined * angle_factor,
        })
    }

    /// Imitation reward, or [`UNINITIALIZED_SENTINEL`] before the episode's
    /// state initialization.
    ///
    /// # Errors
    ///
    /// See [`breakdown`](Self::breakdown).
    pub fn imitation_reward(&self, status: EpisodeStatus, inputs: &RewardInputs<'_>) -> Result<f64> {
        if !status.is_active() {
            return Ok(UNINITIALIZED_SENTINEL);
        }
        Ok(self.breakdown(inputs)?.total)
    }
}
