//! Episode lifecycle, reward evaluation and early termination.

use std::path::PathBuf;

use mimic_body::KinematicsAdapter;
use mimic_reward::{AngleTargets, RewardBreakdown, RewardEngine, RewardInputs, joint_power_normed};
use mimic_trajectory::{DistributionTable, ReferenceTrajectory};
use mimic_types::{EpisodeStatus, Kinematics, observation};
use nalgebra::DVector;
use tracing::{debug, error};

use crate::config::TerminationConfig;
use crate::error::{EnvError, Result};
use crate::physics::Physics;

/// Why an episode ended early.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TerminationReason {
    /// COM height left the allowed band around the reference height.
    ComHeight,
    /// Sagittal trunk angle exceeded the limit.
    TrunkAngle,
    /// Imitation reward fell below the threshold.
    LowReward,
    /// A joint left its allowed deviation from the reference.
    Deviation,
    /// The state left the reference distribution.
    OutOfDistribution,
    /// The episode length limit was reached.
    EpisodeLimit,
}

/// Owns everything that is episode state in an imitation environment.
///
/// The controller binds a [`ReferenceTrajectory`] to a body model and a
/// [`RewardEngine`], and tracks whether the current episode has been
/// initialized from the reference. Before that, rewards report
/// [`UNINITIALIZED_SENTINEL`](mimic_types::UNINITIALIZED_SENTINEL) and no
/// termination check fires.
#[derive(Debug)]
pub struct EpisodeController {
    refs: ReferenceTrajectory,
    body: KinematicsAdapter,
    reward: RewardEngine,
    termination: TerminationConfig,
    suspended: bool,
    status: EpisodeStatus,
    playing_back: bool,
    joint_power_normed: f64,
    distribution: Option<DistributionTable>,
    distribution_path: Option<PathBuf>,
}

impl EpisodeController {
    /// Creates a controller in the uninitialized state.
    #[must_use]
    pub fn new(
        refs: ReferenceTrajectory,
        body: KinematicsAdapter,
        reward: RewardEngine,
        termination: TerminationConfig,
    ) -> Self {
        let suspended = reward.config().suspended;
        Self {
            refs,
            body,
            reward,
            termination,
            suspended,
            status: EpisodeStatus::default(),
            playing_back: false,
            joint_power_normed: 0.0,
            distribution: None,
            distribution_path: None,
        }
    }

    /// Uses an already loaded distribution table.
    #[must_use]
    pub fn with_distribution(mut self, table: DistributionTable) -> Self {
        self.distribution = Some(table);
        self
    }

    /// Loads the distribution table from `path` on first use.
    #[must_use]
    pub fn with_distribution_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.distribution_path = Some(path.into());
        self
    }

    /// Current episode status.
    #[must_use]
    pub const fn status(&self) -> EpisodeStatus {
        self.status
    }

    /// Reference trajectory.
    #[must_use]
    pub const fn refs(&self) -> &ReferenceTrajectory {
        &self.refs
    }

    /// Mutable reference trajectory.
    pub fn refs_mut(&mut self) -> &mut ReferenceTrajectory {
        &mut self.refs
    }

    /// Body model adapter.
    #[must_use]
    pub const fn body(&self) -> &KinematicsAdapter {
        &self.body
    }

    /// Reward engine.
    #[must_use]
    pub const fn reward_engine(&self) -> &RewardEngine {
        &self.reward
    }

    /// Termination thresholds.
    #[must_use]
    pub const fn termination(&self) -> &TerminationConfig {
        &self.termination
    }

    /// Normalized joint power measured in the last active step.
    #[must_use]
    pub const fn joint_power_normed(&self) -> f64 {
        self.joint_power_normed
    }

    /// Returns true while reference playback is running.
    #[must_use]
    pub const fn is_playing_back(&self) -> bool {
        self.playing_back
    }

    /// Marks the start of reference playback; suppresses early termination.
    pub fn begin_playback(&mut self) {
        self.playing_back = true;
    }

    /// Marks the end of reference playback.
    pub fn end_playback(&mut self) {
        self.playing_back = false;
    }

    /// Reference state initialization.
    ///
    /// Draws an anchor frame from the reference (randomly or at the first
    /// frame), drives the simulator to it, and verifies that the simulator
    /// reproduces the reference by requiring a near-perfect imitation
    /// reward. The reference is then advanced so the next comparison
    /// targets the following frame.
    ///
    /// # Errors
    ///
    /// Returns [`EnvError::InitializationMismatch`] if the reward right after
    /// initialization does not exceed the threshold; this means simulator
    /// and reference disagree and training cannot proceed. Also returns
    /// errors from the physics backend.
    pub fn initialize_episode<P: Physics>(
        &mut self,
        physics: &mut P,
        random: bool,
    ) -> Result<Kinematics> {
        self.status = EpisodeStatus::Active;
        self.joint_power_normed = 0.0;

        let anchor = if random {
            self.refs.random_init_state()
        } else {
            self.refs.deterministic_init_state()
        };
        self.body.check_dims(&anchor)?;

        let ctrl = self.body.actuated(&anchor.qpos);
        physics.set_ctrl(&ctrl)?;
        physics.set_kinematics(&anchor)?;

        let reward = self.imitation_reward(physics, None)?;
        let threshold = self.termination.init_threshold(self.suspended);
        if reward.is_nan() || reward <= threshold {
            error!(
                reward,
                threshold,
                cursor = ?self.refs.cursor(),
                "simulator does not reproduce the reference after state initialization"
            );
            return Err(EnvError::InitializationMismatch { reward, threshold });
        }

        let cursor = self.refs.cursor();
        self.refs.advance();
        debug!(
            step = cursor.step,
            position = cursor.position,
            reward,
            "episode initialized"
        );
        Ok(anchor)
    }

    /// Updates per-step bookkeeping after the simulator advanced.
    ///
    /// Measures the joint power and advances the reference. Returns `false`
    /// (and does nothing) before initialization.
    ///
    /// # Errors
    ///
    /// Returns an error if the physics backend reports inconsistent
    /// actuator dimensions.
    pub fn on_step<P: Physics>(&mut self, physics: &P) -> Result<bool> {
        if !self.status.is_active() {
            return Ok(false);
        }
        self.joint_power_normed = self.joint_power(physics)?;
        self.refs.advance();
        Ok(true)
    }

    /// Normalized mechanical power of the actuated joints.
    ///
    /// # Errors
    ///
    /// Returns an error on dimension mismatches.
    pub fn joint_power<P: Physics>(&self, physics: &P) -> Result<f64> {
        let qvel_actuated = self.body.actuated(&physics.qvel());
        let max_vels = self.body.model().max_actuator_velocities();
        let power = joint_power_normed(
            &physics.actuator_force(),
            &physics.actuator_force_range(),
            &qvel_actuated,
            &max_vels,
        )?;
        Ok(power)
    }

    /// Imitation reward of the current simulator state against the
    /// reference at the cursor.
    ///
    /// # Errors
    ///
    /// Returns an error on dimension mismatches or an out-of-range energy
    /// term.
    pub fn imitation_reward<P: Physics>(
        &self,
        physics: &P,
        targets: Option<AngleTargets<'_>>,
    ) -> Result<f64> {
        let state = physics.kinematics();
        let reference = self.refs.ref_kinematics();
        let inputs = RewardInputs {
            state: &state,
            reference: &reference,
            joint_power_normed: self.joint_power_normed,
            targets,
        };
        Ok(self.reward.imitation_reward(self.status, &inputs)?)
    }

    /// All reward terms of the current simulator state.
    ///
    /// # Errors
    ///
    /// See [`imitation_reward`](Self::imitation_reward).
    pub fn reward_breakdown<P: Physics>(
        &self,
        physics: &P,
        targets: Option<AngleTargets<'_>>,
    ) -> Result<RewardBreakdown> {
        let state = physics.kinematics();
        let reference = self.refs.ref_kinematics();
        let inputs = RewardInputs {
            state: &state,
            reference: &reference,
            joint_power_normed: self.joint_power_normed,
            targets,
        };
        Ok(self.reward.breakdown(&inputs)?)
    }

    /// Checks the falling and tracking criteria.
    ///
    /// Returns the first reason that applies, or `None` before
    /// initialization, during playback, or while the body is fine.
    #[must_use]
    pub fn termination_reason(
        &self,
        reward: f64,
        com_height: f64,
        trunk_angle: f64,
    ) -> Option<TerminationReason> {
        if !self.status.is_active() || self.playing_back {
            return None;
        }

        let desired_height = self.refs.com_height();
        let height_deviation = (desired_height - com_height).abs() / desired_height;
        if !self.suspended && height_deviation > self.termination.max_com_height_deviation {
            return Some(TerminationReason::ComHeight);
        }
        if trunk_angle.abs() > self.termination.max_trunk_angle {
            return Some(TerminationReason::TrunkAngle);
        }
        if reward < self.termination.reward_threshold {
            return Some(TerminationReason::LowReward);
        }
        None
    }

    /// Returns true if the episode should end early.
    ///
    /// See [`termination_reason`](Self::termination_reason).
    #[must_use]
    pub fn should_terminate(&self, reward: f64, com_height: f64, trunk_angle: f64) -> bool {
        self.termination_reason(reward, com_height, trunk_angle)
            .is_some()
    }

    fn distribution(&mut self) -> Result<&DistributionTable> {
        if self.distribution.is_none() {
            let path = self.distribution_path.as_ref().ok_or_else(|| {
                EnvError::DistributionUnavailable("no distribution table configured".to_string())
            })?;
            let table = DistributionTable::load(path)
                .map_err(|e| EnvError::DistributionUnavailable(e.to_string()))?;
            self.distribution = Some(table);
        }
        self.distribution.as_ref().ok_or_else(|| {
            EnvError::DistributionUnavailable("distribution table missing".to_string())
        })
    }

    /// Returns true if `state` is too far from the per-phase reference
    /// distribution.
    ///
    /// The state (without the forward COM position) is compared with the
    /// mean of the current step side at the cursor position. It is out of
    /// distribution when any of the leading checked channels deviates by
    /// more than the configured number of standard deviations. Positions
    /// past the table's step length use its last column.
    ///
    /// # Errors
    ///
    /// Returns [`EnvError::DistributionUnavailable`] if no table was given
    /// and none can be loaded.
    pub fn is_out_of_distribution(&mut self, state: &Kinematics) -> Result<bool> {
        let side = self.refs.step_side();
        let position = self.refs.cursor().position;
        let factor = self.termination.distribution_std_factor;
        let checked = self.termination.distribution_channels;

        let table = self.distribution()?;
        let mean = table.mean_at(side, position);
        let std = table.std_at(side, position);

        let obs = observation::compose(0.0, 0.0, state);
        let values = obs.rows(observation::HEADER_LEN, obs.len() - observation::HEADER_LEN);

        let n = checked.min(values.len()).min(mean.len().saturating_sub(1));
        let out = (0..n).any(|i| (mean[i + 1] - values[i]).abs() > factor * std[i + 1]);
        if out {
            debug!(?side, position, "state out of reference distribution");
        }
        Ok(out)
    }

    /// Returns true if a joint position or velocity deviates from the
    /// reference by more than a fraction of its reference range.
    ///
    /// `max_pos` and `max_vel` scale the dataset-wide `max - min` range of
    /// each joint; the trunk rotation range is widened further. Exceeding
    /// joints are logged at debug level.
    #[must_use]
    pub fn has_exceeded_deviations(&self, state: &Kinematics, max_pos: f64, max_vel: f64) -> bool {
        if !self.status.is_active() {
            return false;
        }

        let reference = self.refs.ref_kinematics();
        let (mut pos_ranges, mut vel_ranges) = self.refs.kinematic_ranges();
        let trunk = self.body.model().trunk_rotation_index();
        let scale = self.termination.trunk_range_scale;
        if trunk < pos_ranges.len() {
            pos_ranges[trunk] *= scale;
        }
        if trunk < vel_ranges.len() {
            vel_ranges[trunk] *= scale;
        }

        let pos_exceeded = exceeded(&state.qpos, &reference.qpos, &pos_ranges, max_pos);
        let vel_exceeded = exceeded(&state.qvel, &reference.qvel, &vel_ranges, max_vel);
        if pos_exceeded.is_empty() && vel_exceeded.is_empty() {
            return false;
        }

        let (pos_labels, vel_labels) = self.refs.labels_by_model_index(&pos_exceeded, &vel_exceeded);
        debug!(
            ticks = self.refs.ticks(),
            positions = ?pos_labels,
            velocities = ?vel_labels,
            "allowed deviation exceeded"
        );
        true
    }

    /// [`has_exceeded_deviations`](Self::has_exceeded_deviations) with the
    /// configured limits.
    #[must_use]
    pub fn has_exceeded_allowed_deviations(&self, state: &Kinematics) -> bool {
        self.has_exceeded_deviations(
            state,
            self.termination.max_pos_deviation,
            self.termination.max_vel_deviation,
        )
    }

    /// Ends the episode; the next one must be initialized again.
    pub fn close(&mut self) {
        self.status = EpisodeStatus::Uninitialized;
        self.playing_back = false;
        self.joint_power_normed = 0.0;
    }
}

fn exceeded(
    actual: &DVector<f64>,
    reference: &DVector<f64>,
    ranges: &DVector<f64>,
    fraction: f64,
) -> Vec<usize> {
    let len = actual.len().min(reference.len()).min(ranges.len());
    (0..len)
        .filter(|&i| (reference[i] - actual[i]).abs() > fraction * ranges[i])
        .collect()
}
