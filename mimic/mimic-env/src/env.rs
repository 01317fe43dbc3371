//! Environment facade driving a physics backend with an episode controller.

use mimic_body::KinematicsAdapter;
use mimic_reward::{AngleTargets, RewardBreakdown, RewardEngine};
use mimic_trajectory::{ReferenceTrajectory, TrajectoryLayout, load_channel_stds};
use mimic_types::{Kinematics, UNINITIALIZED_SENTINEL, observation};
use nalgebra::DVector;
use tracing::{debug, info, warn};

use crate::config::{ActionSpaceMode, EnvConfig};
use crate::controller::{EpisodeController, TerminationReason};
use crate::error::{EnvError, Result};
use crate::monitor::EpisodeMonitor;
use crate::physics::Physics;

/// Scale of the foot-contact flags prepended to observations.
pub const CONTACT_FLAG_SCALE: f64 = 0.1;

/// Diagnostics returned with every step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepInfo {
    /// Gait phase used in the observation.
    pub phase: f64,
    /// Desired speed used in the observation.
    pub desired_speed: f64,
    /// Normalized joint power of the step.
    pub joint_power_normed: f64,
    /// Control steps since the last reset.
    pub episode_steps: usize,
    /// Why the episode ended, if it did.
    pub termination: Option<TerminationReason>,
}

/// Result of one control step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    /// Observation after the step.
    pub observation: DVector<f64>,
    /// Imitation reward.
    pub reward: f64,
    /// Whether the episode ended.
    pub done: bool,
    /// Diagnostics.
    pub info: StepInfo,
}

/// How reference playback drives the simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaybackMode {
    /// Write reference states straight into the simulator.
    Kinematic,
    /// Track the reference with the actuators' position servos.
    Servo,
}

/// Summary of a reference playback run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackReport {
    /// Control ticks played.
    pub ticks: usize,
    /// Mean imitation reward over the played ticks.
    pub mean_reward: f64,
    /// Episodes restarted during servo tracking.
    pub resets: usize,
}

/// Motion-imitation environment.
///
/// Couples a [`Physics`] backend with an [`EpisodeController`]. Actions are
/// joint-angle targets relative to the current actuated joint positions.
///
/// # Example
///
/// ```
/// use mimic_body::{KinematicsAdapter, Walker2d};
/// use mimic_env::{EnvConfig, KinematicPhysics, MimicEnv};
/// use mimic_trajectory::{MocapDataset, MocapStep, ReferenceTrajectory};
/// use mimic_types::ForceRange;
/// use nalgebra::DVector;
///
/// let frames = |n: usize| {
///     (0..n)
///         .map(|f| {
///             let mut frame = vec![0.0; 18];
///             frame[1] = 1.2;
///             frame[0] = 0.005 * f as f64;
///             frame[9] = 1.0;
///             frame
///         })
///         .collect::<Vec<_>>()
/// };
/// let dataset = MocapDataset::new(200.0, vec![MocapStep::new(frames(20)), MocapStep::new(frames(20))]);
/// let refs = ReferenceTrajectory::new(dataset, Walker2d::trajectory_layout())?;
/// let body = KinematicsAdapter::new(Walker2d::new())?;
/// let physics = KinematicPhysics::for_body(&Walker2d::new(), ForceRange::symmetric(100.0));
///
/// let mut env = MimicEnv::new(physics, refs, body, EnvConfig::default(), None)?;
/// let obs = env.reset()?;
/// assert_eq!(obs.len(), 2 + 8 + 9);
///
/// let outcome = env.step(&DVector::zeros(6))?;
/// assert!(outcome.reward > 0.0);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct MimicEnv<P: Physics> {
    physics: P,
    controller: EpisodeController,
    config: EnvConfig,
    control_frequency: f64,
    max_deltas: DVector<f64>,
    desired_speeds: Vec<f64>,
    speed_index: usize,
    episode_steps: usize,
    monitor: EpisodeMonitor,
}

impl<P: Physics> MimicEnv<P> {
    /// Creates an environment.
    ///
    /// The simulator timestep is set to `1 / sim_frequency_hz`, and the
    /// reference is strided so one control tick advances it by one control
    /// period.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, the simulator does
    /// not match the body model, or the reward cannot be built.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn new(
        mut physics: P,
        refs: ReferenceTrajectory,
        body: KinematicsAdapter,
        config: EnvConfig,
        channel_stds: Option<&DVector<f64>>,
    ) -> Result<Self> {
        config.validate()?;
        let model = body.model();
        let state = physics.kinematics();
        if state.nq() != model.qpos_dim() || state.nv() != model.qvel_dim() {
            return Err(EnvError::physics(format!(
                "simulator has ({}, {}) coordinates, {} expects ({}, {})",
                state.nq(),
                state.nv(),
                model.name(),
                model.qpos_dim(),
                model.qvel_dim()
            )));
        }
        if physics.actuator_force_range().len() != body.actuated_count() {
            return Err(EnvError::physics(format!(
                "simulator has {} actuators, {} expects {}",
                physics.actuator_force_range().len(),
                model.name(),
                body.actuated_count()
            )));
        }

        physics.set_timestep(1.0 / config.sim_frequency_hz);
        let control_frequency = config.control_frequency();

        let ratio = refs.sample_rate_hz() / control_frequency;
        let stride = ratio.round().max(1.0) as usize;
        if (ratio - stride as f64).abs() > 1e-6 {
            warn!(
                sample_rate = refs.sample_rate_hz(),
                control_frequency, stride, "reference rate is not a multiple of the control rate"
            );
        }
        let mut refs = refs.with_frame_stride(stride);
        if let Some(seed) = config.seed {
            refs = refs.with_seed(seed);
        }

        let engine = RewardEngine::new(
            config.reward.clone(),
            &body,
            refs.layout(),
            channel_stds,
            control_frequency,
        )?;
        let max_deltas = engine.max_qpos_deltas().clone();

        let mut controller = EpisodeController::new(refs, body, engine, config.termination);
        if let Some(path) = &config.distribution_path {
            controller = controller.with_distribution_path(path.clone());
        }

        info!(
            body = controller.body().model().name(),
            control_frequency,
            stride,
            steps = controller.refs().step_count(),
            "imitation environment ready"
        );

        Ok(Self {
            physics,
            controller,
            desired_speeds: config.desired_speeds.clone(),
            config,
            control_frequency,
            max_deltas,
            speed_index: 0,
            episode_steps: 0,
            monitor: EpisodeMonitor::new(),
        })
    }

    /// Creates an environment from the data files named in `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if no dataset path is configured or a file cannot
    /// be loaded.
    pub fn from_config(
        physics: P,
        body: KinematicsAdapter,
        layout: TrajectoryLayout,
        config: EnvConfig,
    ) -> Result<Self> {
        let dataset = config
            .dataset_path
            .as_ref()
            .ok_or_else(|| EnvError::invalid_config("no dataset path configured"))?;
        let refs = ReferenceTrajectory::load(dataset, layout)?;
        let stds = config
            .channel_stds_path
            .as_ref()
            .map(load_channel_stds)
            .transpose()?;
        Self::new(physics, refs, body, config, stds.as_ref())
    }

    /// Control frequency in Hz.
    #[must_use]
    pub const fn control_frequency(&self) -> f64 {
        self.control_frequency
    }

    /// Configuration.
    #[must_use]
    pub const fn config(&self) -> &EnvConfig {
        &self.config
    }

    /// Episode controller.
    #[must_use]
    pub const fn controller(&self) -> &EpisodeController {
        &self.controller
    }

    /// Mutable episode controller.
    pub fn controller_mut(&mut self) -> &mut EpisodeController {
        &mut self.controller
    }

    /// Physics backend.
    #[must_use]
    pub const fn physics(&self) -> &P {
        &self.physics
    }

    /// Mutable physics backend.
    pub fn physics_mut(&mut self) -> &mut P {
        &mut self.physics
    }

    /// Episode statistics.
    #[must_use]
    pub const fn monitor(&self) -> &EpisodeMonitor {
        &self.monitor
    }

    /// Control steps since the last reset.
    #[must_use]
    pub const fn episode_steps(&self) -> usize {
        self.episode_steps
    }

    /// Number of action entries (one per actuated joint).
    #[must_use]
    pub fn action_dim(&self) -> usize {
        self.max_deltas.len()
    }

    /// Symmetric lower and upper action bounds.
    #[must_use]
    pub fn action_bounds(&self) -> (DVector<f64>, DVector<f64>) {
        let high = match self.config.action_space {
            ActionSpaceMode::AngleDeltas => self.max_deltas.clone(),
            ActionSpaceMode::Normalized => DVector::from_element(self.max_deltas.len(), 1.0),
        };
        (-&high, high)
    }

    /// Number of observation entries.
    #[must_use]
    pub fn observation_dim(&self) -> usize {
        let model = self.controller.body().model();
        let contacts = if self.config.ground_contact_observation { 2 } else { 0 };
        contacts + observation::HEADER_LEN + model.qpos_dim().saturating_sub(1) + model.qvel_dim()
    }

    /// Cycles observations through the given desired speeds instead of
    /// the reference step velocity. An empty list turns speed control off.
    pub fn set_desired_speeds(&mut self, speeds: Vec<f64>) {
        self.desired_speeds = speeds;
        self.speed_index = 0;
    }

    fn forward_position(&self) -> f64 {
        self.physics.qpos().as_slice().first().copied().unwrap_or(0.0)
    }

    /// Starts a new episode from the reference and returns the first
    /// observation.
    ///
    /// Speed-controlled episodes always start at the first reference frame;
    /// otherwise the anchor is drawn randomly when `random_init` is set.
    ///
    /// # Errors
    ///
    /// Returns [`EnvError::InitializationMismatch`] if the simulator cannot
    /// reproduce the reference state, or a physics error.
    pub fn reset(&mut self) -> Result<DVector<f64>> {
        self.episode_steps = 0;
        let random = self.config.random_init && self.desired_speeds.is_empty();
        self.controller.initialize_episode(&mut self.physics, random)?;
        self.monitor.begin_episode(self.forward_position());
        Ok(self.observation())
    }

    /// Builds the current observation.
    ///
    /// Layout: optional scaled foot-contact flags `[left, right]`, then
    /// `[phase, desired_speed, qpos[1..], qvel]`. Before initialization,
    /// phase is 0 and the desired speed is the uninitialized sentinel.
    pub fn observation(&mut self) -> DVector<f64> {
        let (phase, speed) = self.phase_and_speed(true);
        let core = observation::compose(phase, speed, &self.physics.kinematics());
        if !self.config.ground_contact_observation {
            return core;
        }

        let contacts = self
            .controller
            .body()
            .model()
            .has_ground_contact(&self.physics.contacts());
        let [left, right] = contacts.as_flags();
        DVector::from_iterator(
            core.len() + 2,
            [left * CONTACT_FLAG_SCALE, right * CONTACT_FLAG_SCALE]
                .into_iter()
                .chain(core.iter().copied()),
        )
    }

    fn phase_and_speed(&mut self, advance_speed: bool) -> (f64, f64) {
        if !self.controller.status().is_active() {
            return (0.0, UNINITIALIZED_SENTINEL);
        }
        let refs = self.controller.refs();
        let speed = match self.desired_speeds.get(self.speed_index) {
            Some(&speed) => {
                if advance_speed {
                    self.speed_index = (self.speed_index + 1) % self.desired_speeds.len();
                }
                speed
            }
            None => refs.step_velocity(),
        };
        (refs.phase(), speed)
    }

    fn joint_targets(&self, action: &DVector<f64>) -> Result<(DVector<f64>, DVector<f64>)> {
        if action.len() != self.max_deltas.len() {
            return Err(EnvError::InvalidAction {
                expected: self.max_deltas.len(),
                actual: action.len(),
            });
        }
        let qpos_actuated = self.controller.body().actuated(&self.physics.qpos());
        let delta = match self.config.action_space {
            ActionSpaceMode::AngleDeltas => action.clone(),
            ActionSpaceMode::Normalized => action.component_mul(&self.max_deltas),
        };
        let targets = &qpos_actuated + delta;
        Ok((qpos_actuated, targets))
    }

    /// Applies an action for one control period.
    ///
    /// # Errors
    ///
    /// Returns an error if the action has the wrong length, the simulator
    /// fails, or the reward cannot be computed.
    pub fn step(&mut self, action: &DVector<f64>) -> Result<StepOutcome> {
        let (qpos_actuated, targets) = self.joint_targets(action)?;
        self.physics.set_ctrl(&targets)?;
        self.physics.step(self.config.frame_skip)?;
        let active = self.controller.on_step(&self.physics)?;

        let reward = self.controller.imitation_reward(
            &self.physics,
            Some(AngleTargets {
                qpos_actuated: &qpos_actuated,
                targets: &targets,
            }),
        )?;
        self.episode_steps += 1;

        let state = self.physics.kinematics();
        let termination = self.termination(reward, &state)?;
        let done = termination.is_some();
        if let Some(reason) = termination {
            debug!(?reason, steps = self.episode_steps, reward, "episode terminated");
        }

        let joint_power_normed = self.controller.joint_power_normed();
        if active {
            self.monitor
                .record_step(reward, joint_power_normed, self.forward_position());
            if done {
                self.monitor.end_episode();
            }
        }

        let (phase, desired_speed) = self.phase_and_speed(false);
        Ok(StepOutcome {
            observation: self.observation(),
            reward,
            done,
            info: StepInfo {
                phase,
                desired_speed,
                joint_power_normed,
                episode_steps: self.episode_steps,
                termination,
            },
        })
    }

    fn termination(&mut self, reward: f64, state: &Kinematics) -> Result<Option<TerminationReason>> {
        let model = self.controller.body().model();
        let com_height = state.qpos[model.com_height_index()];
        let trunk_angle = state.qpos[model.trunk_rotation_index()];
        if let Some(reason) = self
            .controller
            .termination_reason(reward, com_height, trunk_angle)
        {
            return Ok(Some(reason));
        }

        let checks = *self.controller.termination();
        let tracking = self.controller.status().is_active() && !self.controller.is_playing_back();
        if tracking && checks.check_deviations && self.controller.has_exceeded_allowed_deviations(state) {
            return Ok(Some(TerminationReason::Deviation));
        }
        if tracking && checks.check_distribution && self.controller.is_out_of_distribution(state)? {
            return Ok(Some(TerminationReason::OutOfDistribution));
        }
        if self.episode_steps >= self.config.max_episode_steps {
            return Ok(Some(TerminationReason::EpisodeLimit));
        }
        Ok(None)
    }

    /// All reward terms of the current state, without angle targets.
    ///
    /// # Errors
    ///
    /// Returns an error on dimension mismatches.
    pub fn reward_breakdown(&self) -> Result<RewardBreakdown> {
        self.controller.reward_breakdown(&self.physics, None)
    }

    /// Plays the reference trajectory back for `ticks` control ticks.
    ///
    /// Kinematic playback writes every reference frame into the simulator.
    /// Servo playback commands the actuated reference positions and lets
    /// the simulator track them, restarting the episode when it ends.
    /// Early termination is suppressed, and the environment is closed
    /// afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if initialization or the simulator fails.
    #[allow(clippy::cast_precision_loss)]
    pub fn play_reference(&mut self, ticks: usize, mode: PlaybackMode) -> Result<PlaybackReport> {
        self.controller.begin_playback();
        let result = self.run_playback(ticks, mode);
        self.close();
        let (reward_sum, resets) = result?;
        let mean_reward = if ticks == 0 { 0.0 } else { reward_sum / ticks as f64 };
        info!(ticks, ?mode, mean_reward, resets, "reference playback finished");
        Ok(PlaybackReport {
            ticks,
            mean_reward,
            resets,
        })
    }

    fn run_playback(&mut self, ticks: usize, mode: PlaybackMode) -> Result<(f64, usize)> {
        self.reset()?;
        let mut reward_sum = 0.0;
        let mut resets = 0;
        for _ in 0..ticks {
            match mode {
                PlaybackMode::Kinematic => {
                    self.controller.refs_mut().advance();
                    let reference = self.controller.refs().ref_kinematics();
                    self.physics.set_kinematics(&reference)?;
                    self.physics.forward();
                    reward_sum += self.controller.imitation_reward(&self.physics, None)?;
                }
                PlaybackMode::Servo => {
                    let targets = self
                        .controller
                        .body()
                        .actuated(&self.controller.refs().qpos());
                    let qpos_actuated = self.controller.body().actuated(&self.physics.qpos());
                    let delta = &targets - &qpos_actuated;
                    let action = match self.config.action_space {
                        ActionSpaceMode::AngleDeltas => delta,
                        ActionSpaceMode::Normalized => delta.component_div(&self.max_deltas),
                    };
                    let outcome = self.step(&action)?;
                    reward_sum += outcome.reward;
                    if outcome.done {
                        self.reset()?;
                        resets += 1;
                    }
                }
            }
        }
        Ok((reward_sum, resets))
    }

    /// Ends the current episode; the next [`reset`](Self::reset) starts over.
    pub fn close(&mut self) {
        self.controller.close();
        self.speed_index = 0;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp, clippy::cast_precision_loss)]
mod tests {
    use super::*;
    use crate::config::TerminationConfig;
    use crate::physics::KinematicPhysics;
    use approx::assert_relative_eq;
    use mimic_body::Walker2d;
    use mimic_trajectory::{MocapDataset, MocapStep};
    use mimic_types::{ForceRange, GeomContact};

    /// Walker moving forward at 1 m/s, sampled at 400 Hz, with gently
    /// swinging joints.
    fn dataset() -> MocapDataset {
        let step = |index: usize| {
            let frames = (0..40)
                .map(|f| {
                    let t = (index * 40 + f) as f64 / 400.0;
                    let mut frame = vec![0.0; 18];
                    frame[0] = t;
                    frame[1] = 1.2;
                    frame[9] = 1.0;
                    for joint in 3..9 {
                        frame[joint] = 0.05 * (t * 6.0 + joint as f64).sin();
                        frame[joint + 9] = 0.3 * (t * 6.0 + joint as f64).cos();
                    }
                    frame
                })
                .collect();
            MocapStep::new(frames)
        };
        MocapDataset::new(400.0, (0..4).map(step).collect())
            .with_labels(Walker2d::channel_labels())
    }

    fn env_with(config: EnvConfig) -> MimicEnv<KinematicPhysics> {
        let refs = ReferenceTrajectory::new(dataset(), Walker2d::trajectory_layout()).unwrap();
        let body = KinematicsAdapter::new(Walker2d::new()).unwrap();
        let physics = KinematicPhysics::for_body(&Walker2d::new(), ForceRange::symmetric(100.0));
        MimicEnv::new(physics, refs, body, config.with_seed(11), None).unwrap()
    }

    fn env() -> MimicEnv<KinematicPhysics> {
        env_with(EnvConfig::default())
    }

    #[test]
    fn timing() {
        let env = env();
        assert_eq!(env.control_frequency(), 200.0);
        assert_eq!(env.controller().refs().frame_stride(), 2);
        assert_relative_eq!(env.physics().timestep(), 0.001);
    }

    #[test]
    fn action_bounds() {
        let env = env();
        let (low, high) = env.action_bounds();
        assert_eq!(high.len(), 6);
        // 2 * 6 rad/s / 200 Hz
        assert_relative_eq!(high[0], 0.06, epsilon = 1e-12);
        assert_relative_eq!(low[1], -0.12, epsilon = 1e-12);

        let env = env_with(EnvConfig::default().with_action_space(ActionSpaceMode::Normalized));
        let (low, high) = env.action_bounds();
        assert!(high.iter().all(|v| *v == 1.0));
        assert!(low.iter().all(|v| *v == -1.0));
    }

    #[test]
    fn observation_before_reset() {
        let mut env = env();
        let obs = env.observation();
        assert_eq!(obs.len(), env.observation_dim());
        assert_eq!(obs[0], 0.0);
        assert_eq!(obs[1], UNINITIALIZED_SENTINEL);
    }

    #[test]
    fn reset_starts_active_episode() {
        let mut env = env();
        let obs = env.reset().unwrap();
        assert!(env.controller().status().is_active());
        assert_eq!(obs.len(), 19);
        assert!((0.0..1.0).contains(&obs[0]));
        assert_relative_eq!(obs[1], 1.0, epsilon = 1e-9);
    }

    #[test]
    fn ground_contact_prefix() {
        let mut env = env_with(EnvConfig::default().with_ground_contact_observation());
        env.physics_mut()
            .set_contacts(vec![GeomContact::new("foot_left_geom", "floor")]);
        env.reset().unwrap();
        let obs = env.observation();
        assert_eq!(obs.len(), 21);
        assert_eq!(env.observation_dim(), 21);
        assert_relative_eq!(obs[0], 0.1);
        assert_relative_eq!(obs[1], 0.0);
    }

    #[test]
    fn speed_control_cycles() {
        let mut env = env();
        env.set_desired_speeds(vec![0.5, 1.5]);
        env.reset().unwrap();
        assert_eq!(env.observation()[1], 1.5);
        assert_eq!(env.observation()[1], 0.5);
        assert_eq!(env.observation()[1], 1.5);
    }

    #[test]
    fn speed_control_starts_at_first_frame() {
        let mut deterministic = env_with(EnvConfig::default().with_deterministic_init());
        deterministic.reset().unwrap();
        let start = deterministic.controller().refs().cursor();

        let mut env = env();
        assert!(env.config().random_init);
        env.set_desired_speeds(vec![1.0]);
        for _ in 0..20 {
            env.reset().unwrap();
            assert_eq!(env.controller().refs().cursor(), start);
        }
    }

    #[test]
    fn step_rejects_wrong_action() {
        let mut env = env();
        env.reset().unwrap();
        let err = env.step(&DVector::zeros(5)).unwrap_err();
        assert!(matches!(err, EnvError::InvalidAction { expected: 6, actual: 5 }));
    }

    #[test]
    fn step_tracks_reference() {
        let mut env = env_with(EnvConfig::default().with_deterministic_init());
        env.reset().unwrap();
        let outcome = env.step(&DVector::zeros(6)).unwrap();
        assert!(!outcome.done);
        assert!(outcome.reward > 0.5, "reward {}", outcome.reward);
        assert_eq!(outcome.info.episode_steps, 1);
        assert_eq!(outcome.observation.len(), 19);
    }

    #[test]
    fn low_reward_terminates() {
        let termination = TerminationConfig::default().with_reward_threshold(1.5);
        let mut env = env_with(EnvConfig::default().with_termination(termination));
        env.reset().unwrap();
        let outcome = env.step(&DVector::zeros(6)).unwrap();
        assert!(outcome.done);
        assert_eq!(outcome.info.termination, Some(TerminationReason::LowReward));
        assert_eq!(env.monitor().episodes_completed(), 1);
    }

    #[test]
    fn episode_limit() {
        let mut env = env_with(EnvConfig::default().with_max_episode_steps(3));
        env.reset().unwrap();
        let zero = DVector::zeros(6);
        assert!(!env.step(&zero).unwrap().done);
        assert!(!env.step(&zero).unwrap().done);
        let outcome = env.step(&zero).unwrap();
        assert!(outcome.done);
        assert_eq!(outcome.info.termination, Some(TerminationReason::EpisodeLimit));
    }

    #[test]
    fn kinematic_playback_is_exact() {
        let mut env = env();
        let report = env.play_reference(50, PlaybackMode::Kinematic).unwrap();
        assert_eq!(report.ticks, 50);
        assert_relative_eq!(report.mean_reward, 1.0, epsilon = 1e-9);
        assert!(!env.controller().status().is_active());
        assert!(!env.controller().is_playing_back());
    }

    #[test]
    fn servo_playback_restarts_at_limit() {
        let mut env = env_with(EnvConfig::default().with_max_episode_steps(10));
        let report = env.play_reference(25, PlaybackMode::Servo).unwrap();
        assert_eq!(report.resets, 2);
        assert!(report.mean_reward > 0.0);
    }

    #[test]
    fn close_resets_status() {
        let mut env = env();
        env.reset().unwrap();
        env.close();
        assert!(!env.controller().status().is_active());
        assert_eq!(env.observation()[1], UNINITIALIZED_SENTINEL);
    }

    #[test]
    fn rejects_mismatched_simulator() {
        let refs = ReferenceTrajectory::new(dataset(), Walker2d::trajectory_layout()).unwrap();
        let body = KinematicsAdapter::new(Walker2d::new()).unwrap();
        let physics = KinematicPhysics::new(7, 7, vec![3, 4], vec![ForceRange::symmetric(1.0); 2]).unwrap();
        assert!(MimicEnv::new(physics, refs, body, EnvConfig::default(), None).is_err());
    }

    #[test]
    fn missing_dataset_path() {
        let body = KinematicsAdapter::new(Walker2d::new()).unwrap();
        let physics = KinematicPhysics::for_body(&Walker2d::new(), ForceRange::symmetric(100.0));
        let result = MimicEnv::from_config(physics, body, Walker2d::trajectory_layout(), EnvConfig::default());
        assert!(matches!(result, Err(EnvError::InvalidConfig(_))));
    }
}
