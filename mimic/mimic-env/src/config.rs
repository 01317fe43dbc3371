//! Environment configuration.

use std::path::{Path, PathBuf};

use mimic_reward::RewardConfig;
use serde::{Deserialize, Serialize};

use crate::error::{EnvError, Result};

/// Configuration of an imitation environment.
///
/// # Example
///
/// ```
/// use mimic_env::EnvConfig;
///
/// let config = EnvConfig::default();
/// assert_eq!(config.sim_frequency_hz, 1000.0);
/// assert_eq!(config.frame_skip, 5);
/// assert!((config.control_frequency() - 200.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvConfig {
    /// Physics integration frequency in Hz.
    pub sim_frequency_hz: f64,

    /// Physics steps per control step.
    pub frame_skip: usize,

    /// Reward configuration.
    pub reward: RewardConfig,

    /// Early termination configuration.
    pub termination: TerminationConfig,

    /// How actions are interpreted.
    pub action_space: ActionSpaceMode,

    /// Prefix observations with scaled foot-contact flags.
    pub ground_contact_observation: bool,

    /// Body is suspended in the air for debugging (trunk fixed).
    pub suspended: bool,

    /// Draw initial states randomly from the reference (otherwise start at
    /// the first frame). Ignored under speed control, which always starts at
    /// the first frame.
    pub random_init: bool,

    /// Episode length limit in control steps.
    pub max_episode_steps: usize,

    /// Desired walking speeds cycled through when speed control is on.
    /// Empty means the reference speed is used.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub desired_speeds: Vec<f64>,

    /// Seed of the initial-state sampler.
    pub seed: Option<u64>,

    /// Mocap dataset file.
    pub dataset_path: Option<PathBuf>,

    /// Channel standard deviation file for reward normalization.
    pub channel_stds_path: Option<PathBuf>,

    /// Distribution table file for out-of-distribution checks.
    pub distribution_path: Option<PathBuf>,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            sim_frequency_hz: 1000.0,
            frame_skip: 5,
            reward: RewardConfig::default(),
            termination: TerminationConfig::default(),
            action_space: ActionSpaceMode::default(),
            ground_contact_observation: false,
            suspended: false,
            random_init: true,
            max_episode_steps: 3000,
            desired_speeds: Vec::new(),
            seed: None,
            dataset_path: None,
            channel_stds_path: None,
            distribution_path: None,
        }
    }
}

impl EnvConfig {
    /// Control frequency in Hz.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn control_frequency(&self) -> f64 {
        self.sim_frequency_hz / self.frame_skip as f64
    }

    /// Sets simulation frequency and frame skip.
    #[must_use]
    pub const fn with_timing(mut self, sim_frequency_hz: f64, frame_skip: usize) -> Self {
        self.sim_frequency_hz = sim_frequency_hz;
        self.frame_skip = frame_skip;
        self
    }

    /// Sets the reward configuration.
    #[must_use]
    pub fn with_reward(mut self, reward: RewardConfig) -> Self {
        self.reward = reward;
        self
    }

    /// Sets the termination configuration.
    #[must_use]
    pub const fn with_termination(mut self, termination: TerminationConfig) -> Self {
        self.termination = termination;
        self
    }

    /// Sets the action space mode.
    #[must_use]
    pub const fn with_action_space(mut self, mode: ActionSpaceMode) -> Self {
        self.action_space = mode;
        self
    }

    /// Enables foot-contact observations.
    #[must_use]
    pub const fn with_ground_contact_observation(mut self) -> Self {
        self.ground_contact_observation = true;
        self
    }

    /// Suspends the body; also relaxes the reward accordingly.
    #[must_use]
    pub const fn with_suspended(mut self, suspended: bool) -> Self {
        self.suspended = suspended;
        self.reward.suspended = suspended;
        self
    }

    /// Starts every episode at the first reference frame.
    #[must_use]
    pub const fn with_deterministic_init(mut self) -> Self {
        self.random_init = false;
        self
    }

    /// Sets the episode length limit.
    #[must_use]
    pub const fn with_max_episode_steps(mut self, steps: usize) -> Self {
        self.max_episode_steps = steps;
        self
    }

    /// Sets the sampler seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets the mocap dataset file.
    #[must_use]
    pub fn with_dataset_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.dataset_path = Some(path.into());
        self
    }

    /// Sets the channel standard deviation file.
    #[must_use]
    pub fn with_channel_stds_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.channel_stds_path = Some(path.into());
        self
    }

    /// Sets the distribution table file.
    #[must_use]
    pub fn with_distribution_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.distribution_path = Some(path.into());
        self
    }

    /// Validates the configuration.
    ///
    /// Returns `true` if all values are valid.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid value.
    pub fn validate(&self) -> Result<()> {
        if !(self.sim_frequency_hz.is_finite() && self.sim_frequency_hz > 0.0) {
            return Err(EnvError::invalid_config(format!(
                "simulation frequency must be positive, got {}",
                self.sim_frequency_hz
            )));
        }
        if self.frame_skip == 0 {
            return Err(EnvError::invalid_config("frame skip must be at least 1"));
        }
        if self.max_episode_steps == 0 {
            return Err(EnvError::invalid_config("episode length limit must be at least 1"));
        }
        if self.desired_speeds.iter().any(|s| !s.is_finite()) {
            return Err(EnvError::invalid_config("desired speeds must be finite"));
        }
        if self.suspended != self.reward.suspended {
            return Err(EnvError::invalid_config(
                "suspended mode must match between environment and reward",
            ));
        }
        self.reward.validate()?;
        self.termination.validate()
    }

    /// Parses and validates a configuration from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the config is invalid.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serializes the configuration to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(EnvError::from)
    }

    /// Loads a configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is invalid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

/// Early termination thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminationConfig {
    /// Terminate when the reward drops below this value.
    pub reward_threshold: f64,

    /// Allowed COM height deviation as a fraction of the reference height.
    pub max_com_height_deviation: f64,

    /// Allowed absolute sagittal trunk angle in radians.
    pub max_trunk_angle: f64,

    /// Reward the initial state must exceed.
    pub init_reward_threshold: f64,

    /// Reward the initial state must exceed when suspended.
    pub suspended_init_reward_threshold: f64,

    /// Terminate when a position deviates by more than this fraction of
    /// its reference range.
    pub max_pos_deviation: f64,

    /// Terminate when a velocity deviates by more than this multiple of
    /// its reference range.
    pub max_vel_deviation: f64,

    /// Range multiplier for the trunk rotation channel.
    pub trunk_range_scale: f64,

    /// Standard deviations a state may be off the per-phase mean.
    pub distribution_std_factor: f64,

    /// Number of leading state channels checked against the distribution.
    pub distribution_channels: usize,

    /// Also terminate on range deviations.
    pub check_deviations: bool,

    /// Also terminate when out of the reference distribution.
    pub check_distribution: bool,
}

impl Default for TerminationConfig {
    fn default() -> Self {
        Self {
            reward_threshold: 0.05,
            max_com_height_deviation: 0.4,
            max_trunk_angle: 0.7,
            init_reward_threshold: 0.95,
            suspended_init_reward_threshold: 0.5,
            max_pos_deviation: 0.5,
            max_vel_deviation: 2.0,
            trunk_range_scale: 5.0,
            distribution_std_factor: 3.0,
            distribution_channels: 9,
            check_deviations: false,
            check_distribution: false,
        }
    }
}

impl TerminationConfig {
    /// Enables range-deviation termination.
    #[must_use]
    pub const fn with_deviation_check(mut self) -> Self {
        self.check_deviations = true;
        self
    }

    /// Enables out-of-distribution termination.
    #[must_use]
    pub const fn with_distribution_check(mut self) -> Self {
        self.check_distribution = true;
        self
    }

    /// Sets the reward threshold.
    #[must_use]
    pub const fn with_reward_threshold(mut self, threshold: f64) -> Self {
        self.reward_threshold = threshold;
        self
    }

    /// Reward threshold right after initialization.
    #[must_use]
    pub const fn init_threshold(&self, suspended: bool) -> f64 {
        if suspended {
            self.suspended_init_reward_threshold
        } else {
            self.init_reward_threshold
        }
    }

    /// Validates the thresholds.
    ///
    /// # Errors
    ///
    /// Returns an error if a fraction or multiplier is not positive.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("COM height deviation", self.max_com_height_deviation),
            ("trunk angle", self.max_trunk_angle),
            ("position deviation", self.max_pos_deviation),
            ("velocity deviation", self.max_vel_deviation),
            ("trunk range scale", self.trunk_range_scale),
            ("distribution std factor", self.distribution_std_factor),
        ];
        if let Some((name, value)) = positive
            .iter()
            .find(|(_, v)| !(v.is_finite() && *v > 0.0))
        {
            return Err(EnvError::invalid_config(format!(
                "{name} limit must be positive, got {value}"
            )));
        }
        if !self.reward_threshold.is_finite() {
            return Err(EnvError::invalid_config("reward threshold must be finite"));
        }
        Ok(())
    }
}

/// How policy actions map to joint targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ActionSpaceMode {
    /// Actions are joint-angle deltas bounded by the reachable travel per
    /// control period.
    #[default]
    AngleDeltas,
    /// Actions lie in `[-1, 1]` and are scaled by the same bound.
    Normalized,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = EnvConfig::default();
        assert!(config.is_valid());
        assert_eq!(config.control_frequency(), 200.0);
        assert!(config.random_init);
        assert_eq!(config.termination.reward_threshold, 0.05);
    }

    #[test]
    fn init_thresholds() {
        let termination = TerminationConfig::default();
        assert_eq!(termination.init_threshold(false), 0.95);
        assert_eq!(termination.init_threshold(true), 0.5);
    }

    #[test]
    fn suspended_sets_reward_mode() {
        let config = EnvConfig::default().with_suspended(true);
        assert!(config.reward.suspended);
        assert!(config.is_valid());

        let mut config = EnvConfig::default();
        config.suspended = true;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(!EnvConfig::default().with_timing(1000.0, 0).is_valid());
        assert!(!EnvConfig::default().with_timing(-1.0, 5).is_valid());
        assert!(!EnvConfig::default().with_max_episode_steps(0).is_valid());

        let mut termination = TerminationConfig::default();
        termination.max_trunk_angle = 0.0;
        assert!(termination.validate().is_err());
    }

    #[test]
    fn json_roundtrip() {
        let config = EnvConfig::default()
            .with_action_space(ActionSpaceMode::Normalized)
            .with_ground_contact_observation()
            .with_seed(3)
            .with_dataset_path("data/walk.json");
        let json = config.to_json().unwrap();
        assert_eq!(EnvConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn partial_json() {
        let config = EnvConfig::from_json(
            r#"{ "frame_skip": 2, "termination": { "check_deviations": true } }"#,
        )
        .unwrap();
        assert_eq!(config.frame_skip, 2);
        assert!(config.termination.check_deviations);
        assert_eq!(config.termination.max_trunk_angle, 0.7);
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("env.json");
        std::fs::write(&path, EnvConfig::default().to_json().unwrap()).unwrap();
        assert_eq!(EnvConfig::load(&path).unwrap(), EnvConfig::default());
    }
}
