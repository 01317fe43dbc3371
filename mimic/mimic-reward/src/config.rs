//! Reward configuration.

use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, RewardError};

/// Configuration of the imitation reward.
///
/// # Example
///
/// ```
/// use mimic_reward::{Aggregation, DeviationReward, RewardConfig};
///
/// let config = RewardConfig::default()
///     .with_deviation(DeviationReward::NormalizedExponential)
///     .with_aggregation(Aggregation::PoseComProduct);
/// assert!(config.is_valid());
/// assert_eq!(config.weights.pose, 0.6);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardConfig {
    /// How joint deviations are turned into sub-rewards.
    pub deviation: DeviationReward,

    /// Which COM quantities the COM reward compares (normalized forms only).
    pub com_target: ComTarget,

    /// How the sub-rewards are combined.
    pub aggregation: Aggregation,

    /// Sub-reward weights for [`Aggregation::WeightedSum`].
    pub weights: RewardWeights,

    /// Scale the reward down when the policy outputs joint targets the
    /// actuators cannot reach within one control period.
    pub punish_unrealistic_targets: bool,

    /// Multiple of the per-period joint travel still considered reachable.
    pub max_delta_scale: f64,

    /// Body is suspended in the air (trunk fixed).
    pub suspended: bool,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            deviation: DeviationReward::SquaredError,
            com_target: ComTarget::Position,
            aggregation: Aggregation::WeightedSum,
            weights: RewardWeights::default(),
            punish_unrealistic_targets: false,
            max_delta_scale: 2.0,
            suspended: false,
        }
    }
}

impl RewardConfig {
    /// Sets the deviation form.
    #[must_use]
    pub const fn with_deviation(mut self, deviation: DeviationReward) -> Self {
        self.deviation = deviation;
        self
    }

    /// Sets the COM target.
    #[must_use]
    pub const fn with_com_target(mut self, com_target: ComTarget) -> Self {
        self.com_target = com_target;
        self
    }

    /// Sets the aggregation.
    #[must_use]
    pub const fn with_aggregation(mut self, aggregation: Aggregation) -> Self {
        self.aggregation = aggregation;
        self
    }

    /// Sets the sub-reward weights.
    #[must_use]
    pub const fn with_weights(mut self, weights: RewardWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Enables the unrealistic-target penalty.
    #[must_use]
    pub const fn with_target_penalty(mut self) -> Self {
        self.punish_unrealistic_targets = true;
        self
    }

    /// Marks the body as suspended.
    #[must_use]
    pub const fn with_suspended(mut self, suspended: bool) -> Self {
        self.suspended = suspended;
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
    /// Returns an error if the weights are invalid or the delta scale is not
    /// positive.
    pub fn validate(&self) -> Result<()> {
        self.weights.validate()?;
        if !(self.max_delta_scale.is_finite() && self.max_delta_scale > 0.0) {
            return Err(RewardError::invalid_config(format!(
                "max delta scale must be positive, got {}",
                self.max_delta_scale
            )));
        }
        Ok(())
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
        serde_json::to_string_pretty(self).map_err(RewardError::from)
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

/// How a vector of joint deviations becomes a sub-reward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum DeviationReward {
    /// `exp(-k * sum(delta^2))` with a fixed decay per sub-reward.
    #[default]
    SquaredError,

    /// `exp(-2.5 * mean(|delta| / 2 sigma))`.
    NormalizedExponential,

    /// `1 - slope * mean(|delta| / 2 sigma)`. Can become negative.
    NormalizedLinear {
        /// Penalty slope.
        slope: LinearSlope,
    },
}

impl DeviationReward {
    /// Returns true for the forms that divide deviations by channel spread.
    #[must_use]
    pub const fn is_normalized(&self) -> bool {
        !matches!(self, Self::SquaredError)
    }
}

/// Slope of the linear deviation penalty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum LinearSlope {
    /// Slope 1.
    #[default]
    Full,
    /// Slope 0.5.
    Half,
}

impl LinearSlope {
    /// Numeric slope.
    #[must_use]
    pub const fn factor(self) -> f64 {
        match self {
            Self::Full => 1.0,
            Self::Half => 0.5,
        }
    }
}

/// Quantities compared by the COM reward in the normalized forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ComTarget {
    /// All COM position channels.
    #[default]
    Position,
    /// COM height and forward COM velocity.
    HeightAndForwardVelocity,
}

/// How sub-rewards combine into the imitation reward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Aggregation {
    /// Weighted sum of pose, velocity, COM and energy rewards.
    #[default]
    WeightedSum,
    /// `sqrt(pose) * sqrt(com)`.
    PoseComProduct,
}

/// Weights of the pose, velocity, COM and energy sub-rewards.
///
/// Usually written as four digits, each a tenth:
///
/// ```
/// use mimic_reward::RewardWeights;
///
/// let weights: RewardWeights = "6220".parse()?;
/// assert_eq!(weights.velocity, 0.2);
/// assert_eq!(weights.energy, 0.0);
/// # Ok::<(), mimic_reward::RewardError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RewardWeights {
    /// Pose reward weight.
    pub pose: f64,
    /// Velocity reward weight.
    pub velocity: f64,
    /// COM reward weight.
    pub com: f64,
    /// Energy reward weight.
    pub energy: f64,
}

impl Default for RewardWeights {
    fn default() -> Self {
        Self::new(0.6, 0.2, 0.2, 0.0)
    }
}

impl RewardWeights {
    /// Tolerance when checking that weights sum to one.
    pub const SUM_TOLERANCE: f64 = 1e-9;

    /// Creates weights.
    #[must_use]
    pub const fn new(pose: f64, velocity: f64, com: f64, energy: f64) -> Self {
        Self {
            pose,
            velocity,
            com,
            energy,
        }
    }

    /// Parses a four-digit string such as `"6220"`, each digit in tenths,
    /// and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not four decimal digits or the
    /// weights do not sum to one.
    pub fn from_digits(digits: &str) -> Result<Self> {
        let values: Vec<f64> = digits
            .chars()
            .map(|c| c.to_digit(10).map(|d| f64::from(d) / 10.0))
            .collect::<Option<_>>()
            .ok_or_else(|| {
                RewardError::invalid_config(format!("weights '{digits}' must be decimal digits"))
            })?;

        let &[pose, velocity, com, energy] = values.as_slice() else {
            return Err(RewardError::invalid_config(format!(
                "weights '{digits}' must have exactly four digits"
            )));
        };

        let weights = Self::new(pose, velocity, com, energy);
        weights.validate()?;
        Ok(weights)
    }

    /// Sum of all weights.
    #[must_use]
    pub fn sum(&self) -> f64 {
        self.pose + self.velocity + self.com + self.energy
    }

    /// Validates the weights.
    ///
    /// # Errors
    ///
    /// Returns an error if a weight is negative or not finite, or the
    /// weights do not sum to one.
    pub fn validate(&self) -> Result<()> {
        let all = [self.pose, self.velocity, self.com, self.energy];
        if all.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(RewardError::invalid_config(format!(
                "weights must be finite and non-negative: {all:?}"
            )));
        }
        if (self.sum() - 1.0).abs() > Self::SUM_TOLERANCE {
            return Err(RewardError::invalid_config(format!(
                "weights must sum to 1, got {}",
                self.sum()
            )));
        }
        Ok(())
    }
}

impl FromStr for RewardWeights {
    type Err = RewardError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_digits(s)
    }
}
