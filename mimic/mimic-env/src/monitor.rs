//! Episode statistics for training diagnostics.

use serde::{Deserialize, Serialize};
use tracing::info;

/// Smoothing factor for episode length, return and joint power.
pub const SLOW_SMOOTHING: f64 = 0.75;

/// Smoothing factor for mean reward and moved distance.
pub const FAST_SMOOTHING: f64 = 0.25;

/// Statistics of one finished episode.
///
/// # Example
///
/// ```
/// use mimic_env::EpisodeSummary;
///
/// let summary = EpisodeSummary::new(100, 80.0, 2.5, 0.1);
/// assert!((summary.mean_reward() - 0.8).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpisodeSummary {
    /// Control steps taken.
    pub length: usize,

    /// Sum of rewards.
    pub episode_return: f64,

    /// Forward distance covered by the COM.
    pub moved_distance: f64,

    /// Mean normalized joint power.
    pub mean_joint_power: f64,
}

impl EpisodeSummary {
    /// Creates a summary.
    #[must_use]
    pub const fn new(
        length: usize,
        episode_return: f64,
        moved_distance: f64,
        mean_joint_power: f64,
    ) -> Self {
        Self {
            length,
            episode_return,
            moved_distance,
            mean_joint_power,
        }
    }

    /// Average reward per step (0 for empty episodes).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn mean_reward(&self) -> f64 {
        if self.length == 0 {
            0.0
        } else {
            self.episode_return / self.length as f64
        }
    }
}

/// Exponentially smoothed episode statistics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SmoothedStats {
    /// Smoothed episode length.
    pub length: f64,
    /// Smoothed return.
    pub episode_return: f64,
    /// Smoothed mean reward.
    pub mean_reward: f64,
    /// Smoothed moved distance.
    pub moved_distance: f64,
    /// Smoothed mean joint power.
    pub mean_joint_power: f64,
}

impl SmoothedStats {
    #[allow(clippy::cast_precision_loss)]
    fn first(summary: &EpisodeSummary) -> Self {
        Self {
            length: summary.length as f64,
            episode_return: summary.episode_return,
            mean_reward: summary.mean_reward(),
            moved_distance: summary.moved_distance,
            mean_joint_power: summary.mean_joint_power,
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn update(&mut self, summary: &EpisodeSummary) {
        let smooth = |old: f64, new: f64, factor: f64| factor * old + (1.0 - factor) * new;
        self.length = smooth(self.length, summary.length as f64, SLOW_SMOOTHING);
        self.episode_return = smooth(self.episode_return, summary.episode_return, SLOW_SMOOTHING);
        self.mean_joint_power =
            smooth(self.mean_joint_power, summary.mean_joint_power, SLOW_SMOOTHING);
        self.mean_reward = smooth(self.mean_reward, summary.mean_reward(), FAST_SMOOTHING);
        self.moved_distance = smooth(self.moved_distance, summary.moved_distance, FAST_SMOOTHING);
    }
}

/// Accumulates per-step values into episode statistics.
///
/// # Example
///
/// ```
/// use mimic_env::EpisodeMonitor;
///
/// let mut monitor = EpisodeMonitor::new();
/// monitor.begin_episode(0.0);
/// monitor.record_step(0.9, 0.1, 0.01);
/// monitor.record_step(0.7, 0.3, 0.02);
/// let summary = monitor.end_episode();
///
/// assert_eq!(summary.length, 2);
/// assert!((summary.moved_distance - 0.02).abs() < 1e-12);
/// assert_eq!(monitor.episodes_completed(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct EpisodeMonitor {
    length: usize,
    episode_return: f64,
    joint_power_sum: f64,
    start_x: f64,
    last_x: f64,
    smoothed: Option<SmoothedStats>,
    last: Option<EpisodeSummary>,
    episodes: usize,
}

impl EpisodeMonitor {
    /// Creates an empty monitor.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts accumulating a new episode at forward position `com_x`.
    pub fn begin_episode(&mut self, com_x: f64) {
        self.length = 0;
        self.episode_return = 0.0;
        self.joint_power_sum = 0.0;
        self.start_x = com_x;
        self.last_x = com_x;
    }

    /// Records one control step.
    pub fn record_step(&mut self, reward: f64, joint_power_normed: f64, com_x: f64) {
        self.length += 1;
        self.episode_return += reward;
        self.joint_power_sum += joint_power_normed;
        self.last_x = com_x;
    }

    /// Steps recorded in the running episode.
    #[must_use]
    pub const fn current_length(&self) -> usize {
        self.length
    }

    /// Finishes the running episode and folds it into the smoothed stats.
    #[allow(clippy::cast_precision_loss)]
    pub fn end_episode(&mut self) -> EpisodeSummary {
        let mean_joint_power = if self.length == 0 {
            0.0
        } else {
            self.joint_power_sum / self.length as f64
        };
        let summary = EpisodeSummary::new(
            self.length,
            self.episode_return,
            self.last_x - self.start_x,
            mean_joint_power,
        );

        match self.smoothed.as_mut() {
            Some(stats) => stats.update(&summary),
            None => self.smoothed = Some(SmoothedStats::first(&summary)),
        }
        self.episodes += 1;
        self.last = Some(summary);

        info!(
            episode = self.episodes,
            length = summary.length,
            episode_return = summary.episode_return,
            moved_distance = summary.moved_distance,
            mean_joint_power = summary.mean_joint_power,
            "episode finished"
        );
        summary
    }

    /// Number of finished episodes.
    #[must_use]
    pub const fn episodes_completed(&self) -> usize {
        self.episodes
    }

    /// Summary of the last finished episode.
    #[must_use]
    pub const fn last_episode(&self) -> Option<&EpisodeSummary> {
        self.last.as_ref()
    }

    /// Smoothed statistics over all finished episodes.
    #[must_use]
    pub const fn smoothed(&self) -> Option<&SmoothedStats> {
        self.smoothed.as_ref()
    }
}
