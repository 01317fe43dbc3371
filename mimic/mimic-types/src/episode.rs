//! Episode and gait bookkeeping.

use serde::{Deserialize, Serialize};

/// Leading foot of a recorded gait step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepSide {
    /// Left foot leads the step.
    Left,
    /// Right foot leads the step.
    Right,
}

impl StepSide {
    /// Side of the step at `index` when sides simply alternate, starting left.
    #[must_use]
    pub const fn alternating(index: usize) -> Self {
        if index % 2 == 0 { Self::Left } else { Self::Right }
    }

    /// The other foot.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    /// Returns true for a left-leading step.
    #[must_use]
    pub const fn is_left(self) -> bool {
        matches!(self, Self::Left)
    }
}

/// Initialization state of an imitation episode.
///
/// An episode is `Uninitialized` until its first initial state has been
/// drawn from the reference trajectories. While uninitialized, rewards are
/// reported as [`crate::UNINITIALIZED_SENTINEL`] and early termination is
/// disabled, because hosting frameworks may step the environment before the
/// first reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EpisodeStatus {
    /// No initial state drawn yet (or the episode was closed).
    #[default]
    Uninitialized,
    /// Initial state drawn; rewards and termination checks are live.
    Active,
}

impl EpisodeStatus {
    /// Returns true once the episode has been initialized.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }
}
