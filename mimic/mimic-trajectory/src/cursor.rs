//! Playback cursor.

use serde::{Deserialize, Serialize};

/// Position of the playback head inside the reference trajectories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PlaybackCursor {
    /// Index of the current step.
    pub step: usize,
    /// Frame index within the current step.
    pub position: usize,
}

impl PlaybackCursor {
    /// Creates a cursor.
    #[must_use]
    pub const fn new(step: usize, position: usize) -> Self {
        Self { step, position }
    }

    /// Cursor at the very first frame.
    #[must_use]
    pub const fn start() -> Self {
        Self::new(0, 0)
    }
}
