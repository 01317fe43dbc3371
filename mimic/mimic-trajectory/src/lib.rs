//! Reference motion-capture trajectories for imitation learning.
//!
//! This crate owns the ground-truth motion the policy is asked to imitate:
//!
//! - [`MocapDataset`] - Recorded gait steps loaded from JSON
//! - [`TrajectoryLayout`] - Which dataset channels hold model `qpos`/`qvel`
//! - [`ReferenceTrajectory`] - Playback cursor, gait phase, desired speed and
//!   random/deterministic state initialization
//! - [`DistributionTable`] - Per-phase mean and spread of the recorded states
//! - [`ChannelStats`] - Dataset-wide channel statistics
//! - [`extract_imitation_samples`] - Observation/target pairs for behavior
//!   cloning
//!
//! # Playback
//!
//! Each call to [`ReferenceTrajectory::advance`] moves the cursor by one
//! control tick. When the mocap rate is higher than the control rate, set the
//! frame stride with [`ReferenceTrajectory::with_frame_stride`].
//!
//! # Example
//!
//! ```
//! use mimic_trajectory::{MocapDataset, MocapStep, ReferenceTrajectory, TrajectoryLayout};
//!
//! let step = MocapStep::new(vec![vec![0.0, 1.2, 1.0, 0.0]; 20]);
//! let dataset = MocapDataset::new(400.0, vec![step.clone(), step]);
//!
//! let mut refs = ReferenceTrajectory::new(dataset, TrajectoryLayout::contiguous(2, 2))?
//!     .with_frame_stride(2)
//!     .with_seed(42);
//!
//! let init = refs.random_init_state();
//! assert_eq!(init.nq(), 2);
//! assert!(refs.phase() < 1.0);
//! # Ok::<(), mimic_trajectory::TrajectoryError>(())
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn, // nalgebra accessors are not const
    clippy::cast_precision_loss,  // frame counts fit comfortably in f64
)]

mod cursor;
mod dataset;
mod distribution;
mod error;
mod extract;
mod layout;
mod stats;
mod store;

pub use cursor::PlaybackCursor;
pub use dataset::{MocapDataset, MocapStep};
pub use distribution::{DistributionTable, SideDistribution};
pub use error::{Result, TrajectoryError};
pub use extract::{
    ImitationSamples, PinnedChannels, extract_imitation_samples, extract_pinned_imitation_samples,
};
pub use layout::TrajectoryLayout;
pub use stats::{ChannelStats, load_channel_stds};
pub use store::{DEFAULT_TAIL_MARGIN, ReferenceTrajectory};
