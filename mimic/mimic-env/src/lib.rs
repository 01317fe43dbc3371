//! Episode control and environment facade for motion-imitation training.
//!
//! This crate ties the reference trajectory, the body model and the reward
//! together into an episodic environment:
//!
//! - [`EpisodeController`] - reference state initialization, per-step
//!   bookkeeping, imitation reward and early termination
//! - [`Physics`] - the simulator interface, with [`KinematicPhysics`] as a
//!   headless backend
//! - [`MimicEnv`] - observation, action and step handling on top of a
//!   physics backend
//! - [`EpisodeMonitor`] - smoothed episode statistics
//! - [`EnvConfig`] - serializable configuration
//!
//! # Episode lifecycle
//!
//! ```text
//! Uninitialized --reset()--> Active --close()--> Uninitialized
//! ```
//!
//! Before the first [`MimicEnv::reset`] rewards and desired speeds report
//! [`UNINITIALIZED_SENTINEL`](mimic_types::UNINITIALIZED_SENTINEL) and no
//! termination check fires.
//!
//! # Example
//!
//! ```
//! use mimic_body::{KinematicsAdapter, Walker2d};
//! use mimic_env::{EnvConfig, KinematicPhysics, MimicEnv, PlaybackMode};
//! use mimic_trajectory::{MocapDataset, MocapStep, ReferenceTrajectory};
//! use mimic_types::ForceRange;
//!
//! let step = MocapStep::new(
//!     (0..30)
//!         .map(|f| {
//!             let mut frame = vec![0.0; 18];
//!             frame[0] = 0.005 * f as f64;
//!             frame[1] = 1.25;
//!             frame[9] = 1.0;
//!             frame
//!         })
//!         .collect(),
//! );
//! let dataset = MocapDataset::new(200.0, vec![step.clone(), step]);
//! let refs = ReferenceTrajectory::new(dataset, Walker2d::trajectory_layout())?;
//! let body = KinematicsAdapter::new(Walker2d::new())?;
//! let physics = KinematicPhysics::for_body(&Walker2d::new(), ForceRange::symmetric(100.0));
//!
//! let mut env = MimicEnv::new(physics, refs, body, EnvConfig::default(), None)?;
//! let report = env.play_reference(20, PlaybackMode::Kinematic)?;
//! assert!((report.mean_reward - 1.0).abs() < 1e-9);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn, // nalgebra arithmetic is not const
    clippy::missing_errors_doc,   // physics errors are passed through
)]

mod config;
mod controller;
mod env;
mod error;
mod monitor;
mod physics;

pub use config::{ActionSpaceMode, EnvConfig, TerminationConfig};
pub use controller::{EpisodeController, TerminationReason};
pub use env::{
    CONTACT_FLAG_SCALE, MimicEnv, PlaybackMode, PlaybackReport, StepInfo, StepOutcome,
};
pub use error::{EnvError, Result};
pub use monitor::{EpisodeMonitor, EpisodeSummary, FAST_SMOOTHING, SLOW_SMOOTHING, SmoothedStats};
pub use physics::{KinematicPhysics, Physics, ServoGains};
