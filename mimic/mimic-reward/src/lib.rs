//! Imitation reward for motion tracking.
//!
//! The reward scores how closely a simulated body follows the reference
//! motion. It combines four sub-rewards:
//!
//! - **pose**: non-COM joint positions
//! - **velocity**: non-COM joint velocities
//! - **COM**: center-of-mass position (or height and forward velocity)
//! - **energy**: one minus the normalized joint power
//!
//! Each deviation is turned into a sub-reward by a [`DeviationReward`] form,
//! and the sub-rewards are combined by an [`Aggregation`]. A plausibility
//! factor can additionally punish joint targets the actuators cannot reach.
//!
//! # Example
//!
//! ```
//! use mimic_body::{KinematicsAdapter, Walker2d};
//! use mimic_reward::{RewardConfig, RewardEngine, RewardInputs};
//! use mimic_types::Kinematics;
//!
//! let config = RewardConfig::default().with_weights("7120".parse()?);
//! let body = KinematicsAdapter::new(Walker2d::new())?;
//! let engine = RewardEngine::new(config, &body, &Walker2d::trajectory_layout(), None, 200.0)?;
//!
//! let reference = Kinematics::zeros(9, 9);
//! let mut state = reference.clone();
//! state.qpos[4] = 0.2;
//!
//! let terms = engine.breakdown(&RewardInputs {
//!     state: &state,
//!     reference: &reference,
//!     joint_power_normed: 0.0,
//!     targets: None,
//! })?;
//! assert!(terms.pose < 1.0);
//! assert!(terms.com > 0.999);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn, // nalgebra arithmetic is not const
    clippy::cast_precision_loss,  // test fixtures index into f64
)]

mod config;
mod energy;
mod engine;
mod error;
mod kernel;

pub use config::{Aggregation, ComTarget, DeviationReward, LinearSlope, RewardConfig, RewardWeights};
pub use energy::{energy_reward, joint_power_normed};
pub use engine::{
    ANGLE_DELTA_TOLERANCE, AngleTargets, COM_DECAY, POSE_DECAY, RewardBreakdown, RewardEngine,
    RewardInputs, UNREALISTIC_TARGET_FACTOR, VELOCITY_DECAY,
};
pub use error::{Result, RewardError};
pub use kernel::DeviationScales;
