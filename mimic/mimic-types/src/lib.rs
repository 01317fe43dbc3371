//! Core data types for motion imitation.
//!
//! This crate provides the vocabulary shared by the imitation stack:
//!
//! - [`Kinematics`] - Joint positions (`qpos`) and velocities (`qvel`)
//! - [`StepSide`] - Which foot leads a recorded gait step
//! - [`EpisodeStatus`] - Whether random state initialization has happened
//! - [`ForceRange`] - Actuator force limits reported by the simulator
//! - [`GeomContact`], [`FootContacts`] - Contact state used for observations
//!
//! # Design Philosophy
//!
//! These types are **pure data**. They carry no reward logic and no physics.
//! They're the common language between the reference trajectory store, the
//! body-model adapter, the reward engine and the episode controller.
//!
//! # Example
//!
//! ```
//! use mimic_types::{Kinematics, observation};
//! use nalgebra::DVector;
//!
//! let state = Kinematics::new(
//!     DVector::from_vec(vec![0.3, 1.2, 0.0]),
//!     DVector::from_vec(vec![1.0, 0.0, 0.1]),
//! );
//!
//! // Observations drop the forward COM position
//! let obs = observation::compose(0.25, 1.1, &state);
//! assert_eq!(obs.len(), 2 + 2 + 3);
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn, // Many methods can't be const due to nalgebra
    clippy::cast_precision_loss,  // usize to f64 is fine for counts
)]

mod actuation;
mod contact;
mod episode;
mod kinematics;
pub mod observation;

pub use actuation::ForceRange;
pub use contact::{FootContacts, GeomContact};
pub use episode::{EpisodeStatus, StepSide};
pub use kinematics::Kinematics;

// Re-export math types for convenience
pub use nalgebra::{DMatrix, DVector};

/// Value reported in place of rewards and desired speeds before the first
/// random state initialization of an episode.
pub const UNINITIALIZED_SENTINEL: f64 = -3.33;
