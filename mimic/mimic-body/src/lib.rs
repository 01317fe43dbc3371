//! Body models for motion imitation.
//!
//! A body model tells the rest of the stack which kinematic channels are the
//! COM, which joints are actuated, how fast the actuators can move and when
//! the feet touch the ground.
//!
//! - [`BodyModel`] - Capabilities every simulated body provides
//! - [`KinematicsAdapter`] - Splits kinematic vectors into joint groups
//! - [`Walker2d`] - Planar biped with six actuated leg joints
//! - [`remove_by_indices`] - Pure index removal helper
//!
//! # Example
//!
//! ```
//! use mimic_body::{BodyModel, KinematicsAdapter, Walker2d};
//! use mimic_types::Kinematics;
//!
//! let adapter = KinematicsAdapter::new(Walker2d::new())?;
//! assert_eq!(adapter.model().name(), "walker2d");
//! assert!(adapter.check_dims(&Kinematics::zeros(9, 9)).is_ok());
//! # Ok::<(), mimic_body::BodyError>(())
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn, // nalgebra constructors are not const
    clippy::cast_precision_loss,  // index to f64 only in tests and docs
)]

mod adapter;
mod error;
mod indices;
mod model;
pub mod walker2d;

pub use adapter::{Exclusion, KinematicsAdapter};
pub use error::{BodyError, Result};
pub use indices::{remove_by_indices, remove_rows, select_rows};
pub use model::BodyModel;
pub use walker2d::Walker2d;
