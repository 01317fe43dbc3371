//! Observation layout shared by the environment and offline extraction.
//!
//! An imitation observation is laid out as
//! `[phase, desired_speed, qpos[1..], qvel]`. The forward COM position
//! (`qpos[0]`) is dropped so the policy stays independent of how far the
//! body has walked.

use nalgebra::DVector;

use crate::Kinematics;

/// Number of leading entries before the joint kinematics.
pub const HEADER_LEN: usize = 2;

/// Builds an observation vector from the gait phase, the desired walking
/// speed and the current joint kinematics.
#[must_use]
pub fn compose(phase: f64, desired_speed: f64, kinematics: &Kinematics) -> DVector<f64> {
    let qpos_tail = kinematics.qpos.len().saturating_sub(1);
    let len = HEADER_LEN + qpos_tail + kinematics.qvel.len();
    DVector::from_iterator(
        len,
        [phase, desired_speed]
            .into_iter()
            .chain(kinematics.qpos.iter().skip(1).copied())
            .chain(kinematics.qvel.iter().copied()),
    )
}

/// Index of `qpos[qpos_index]` inside an observation built by [`compose`].
///
/// Returns `None` for the dropped forward COM position.
#[must_use]
pub const fn qpos_slot(qpos_index: usize) -> Option<usize> {
    if qpos_index == 0 {
        None
    } else {
        Some(HEADER_LEN + qpos_index - 1)
    }
}
