//! Offline extraction of imitation (behavior-cloning) samples.

use mimic_types::{Kinematics, observation};
use nalgebra::DVector;

use crate::error::{Result, TrajectoryError};
use crate::store::ReferenceTrajectory;

/// Observation/target pairs taken from the reference trajectories.
///
/// `observations[i]` is the policy observation at a reference frame and
/// `targets[i]` the reference positions of the actuated joints one control
/// tick later.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ImitationSamples {
    /// Observations laid out as `[phase, speed, qpos[1..], qvel]`.
    pub observations: Vec<DVector<f64>>,
    /// Desired actuated joint positions at the next tick.
    pub targets: Vec<DVector<f64>>,
}

impl ImitationSamples {
    /// Number of pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// Returns true if no pairs were extracted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Converts targets into joint-angle deltas relative to the actuated
    /// joint angles contained in each observation.
    ///
    /// # Errors
    ///
    /// Returns an error if `actuated_offset` is 0 (the forward COM position
    /// is not part of observations) or the observation is too short.
    pub fn angle_deltas(&self, actuated_offset: usize) -> Result<Vec<DVector<f64>>> {
        let slot = observation::qpos_slot(actuated_offset).ok_or_else(|| {
            TrajectoryError::invalid_layout("actuated joints cannot start at qpos[0]")
        })?;

        self.observations
            .iter()
            .zip(&self.targets)
            .map(|(obs, target)| {
                if slot + target.len() > obs.len() {
                    return Err(TrajectoryError::invalid_layout(format!(
                        "observation of length {} has no {} actuated joints at {slot}",
                        obs.len(),
                        target.len()
                    )));
                }
                Ok(target - obs.rows(slot, target.len()))
            })
            .collect()
    }
}

/// Channels overwritten with constants in extracted observations.
///
/// A suspended body keeps its trunk fixed, so the channels it moves are
/// constant in simulation but not in the recorded walk. Pinning them makes
/// the offline observations look like the ones a suspended policy sees.
/// Indices refer to the full model `qpos`/`qvel`. Targets are never pinned.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PinnedChannels {
    /// `(qpos index, value)` pairs.
    pub qpos: Vec<(usize, f64)>,
    /// `(qvel index, value)` pairs.
    pub qvel: Vec<(usize, f64)>,
}

impl PinnedChannels {
    /// Pins nothing.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Pins a position channel.
    #[must_use]
    pub fn with_qpos(mut self, index: usize, value: f64) -> Self {
        self.qpos.push((index, value));
        self
    }

    /// Pins a velocity channel.
    #[must_use]
    pub fn with_qvel(mut self, index: usize, value: f64) -> Self {
        self.qvel.push((index, value));
        self
    }

    /// Returns true if no channel is pinned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.qpos.is_empty() && self.qvel.is_empty()
    }

    fn check(&self, nq: usize, nv: usize) -> Result<()> {
        let bad_qpos = self.qpos.iter().find(|(i, _)| *i >= nq);
        let bad_qvel = self.qvel.iter().find(|(i, _)| *i >= nv);
        match (bad_qpos, bad_qvel) {
            (Some((i, _)), _) => Err(TrajectoryError::invalid_layout(format!(
                "pinned qpos index {i} out of range for {nq} positions"
            ))),
            (_, Some((i, _))) => Err(TrajectoryError::invalid_layout(format!(
                "pinned qvel index {i} out of range for {nv} velocities"
            ))),
            _ => Ok(()),
        }
    }

    fn apply(&self, state: &mut Kinematics) {
        for &(i, value) in &self.qpos {
            state.qpos[i] = value;
        }
        for &(i, value) in &self.qvel {
            state.qvel[i] = value;
        }
    }
}

/// Walks the whole dataset and pairs every observation with the actuated
/// joint targets of the following control tick.
///
/// With a frame stride above one, the dataset is walked once per stride
/// offset so every frame appears as an observation. A pair whose target
/// would wrap past the end of the dataset is dropped. The store is reset
/// afterwards.
///
/// # Errors
///
/// Returns an error if `actuated_offset` is 0 or not below the number of
/// model positions.
pub fn extract_imitation_samples(
    refs: &mut ReferenceTrajectory,
    actuated_offset: usize,
) -> Result<ImitationSamples> {
    extract_pinned_imitation_samples(refs, actuated_offset, &PinnedChannels::none())
}

/// [`extract_imitation_samples`] with `pinned` channels overwritten in every
/// observation, for training policies of a suspended body.
///
/// # Errors
///
/// Returns an error if `actuated_offset` is 0 or not below the number of
/// model positions, or a pinned index is out of range.
pub fn extract_pinned_imitation_samples(
    refs: &mut ReferenceTrajectory,
    actuated_offset: usize,
    pinned: &PinnedChannels,
) -> Result<ImitationSamples> {
    let nq = refs.layout().nq();
    if actuated_offset == 0 || actuated_offset >= nq {
        return Err(TrajectoryError::invalid_layout(format!(
            "actuated offset {actuated_offset} must lie in 1..{nq}"
        )));
    }
    pinned.check(nq, refs.layout().nv())?;

    let mut samples = ImitationSamples::default();
    for lane in 0..refs.frame_stride() {
        refs.reset();
        if refs.seek(0, lane).is_err() {
            // First step shorter than the stride
            continue;
        }
        while !refs.has_reached_last_step() {
            let mut state = refs.ref_kinematics();
            pinned.apply(&mut state);
            let obs = observation::compose(refs.phase(), refs.step_velocity(), &state);

            refs.advance();
            if refs.has_reached_last_step() {
                break;
            }
            let qpos = refs.qpos();
            let target = qpos.rows(actuated_offset, nq - actuated_offset).into_owned();

            samples.observations.push(obs);
            samples.targets.push(target);
        }
    }
    refs.reset();

    tracing::debug!(
        "Extracted {} imitation samples with stride {}",
        samples.len(),
        refs.frame_stride()
    );
    Ok(samples)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::dataset::{MocapDataset, MocapStep};
    use crate::layout::TrajectoryLayout;
    use approx::assert_relative_eq;

    /// Channels: [com_x, com_z, joint_a, joint_b, vx, vz, va, vb]
    fn refs(steps: usize, len: usize) -> ReferenceTrajectory {
        let steps = (0..steps)
            .map(|s| {
                MocapStep::new(
                    (0..len)
                        .map(|t| {
                            let frame = (s * len + t) as f64;
                            vec![frame, 1.2, frame * 0.01, -frame * 0.01, 1.0, 0.0, 0.0, 0.0]
                        })
                        .collect(),
                )
            })
            .collect();
        ReferenceTrajectory::new(
            MocapDataset::new(100.0, steps),
            TrajectoryLayout::contiguous(4, 4),
        )
        .unwrap()
    }

    #[test]
    fn one_pair_per_frame_except_last() {
        let mut refs = refs(2, 10);
        let samples = extract_imitation_samples(&mut refs, 2).unwrap();
        assert_eq!(samples.len(), 19);
        assert_eq!(samples.targets.len(), 19);
        assert_eq!(samples.observations[0].len(), 2 + 3 + 4);
        assert_eq!(samples.targets[0].len(), 2);
        // Store is rewound afterwards
        assert_eq!(refs.cursor().step, 0);
        assert!(!refs.has_reached_last_step());
    }

    #[test]
    fn target_is_next_frame() {
        let mut refs = refs(2, 10);
        let samples = extract_imitation_samples(&mut refs, 2).unwrap();
        // Observation for global frame 9, target from global frame 10
        assert_relative_eq!(samples.observations[9][3], 0.09, epsilon = 1e-12);
        assert_relative_eq!(samples.targets[9][0], 0.10, epsilon = 1e-12);
        assert_relative_eq!(samples.targets[9][1], -0.10, epsilon = 1e-12);
    }

    #[test]
    fn stride_runs_one_pass_per_offset() {
        let mut refs = refs(2, 10).with_frame_stride(2);
        let samples = extract_imitation_samples(&mut refs, 2).unwrap();
        // Each pass visits 10 frames and drops the wrapping pair
        assert_eq!(samples.len(), 18);
        // Second pass starts at frame 1
        assert_relative_eq!(samples.observations[9][3], 0.01, epsilon = 1e-12);
    }

    #[test]
    fn deltas_against_observed_angles() {
        let mut refs = refs(1, 5);
        let samples = extract_imitation_samples(&mut refs, 2).unwrap();
        let deltas = samples.angle_deltas(2).unwrap();
        assert_eq!(deltas.len(), samples.len());
        for delta in &deltas {
            assert_relative_eq!(delta[0], 0.01, epsilon = 1e-12);
            assert_relative_eq!(delta[1], -0.01, epsilon = 1e-12);
        }
    }

    #[test]
    fn pinned_channels_only_touch_observations() {
        let pinned = PinnedChannels::none()
            .with_qpos(1, 1.2)
            .with_qpos(2, 0.0)
            .with_qvel(0, 0.0)
            .with_qvel(1, -0.05);
        let mut refs = refs(2, 10);
        let free = extract_imitation_samples(&mut refs, 2).unwrap();
        let samples = extract_pinned_imitation_samples(&mut refs, 2, &pinned).unwrap();
        assert_eq!(samples.len(), free.len());

        for (obs, free_obs) in samples.observations.iter().zip(&free.observations) {
            // [phase, speed, qpos[1..4], qvel[0..4]]
            assert_eq!(obs[2], 1.2);
            assert_eq!(obs[3], 0.0);
            assert_eq!(obs[5], 0.0);
            assert_eq!(obs[6], -0.05);
            assert_eq!(obs[4], free_obs[4]);
            assert_eq!(obs[7], free_obs[7]);
        }
        assert_eq!(samples.targets, free.targets);
    }

    #[test]
    fn rejects_pins_outside_model() {
        let mut refs = refs(1, 5);
        let pinned = PinnedChannels::none().with_qvel(4, 0.0);
        assert!(extract_pinned_imitation_samples(&mut refs, 2, &pinned).is_err());
        assert!(PinnedChannels::none().is_empty());
    }

    #[test]
    fn rejects_invalid_offset() {
        let mut refs = refs(1, 5);
        assert!(extract_imitation_samples(&mut refs, 0).is_err());
        assert!(extract_imitation_samples(&mut refs, 4).is_err());

        let samples = extract_imitation_samples(&mut refs, 1).unwrap();
        assert!(samples.angle_deltas(0).is_err());
    }
}
