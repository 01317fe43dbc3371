//! Planar bipedal walker.

use mimic_trajectory::{PinnedChannels, TrajectoryLayout};
use mimic_types::{FootContacts, GeomContact};
use nalgebra::DVector;

use crate::model::BodyModel;

const COM_INDICES: [usize; 2] = [0, 1];
const NOT_ACTUATED: [usize; 3] = [0, 1, 2];
const MAX_ACTUATOR_VELOCITIES: [f64; 6] = [6.0, 12.0, 12.0, 6.0, 12.0, 12.0];

/// Name of the floor geom.
pub const FLOOR_GEOM: &str = "floor";
/// Name of the right foot geom.
pub const RIGHT_FOOT_GEOM: &str = "foot_geom";
/// Name of the left foot geom.
pub const LEFT_FOOT_GEOM: &str = "foot_left_geom";

/// Channel labels of the walker's sagittal mocap format: nine positions
/// followed by the nine matching velocities.
pub const CHANNEL_LABELS: [&str; 18] = [
    "COM Pos (X)",
    "COM Pos (Z)",
    "Trunk Rot (sagittal)",
    "Hip Ang R (sagittal)",
    "Knee Ang R",
    "Ankle Ang R",
    "Hip Ang L (sagittal)",
    "Knee Ang L",
    "Ankle Ang L",
    "COM Vel (X)",
    "COM Vel (Z)",
    "Trunk Ang Vel (sagittal)",
    "Hip Vel R (sagittal)",
    "Knee Vel R",
    "Ankle Vel R",
    "Hip Vel L (sagittal)",
    "Knee Vel L",
    "Ankle Vel L",
];

/// Two-legged walker moving in the sagittal plane.
///
/// `qpos` and `qvel` both hold nine channels:
/// `[com_x, com_z, trunk_rot, hip_r, knee_r, ankle_r, hip_l, knee_l, ankle_l]`.
/// The first three are passive; the six leg joints are actuated.
#[derive(Debug, Clone, Copy, Default)]
pub struct Walker2d;

impl Walker2d {
    /// Creates the walker.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Layout of the walker's mocap format: positions in channels `0..9`,
    /// velocities in `9..18`.
    #[must_use]
    pub fn trajectory_layout() -> TrajectoryLayout {
        TrajectoryLayout::contiguous(9, 9)
            .with_com_height_index(1)
            .with_com_velocity_index(0)
    }

    /// Constant COM and trunk channels of the walker with its trunk fixed
    /// in the air, for extracting imitation samples of a suspended body.
    #[must_use]
    pub fn suspended_pins() -> PinnedChannels {
        PinnedChannels::none()
            .with_qpos(1, 1.2)
            .with_qpos(2, 0.0)
            .with_qvel(0, 0.0)
            .with_qvel(1, -0.05)
            .with_qvel(2, 0.0)
    }

    /// Labels of the walker's mocap channels.
    #[must_use]
    pub fn channel_labels() -> Vec<String> {
        CHANNEL_LABELS.iter().map(|&l| l.to_owned()).collect()
    }
}

impl BodyModel for Walker2d {
    fn name(&self) -> &str {
        "walker2d"
    }

    fn qpos_dim(&self) -> usize {
        9
    }

    fn qvel_dim(&self) -> usize {
        9
    }

    fn com_indices(&self) -> &[usize] {
        &COM_INDICES
    }

    fn not_actuated_joint_indices(&self) -> &[usize] {
        &NOT_ACTUATED
    }

    fn max_actuator_velocities(&self) -> DVector<f64> {
        DVector::from_row_slice(&MAX_ACTUATOR_VELOCITIES)
    }

    fn com_height_index(&self) -> usize {
        1
    }

    fn trunk_rotation_index(&self) -> usize {
        2
    }

    fn has_ground_contact(&self, contacts: &[GeomContact]) -> FootContacts {
        let touches = |foot: &str| contacts.iter().any(|c| c.is_between(foot, FLOOR_GEOM));
        FootContacts::new(touches(LEFT_FOOT_GEOM), touches(RIGHT_FOOT_GEOM))
    }
}
