//! Body-model capability trait.

use std::fmt::Debug;

use mimic_types::{FootContacts, GeomContact};
use nalgebra::DVector;

/// Capabilities a simulated body must provide to be trained on reference
/// trajectories.
///
/// Every method is required. A body model that forgets one does not
/// compile.
///
/// Indices refer to the simulator's `qpos`/`qvel` order. For planar and
/// hinge-only bodies the two share one index space.
pub trait BodyModel: Debug + Send + Sync {
    /// Short identifier, used in logs.
    fn name(&self) -> &str;

    /// Number of position channels.
    fn qpos_dim(&self) -> usize;

    /// Number of velocity channels.
    fn qvel_dim(&self) -> usize;

    /// Indices of the COM (root translation) channels.
    fn com_indices(&self) -> &[usize];

    /// Indices of channels that no actuator drives (root translation and
    /// orientation).
    fn not_actuated_joint_indices(&self) -> &[usize];

    /// Peak absolute velocity of each actuated joint, in actuated order.
    fn max_actuator_velocities(&self) -> DVector<f64>;

    /// Index of the vertical COM position in `qpos`.
    fn com_height_index(&self) -> usize;

    /// Index of the sagittal trunk rotation in `qpos`.
    fn trunk_rotation_index(&self) -> usize;

    /// Which feet touch the ground, given the simulator's active contacts.
    fn has_ground_contact(&self, contacts: &[GeomContact]) -> FootContacts;
}
