//! Joint-space kinematic state.

use nalgebra::DVector;
use serde::{Deserialize, Serialize};

/// Joint positions and velocities of an articulated body.
///
/// `qpos` and `qvel` use the simulator's own channel order. For bodies with
/// free joints the two vectors have different lengths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kinematics {
    /// Joint positions.
    pub qpos: DVector<f64>,
    /// Joint velocities.
    pub qvel: DVector<f64>,
}

impl Kinematics {
    /// Create a kinematic state from position and velocity vectors.
    #[must_use]
    pub fn new(qpos: DVector<f64>, qvel: DVector<f64>) -> Self {
        Self { qpos, qvel }
    }

    /// All-zero state with the given dimensions.
    #[must_use]
    pub fn zeros(nq: usize, nv: usize) -> Self {
        Self {
            qpos: DVector::zeros(nq),
            qvel: DVector::zeros(nv),
        }
    }

    /// Number of position channels.
    #[must_use]
    pub fn nq(&self) -> usize {
        self.qpos.len()
    }

    /// Number of velocity channels.
    #[must_use]
    pub fn nv(&self) -> usize {
        self.qvel.len()
    }

    /// Positions followed by velocities in a single vector.
    #[must_use]
    pub fn concat(&self) -> DVector<f64> {
        DVector::from_iterator(
            self.nq() + self.nv(),
            self.qpos.iter().chain(self.qvel.iter()).copied(),
        )
    }

    /// Returns true if every value is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.qpos.iter().chain(self.qvel.iter()).all(|v| v.is_finite())
    }
}
