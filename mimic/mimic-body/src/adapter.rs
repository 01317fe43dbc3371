//! Adapter between full kinematic vectors and the body model's joint groups.

use mimic_types::Kinematics;
use nalgebra::DVector;

use crate::error::{BodyError, Result};
use crate::indices::{remove_rows, select_rows};
use crate::model::BodyModel;

/// Which channels to drop from a kinematic vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Exclusion {
    /// Drop the COM channels only.
    Com,
    /// Drop every channel no actuator drives (COM and trunk orientation).
    NotActuated,
}

/// Splits simulator and reference kinematics into the joint groups a body
/// model declares.
///
/// # Example
///
/// ```
/// use mimic_body::{Exclusion, KinematicsAdapter, Walker2d};
/// use nalgebra::DVector;
///
/// let adapter = KinematicsAdapter::new(Walker2d::new())?;
/// let qpos = DVector::from_fn(9, |i, _| i as f64);
///
/// assert_eq!(adapter.exclude(&qpos, Exclusion::Com).len(), 7);
/// assert_eq!(adapter.actuated(&qpos).as_slice(), &[3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
/// assert_eq!(adapter.com(&qpos).as_slice(), &[0.0, 1.0]);
/// # Ok::<(), mimic_body::BodyError>(())
/// ```
#[derive(Debug)]
pub struct KinematicsAdapter {
    model: Box<dyn BodyModel>,
}

impl KinematicsAdapter {
    /// Wraps a body model after checking that its indices are consistent.
    ///
    /// # Errors
    ///
    /// Returns an error if an index lies outside the model's dimensions or
    /// the number of actuator velocities does not match the actuated joints.
    pub fn new(model: impl BodyModel + 'static) -> Result<Self> {
        Self::from_boxed(Box::new(model))
    }

    /// Wraps an already boxed body model.
    ///
    /// # Errors
    ///
    /// See [`new`](Self::new).
    pub fn from_boxed(model: Box<dyn BodyModel>) -> Result<Self> {
        let nq = model.qpos_dim();
        let name = model.name().to_owned();

        let scalar_indices = [
            ("COM height", model.com_height_index()),
            ("trunk rotation", model.trunk_rotation_index()),
        ];
        for (what, index) in scalar_indices {
            if index >= nq {
                return Err(BodyError::invalid_model(format!(
                    "{name}: {what} index {index} out of range for {nq} positions"
                )));
            }
        }

        if let Some(&bad) = model
            .com_indices()
            .iter()
            .chain(model.not_actuated_joint_indices())
            .find(|&&i| i >= nq.min(model.qvel_dim()))
        {
            return Err(BodyError::invalid_model(format!(
                "{name}: index {bad} out of range"
            )));
        }

        let not_actuated = model.not_actuated_joint_indices();
        if let Some((pos, &dup)) = not_actuated
            .iter()
            .enumerate()
            .find(|&(pos, i)| not_actuated[..pos].contains(i))
        {
            return Err(BodyError::invalid_model(format!(
                "{name}: non-actuated joint index {dup} repeated at position {pos}"
            )));
        }

        let actuated = actuated_joint_count(model.as_ref());
        let velocities = model.max_actuator_velocities().len();
        if velocities != actuated {
            return Err(BodyError::invalid_model(format!(
                "{name}: {velocities} actuator velocities for {actuated} actuated joints"
            )));
        }

        Ok(Self { model })
    }

    /// The wrapped body model.
    #[must_use]
    pub fn model(&self) -> &dyn BodyModel {
        self.model.as_ref()
    }

    /// Copy of `values` without the excluded channels.
    #[must_use]
    pub fn exclude(&self, values: &DVector<f64>, exclusion: Exclusion) -> DVector<f64> {
        let indices = match exclusion {
            Exclusion::Com => self.model.com_indices(),
            Exclusion::NotActuated => self.model.not_actuated_joint_indices(),
        };
        remove_rows(values, indices)
    }

    /// Actuated channels of `values`.
    #[must_use]
    pub fn actuated(&self, values: &DVector<f64>) -> DVector<f64> {
        self.exclude(values, Exclusion::NotActuated)
    }

    /// COM channels of `values`.
    #[must_use]
    pub fn com(&self, values: &DVector<f64>) -> DVector<f64> {
        select_rows(values, self.model.com_indices())
    }

    /// Number of actuated joints.
    #[must_use]
    pub fn actuated_count(&self) -> usize {
        actuated_joint_count(self.model.as_ref())
    }

    /// Largest joint-angle change each actuated joint can make within one
    /// control period, scaled by `scale`.
    #[must_use]
    pub fn max_qpos_deltas(&self, control_frequency: f64, scale: f64) -> DVector<f64> {
        self.model.max_actuator_velocities() * (scale / control_frequency)
    }

    /// Checks that a kinematic state has the model's dimensions.
    ///
    /// # Errors
    ///
    /// Returns an error if `qpos` or `qvel` has the wrong length.
    pub fn check_dims(&self, kinematics: &Kinematics) -> Result<()> {
        if kinematics.nq() != self.model.qpos_dim() {
            return Err(BodyError::dimension_mismatch(
                "qpos",
                self.model.qpos_dim(),
                kinematics.nq(),
            ));
        }
        if kinematics.nv() != self.model.qvel_dim() {
            return Err(BodyError::dimension_mismatch(
                "qvel",
                self.model.qvel_dim(),
                kinematics.nv(),
            ));
        }
        Ok(())
    }

    /// Checks that `values` holds one entry per actuated joint.
    ///
    /// # Errors
    ///
    /// Returns an error on a length mismatch.
    pub fn check_actuated(&self, what: &'static str, values: &DVector<f64>) -> Result<()> {
        if values.len() == self.actuated_count() {
            Ok(())
        } else {
            Err(BodyError::dimension_mismatch(
                what,
                self.actuated_count(),
                values.len(),
            ))
        }
    }
}

/// Positions left after removing the non-actuated joints, counted the same
/// way [`KinematicsAdapter::actuated`] selects them.
fn actuated_joint_count(model: &dyn BodyModel) -> usize {
    let not_actuated = model.not_actuated_joint_indices();
    (0..model.qpos_dim())
        .filter(|i| !not_actuated.contains(i))
        .count()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::walker2d::Walker2d;
    use approx::assert_relative_eq;
    use mimic_types::{FootContacts, GeomContact};

    #[derive(Debug)]
    struct Broken;

    impl BodyModel for Broken {
        fn name(&self) -> &str {
            "broken"
        }
        fn qpos_dim(&self) -> usize {
            4
        }
        fn qvel_dim(&self) -> usize {
            4
        }
        fn com_indices(&self) -> &[usize] {
            &[0]
        }
        fn not_actuated_joint_indices(&self) -> &[usize] {
            &[0, 1]
        }
        fn max_actuator_velocities(&self) -> DVector<f64> {
            DVector::from_vec(vec![1.0, 1.0, 1.0])
        }
        fn com_height_index(&self) -> usize {
            1
        }
        fn trunk_rotation_index(&self) -> usize {
            1
        }
        fn has_ground_contact(&self, _contacts: &[GeomContact]) -> FootContacts {
            FootContacts::default()
        }
    }

    /// Lists a non-actuated joint twice.
    #[derive(Debug)]
    struct Repeated;

    impl BodyModel for Repeated {
        fn name(&self) -> &str {
            "repeated"
        }
        fn qpos_dim(&self) -> usize {
            2
        }
        fn qvel_dim(&self) -> usize {
            2
        }
        fn com_indices(&self) -> &[usize] {
            &[0]
        }
        fn not_actuated_joint_indices(&self) -> &[usize] {
            &[0, 0, 1]
        }
        fn max_actuator_velocities(&self) -> DVector<f64> {
            DVector::zeros(0)
        }
        fn com_height_index(&self) -> usize {
            1
        }
        fn trunk_rotation_index(&self) -> usize {
            1
        }
        fn has_ground_contact(&self, _contacts: &[GeomContact]) -> FootContacts {
            FootContacts::default()
        }
    }

    fn adapter() -> KinematicsAdapter {
        KinematicsAdapter::new(Walker2d::new()).unwrap()
    }

    #[test]
    fn exclusion_groups() {
        let adapter = adapter();
        let qvel = DVector::from_fn(9, |i, _| i as f64 * 10.0);
        assert_eq!(
            adapter.exclude(&qvel, Exclusion::Com).as_slice(),
            &[20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0]
        );
        assert_eq!(adapter.actuated(&qvel).len(), 6);
        assert_eq!(adapter.actuated_count(), 6);
    }

    #[test]
    fn max_deltas_scale_with_control_rate() {
        let deltas = adapter().max_qpos_deltas(200.0, 2.0);
        assert_relative_eq!(deltas[0], 2.0 * 6.0 / 200.0);
        assert_relative_eq!(deltas[1], 2.0 * 12.0 / 200.0);
    }

    #[test]
    fn dimension_checks() {
        let adapter = adapter();
        assert!(adapter.check_dims(&Kinematics::zeros(9, 9)).is_ok());
        assert!(matches!(
            adapter.check_dims(&Kinematics::zeros(8, 9)),
            Err(BodyError::DimensionMismatch { what: "qpos", .. })
        ));
        assert!(adapter.check_dims(&Kinematics::zeros(9, 10)).is_err());

        assert!(adapter.check_actuated("targets", &DVector::zeros(6)).is_ok());
        assert!(adapter.check_actuated("targets", &DVector::zeros(5)).is_err());
    }

    #[test]
    fn rejects_inconsistent_model() {
        let err = KinematicsAdapter::new(Broken).unwrap_err();
        assert!(err.to_string().contains("3 actuator velocities for 2 actuated joints"));
    }

    #[test]
    fn rejects_repeated_non_actuated_index() {
        let err = KinematicsAdapter::new(Repeated).unwrap_err();
        assert!(matches!(err, BodyError::InvalidModel(_)));
        assert!(err.to_string().contains("index 0 repeated"));
    }

    #[test]
    fn actuated_count_matches_selection() {
        let adapter = adapter();
        let qpos = DVector::from_fn(9, |i, _| i as f64);
        assert_eq!(adapter.actuated_count(), adapter.actuated(&qpos).len());
    }
}
