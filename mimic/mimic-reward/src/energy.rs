//! Joint power and energy efficiency.

use mimic_types::ForceRange;
use nalgebra::DVector;

use crate::error::{Result, RewardError};

/// Squared joint power as a fraction of the squared peak power the
/// actuators can deliver: `sum((|tau| |v|)^2) / sum((tau_max v_max)^2)`.
///
/// `qvel_actuated` holds the velocities of the actuated joints only, in
/// actuator order.
///
/// # Errors
///
/// Returns an error if the inputs differ in length.
///
/// # Example
///
/// ```
/// use mimic_reward::joint_power_normed;
/// use mimic_types::ForceRange;
/// use nalgebra::DVector;
///
/// let ranges = [ForceRange::symmetric(100.0); 2];
/// let max_vels = DVector::from_vec(vec![10.0, 10.0]);
/// let torques = DVector::from_vec(vec![100.0, 0.0]);
/// let qvel = DVector::from_vec(vec![-10.0, 5.0]);
///
/// let power = joint_power_normed(&torques, &ranges, &qvel, &max_vels)?;
/// assert!((power - 0.5).abs() < 1e-12);
/// # Ok::<(), mimic_reward::RewardError>(())
/// ```
pub fn joint_power_normed(
    torques: &DVector<f64>,
    force_ranges: &[ForceRange],
    qvel_actuated: &DVector<f64>,
    max_velocities: &DVector<f64>,
) -> Result<f64> {
    RewardError::check_len("force ranges", torques.len(), force_ranges.len())?;
    RewardError::check_len("actuated velocities", max_velocities.len(), qvel_actuated.len())?;
    RewardError::check_len("max velocities", torques.len(), max_velocities.len())?;

    let power: f64 = torques
        .iter()
        .zip(qvel_actuated.iter())
        .map(|(tau, v)| (tau.abs() * v.abs()).powi(2))
        .sum();
    let peak: f64 = force_ranges
        .iter()
        .zip(max_velocities.iter())
        .map(|(range, v)| (range.peak() * v).powi(2))
        .sum();

    Ok(power / peak)
}

/// `1 - joint_power_normed`.
///
/// # Errors
///
/// Returns [`RewardError::EnergyOutOfBounds`] if the result exceeds 1 or is
/// not a number. The value is never clamped.
pub fn energy_reward(joint_power_normed: f64) -> Result<f64> {
    let reward = 1.0 - joint_power_normed;
    if reward <= 1.0 {
        Ok(reward)
    } else {
        Err(RewardError::EnergyOutOfBounds(reward))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn full_power_is_one() {
        let ranges = [ForceRange::symmetric(50.0), ForceRange::new(-20.0, 80.0)];
        let max_vels = DVector::from_vec(vec![6.0, 12.0]);
        let torques = DVector::from_vec(vec![-50.0, 80.0]);
        let power = joint_power_normed(&torques, &ranges, &max_vels, &max_vels).unwrap();
        assert_relative_eq!(power, 1.0, epsilon = 1e-12);
        assert_relative_eq!(energy_reward(power).unwrap(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn idle_joints_use_no_power() {
        let ranges = [ForceRange::symmetric(50.0); 3];
        let max_vels = DVector::from_vec(vec![6.0, 12.0, 12.0]);
        let power =
            joint_power_normed(&DVector::zeros(3), &ranges, &DVector::zeros(3), &max_vels).unwrap();
        assert_eq!(power, 0.0);
        assert_eq!(energy_reward(power).unwrap(), 1.0);
    }

    #[test]
    fn shape_mismatch_is_error() {
        let ranges = [ForceRange::symmetric(50.0); 2];
        let max_vels = DVector::from_vec(vec![6.0, 12.0]);
        assert!(joint_power_normed(&DVector::zeros(3), &ranges, &DVector::zeros(2), &max_vels).is_err());
        assert!(joint_power_normed(&DVector::zeros(2), &ranges, &DVector::zeros(3), &max_vels).is_err());
    }

    #[test]
    fn energy_reward_is_not_clamped() {
        assert!(matches!(
            energy_reward(-0.5),
            Err(RewardError::EnergyOutOfBounds(r)) if (r - 1.5).abs() < 1e-12
        ));
        assert!(energy_reward(f64::NAN).is_err());
        // Above peak power the reward goes negative but stays valid
        assert_relative_eq!(energy_reward(1.5).unwrap(), -0.5);
    }
}
