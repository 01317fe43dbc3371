//! Physics collaborator interface and a headless kinematic backend.

use mimic_body::{BodyModel, remove_by_indices};
use mimic_types::{ForceRange, GeomContact, Kinematics};
use nalgebra::DVector;

use crate::error::{EnvError, Result};

/// What the imitation environment needs from a physics simulator.
///
/// Rigid-body dynamics, contact resolution and rendering stay inside the
/// simulator; the environment only reads state, writes state and actuator
/// targets, and advances time.
pub trait Physics {
    /// Joint positions.
    fn qpos(&self) -> DVector<f64>;

    /// Joint velocities.
    fn qvel(&self) -> DVector<f64>;

    /// Joint positions and velocities together.
    fn kinematics(&self) -> Kinematics {
        Kinematics::new(self.qpos(), self.qvel())
    }

    /// Current actuator forces, one per actuator.
    fn actuator_force(&self) -> DVector<f64>;

    /// Force limits, one per actuator.
    fn actuator_force_range(&self) -> Vec<ForceRange>;

    /// Currently active geom contacts.
    fn contacts(&self) -> Vec<GeomContact>;

    /// Simulation time in seconds.
    fn time(&self) -> f64;

    /// Sets the integration timestep in seconds.
    fn set_timestep(&mut self, dt: f64);

    /// Replaces joint positions and velocities, keeping simulation time.
    ///
    /// # Errors
    ///
    /// Returns an error if the dimensions do not match the model.
    fn set_kinematics(&mut self, kinematics: &Kinematics) -> Result<()>;

    /// Sets actuator targets.
    ///
    /// # Errors
    ///
    /// Returns an error if the length does not match the actuators.
    fn set_ctrl(&mut self, ctrl: &DVector<f64>) -> Result<()>;

    /// Advances the simulation by `n` timesteps.
    ///
    /// # Errors
    ///
    /// Returns an error if the simulation becomes unstable.
    fn step(&mut self, n: usize) -> Result<()>;

    /// Recomputes derived quantities without advancing time.
    fn forward(&mut self);
}

/// Gains of the position servos driving the actuated joints.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ServoGains {
    /// Proportional gain (force per radian).
    pub kp: f64,
    /// Derivative gain (force per radian per second).
    pub kd: f64,
    /// Rate at which a joint closes the gap to its target (1/s).
    pub tracking_rate: f64,
}

impl Default for ServoGains {
    fn default() -> Self {
        Self {
            kp: 300.0,
            kd: 10.0,
            tracking_rate: 50.0,
        }
    }
}

/// Headless physics backend without dynamics.
///
/// Passive joints keep their velocity and integrate `qpos += qvel * dt`.
/// Actuated joints behave like ideal first-order position servos: their
/// velocity is proportional to the distance to the target, and the reported
/// actuator force is the PD servo force clipped to the actuator's range.
///
/// Useful for reference playback, tests and offline evaluation.
///
/// # Example
///
/// ```
/// use mimic_env::{KinematicPhysics, Physics};
/// use mimic_body::Walker2d;
/// use mimic_types::ForceRange;
///
/// let mut physics = KinematicPhysics::for_body(&Walker2d::new(), ForceRange::symmetric(100.0));
/// physics.set_timestep(0.001);
/// physics.step(5)?;
/// assert!((physics.time() - 0.005).abs() < 1e-12);
/// # Ok::<(), mimic_env::EnvError>(())
/// ```
#[derive(Debug, Clone)]
pub struct KinematicPhysics {
    state: Kinematics,
    ctrl: DVector<f64>,
    actuated: Vec<usize>,
    force_ranges: Vec<ForceRange>,
    forces: DVector<f64>,
    contacts: Vec<GeomContact>,
    gains: ServoGains,
    time: f64,
    timestep: f64,
}

impl KinematicPhysics {
    /// Creates a backend with zero state.
    ///
    /// # Errors
    ///
    /// Returns an error if an actuated index is outside `qpos`/`qvel` or
    /// the number of force ranges differs from the number of actuators.
    pub fn new(
        nq: usize,
        nv: usize,
        actuated: Vec<usize>,
        force_ranges: Vec<ForceRange>,
    ) -> Result<Self> {
        if let Some(&bad) = actuated.iter().find(|&&i| i >= nq.min(nv)) {
            return Err(EnvError::physics(format!(
                "actuated joint {bad} outside {nq} positions / {nv} velocities"
            )));
        }
        if actuated.len() != force_ranges.len() {
            return Err(EnvError::physics(format!(
                "{} force ranges for {} actuators",
                force_ranges.len(),
                actuated.len()
            )));
        }
        let n_act = actuated.len();
        Ok(Self {
            state: Kinematics::zeros(nq, nv),
            ctrl: DVector::zeros(n_act),
            actuated,
            force_ranges,
            forces: DVector::zeros(n_act),
            contacts: Vec::new(),
            gains: ServoGains::default(),
            time: 0.0,
            timestep: 0.002,
        })
    }

    /// Creates a backend for a body model with the same force range on
    /// every actuator.
    #[must_use]
    pub fn for_body(body: &dyn BodyModel, force_range: ForceRange) -> Self {
        let all: Vec<usize> = (0..body.qpos_dim()).collect();
        let actuated = remove_by_indices(&all, body.not_actuated_joint_indices());
        let n_act = actuated.len();
        Self {
            state: Kinematics::zeros(body.qpos_dim(), body.qvel_dim()),
            ctrl: DVector::zeros(n_act),
            force_ranges: vec![force_range; n_act],
            forces: DVector::zeros(n_act),
            actuated,
            contacts: Vec::new(),
            gains: ServoGains::default(),
            time: 0.0,
            timestep: 0.002,
        }
    }

    /// Sets the servo gains.
    #[must_use]
    pub const fn with_gains(mut self, gains: ServoGains) -> Self {
        self.gains = gains;
        self
    }

    /// Replaces the reported contacts.
    pub fn set_contacts(&mut self, contacts: Vec<GeomContact>) {
        self.contacts = contacts;
    }

    /// Current integration timestep.
    #[must_use]
    pub const fn timestep(&self) -> f64 {
        self.timestep
    }

    /// Current actuator targets.
    #[must_use]
    pub const fn ctrl(&self) -> &DVector<f64> {
        &self.ctrl
    }

    fn update_servos(&mut self, track: bool) {
        for (k, &joint) in self.actuated.iter().enumerate() {
            let error = self.ctrl[k] - self.state.qpos[joint];
            if track {
                self.state.qvel[joint] = error * self.gains.tracking_rate;
            }
            let force = self.gains.kp * error - self.gains.kd * self.state.qvel[joint];
            let range = self.force_ranges[k];
            self.forces[k] = force.clamp(range.lower, range.upper);
        }
    }
}

impl Physics for KinematicPhysics {
    fn qpos(&self) -> DVector<f64> {
        self.state.qpos.clone()
    }

    fn qvel(&self) -> DVector<f64> {
        self.state.qvel.clone()
    }

    fn actuator_force(&self) -> DVector<f64> {
        self.forces.clone()
    }

    fn actuator_force_range(&self) -> Vec<ForceRange> {
        self.force_ranges.clone()
    }

    fn contacts(&self) -> Vec<GeomContact> {
        self.contacts.clone()
    }

    fn time(&self) -> f64 {
        self.time
    }

    fn set_timestep(&mut self, dt: f64) {
        self.timestep = dt;
    }

    fn set_kinematics(&mut self, kinematics: &Kinematics) -> Result<()> {
        if kinematics.nq() != self.state.nq() || kinematics.nv() != self.state.nv() {
            return Err(EnvError::physics(format!(
                "state of size ({}, {}) for model of size ({}, {})",
                kinematics.nq(),
                kinematics.nv(),
                self.state.nq(),
                self.state.nv()
            )));
        }
        self.state = kinematics.clone();
        Ok(())
    }

    fn set_ctrl(&mut self, ctrl: &DVector<f64>) -> Result<()> {
        if ctrl.len() != self.ctrl.len() {
            return Err(EnvError::physics(format!(
                "{} controls for {} actuators",
                ctrl.len(),
                self.ctrl.len()
            )));
        }
        self.ctrl.copy_from(ctrl);
        Ok(())
    }

    fn step(&mut self, n: usize) -> Result<()> {
        let shared = self.state.nq().min(self.state.nv());
        for _ in 0..n {
            self.update_servos(true);
            for i in 0..shared {
                self.state.qpos[i] += self.state.qvel[i] * self.timestep;
            }
            self.time += self.timestep;
        }
        if self.state.is_finite() {
            Ok(())
        } else {
            Err(EnvError::physics(format!(
                "simulation diverged at t = {:.4}",
                self.time
            )))
        }
    }

    fn forward(&mut self) {
        self.update_servos(false);
    }
}
