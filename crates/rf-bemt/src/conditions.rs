//! Operating conditions and the thrust-frame velocity transform.

use crate::error::{BemtError, BemtResult};
use nalgebra::{Matrix3, Rotation3, Vector3};
use rf_core::numeric::finite_or;
use rf_core::units::{AngularVelocity, Density, DynVisc, Temperature, Velocity};
use rf_core::units::{k, kg_per_m3, mps, pa_s};

/// Freestream and rotor state at one control point.
#[derive(Clone, Debug)]
pub struct OperatingCondition {
    pub density: Density,
    pub dynamic_viscosity: DynVisc,
    pub speed_of_sound: Velocity,
    pub temperature: Temperature,
    /// Vehicle velocity in the inertial frame [m/s]
    pub velocity: Vector3<f64>,
    /// Body → inertial rotation
    pub body_to_inertial: Rotation3<f64>,
    /// Rotor angular speed; the sign encodes rotation sense
    pub omega: AngularVelocity,
    pub throttle: f64,
}

impl OperatingCondition {
    /// Freestream state with the vehicle at rest, level attitude, rotor stopped and
    /// full throttle.
    pub fn new(
        density: Density,
        dynamic_viscosity: DynVisc,
        speed_of_sound: Velocity,
        temperature: Temperature,
    ) -> Self {
        Self {
            density,
            dynamic_viscosity,
            speed_of_sound,
            temperature,
            velocity: Vector3::zeros(),
            body_to_inertial: Rotation3::identity(),
            omega: AngularVelocity::default(),
            throttle: 1.0,
        }
    }

    /// ISA sea-level freestream.
    pub fn sea_level() -> Self {
        Self::new(kg_per_m3(1.225), pa_s(1.789_4e-5), mps(340.294), k(288.15))
    }

    pub fn with_velocity(mut self, velocity: Vector3<f64>) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_attitude(mut self, body_to_inertial: Rotation3<f64>) -> Self {
        self.body_to_inertial = body_to_inertial;
        self
    }

    pub fn with_omega(mut self, omega: AngularVelocity) -> Self {
        self.omega = omega;
        self
    }

    pub fn with_throttle(mut self, throttle: f64) -> Self {
        self.throttle = throttle;
        self
    }

    /// Kinematic viscosity ν = μ/ρ [m²/s]
    pub fn kinematic_viscosity(&self) -> f64 {
        self.dynamic_viscosity.value / self.density.value
    }

    /// Check physical plausibility of the freestream state.
    pub fn validate(&self, index: usize) -> BemtResult<()> {
        let invalid = |what: &str| BemtError::InvalidCondition {
            index,
            what: what.to_string(),
        };
        let positive = |v: f64| v.is_finite() && v > 0.0;

        if !positive(self.density.value) {
            return Err(invalid("density must be positive"));
        }
        if !positive(self.dynamic_viscosity.value) {
            return Err(invalid("dynamic viscosity must be positive"));
        }
        if !positive(self.speed_of_sound.value) {
            return Err(invalid("speed of sound must be positive"));
        }
        if !positive(self.temperature.value) {
            return Err(invalid("temperature must be positive"));
        }
        if self.velocity.iter().any(|v| !v.is_finite()) {
            return Err(invalid("velocity must be finite"));
        }
        if !self.omega.value.is_finite() {
            return Err(invalid("omega must be finite"));
        }
        if !self.throttle.is_finite() {
            return Err(invalid("throttle must be finite"));
        }
        Ok(())
    }
}

/// Body → thrust-frame rotation for a thrust line tilted by `theta` about body y.
pub fn body_to_thrust(theta: f64) -> Matrix3<f64> {
    let (s, c) = theta.sin_cos();
    Matrix3::new(c, 0.0, s, 0.0, 1.0, 0.0, -s, 0.0, c)
}

/// Express the inertial velocity in the thrust-aligned frame.
///
/// inertial → body uses the transpose of body → inertial, then body → thrust applies
/// the transpose of [`body_to_thrust`].
pub fn thrust_frame_velocity(condition: &OperatingCondition, theta: f64) -> Vector3<f64> {
    let v_body = condition.body_to_inertial.inverse() * condition.velocity;
    body_to_thrust(theta).transpose() * v_body
}

/// Advance and inflow ratios at one control point.
///
/// All ratios use the tip speed |Ω|R and are reported as zero when the rotor is
/// stopped.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct InflowRatios {
    /// Rotor advance ratio (in-plane velocity / tip speed)
    pub mu: f64,
    /// Total inflow ratio (axial free stream plus induced hover velocity)
    pub lambda_total: f64,
    /// Free-stream axial inflow ratio
    pub lambda_c: f64,
    /// Induced inflow ratio
    pub lambda_i: f64,
}

impl InflowRatios {
    pub fn new(v_thrust: &Vector3<f64>, ua_induced: f64, omega: f64, tip_radius: f64) -> Self {
        let tip_speed = omega.abs() * tip_radius;
        let ratio = |v: f64| finite_or(v / tip_speed, 0.0);
        Self {
            mu: ratio(v_thrust[2]),
            lambda_total: ratio(v_thrust[0] + ua_induced),
            lambda_c: ratio(v_thrust[0]),
            lambda_i: ratio(ua_induced),
        }
    }
}
