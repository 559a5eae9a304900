//! Load integration and output clamps.

use crate::compressibility::corrected_drag;
use crate::inflow::{ControlPoint, StationState};
use crate::output::RotorPerformance;
use rf_core::numeric::finite_or;
use rf_core::units::{newton_meters, newtons, watts};
use std::f64::consts::TAU;

/// Drag-to-lift ratio substituted where Cd/Cl is not finite.
pub const EPSILON_FALLBACK: f64 = 10.0;

/// Elemental loads of one station on the BEMT branch.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StationLoads {
    /// Corrected drag coefficient
    pub cd: f64,
    /// dT/dR per blade [N/m]
    pub dt_d_radius: f64,
    /// dQ/dR per blade [N]
    pub dq_d_radius: f64,
}

/// Momentum-circulation loads at cell (`i`, `j`).
pub fn station_loads(point: &ControlPoint, state: &StationState, i: usize, j: usize, r: f64) -> StationLoads {
    let c = state.cell(i, j);
    let cd = corrected_drag(c.cd, c.mach, point.temperature);
    let epsilon = finite_or(cd / c.cl, EPSILON_FALLBACK);
    let rho_gamma = point.density * c.gamma_m;
    StationLoads {
        cd,
        dt_d_radius: rho_gamma * (c.wt - epsilon * c.wa),
        dq_d_radius: rho_gamma * (c.wa + epsilon * c.wt) * r,
    }
}

/// Integrate per-blade elemental loads into rotor performance.
///
/// `thrust_elements` and `torque_elements` are per-blade loads already multiplied by the
/// element width. Coefficients are floored at zero and, like the efficiency, vanish for
/// a stopped rotor. Thrust, torque and power vanish for non-positive throttle; thrust
/// flips sign for negative rotation.
pub fn integrate(
    point: &ControlPoint,
    blade_count: u32,
    tip_radius: f64,
    thrust_elements: impl IntoIterator<Item = f64>,
    torque_elements: impl IntoIterator<Item = f64>,
) -> RotorPerformance {
    let b = f64::from(blade_count);
    let mut thrust = b * thrust_elements.into_iter().sum::<f64>();
    let mut torque = b * torque_elements.into_iter().sum::<f64>();
    let omega = point.omega;
    let mut power = omega.abs() * torque;

    let n = omega.abs() / TAU;
    let d = 2.0 * tip_radius;
    let rho = point.density;
    let mut ct = (thrust / (rho * n.powi(2) * d.powi(4))).max(0.0);
    let mut cq = (torque / (rho * n.powi(2) * d.powi(5))).max(0.0);
    let mut cp = (power / (rho * n.powi(3) * d.powi(5))).max(0.0);
    let mut efficiency = finite_or(point.axial_velocity() * thrust / power, 0.0);

    if point.throttle <= 0.0 {
        thrust = 0.0;
        torque = 0.0;
        power = 0.0;
    }
    if omega < 0.0 {
        thrust = -thrust;
    }
    if omega == 0.0 {
        thrust = 0.0;
        torque = 0.0;
        power = 0.0;
        ct = 0.0;
        cq = 0.0;
        cp = 0.0;
        efficiency = 0.0;
    }

    RotorPerformance {
        thrust: newtons(thrust),
        torque: newton_meters(torque),
        power: watts(power),
        thrust_coefficient: ct,
        torque_coefficient: cq,
        power_coefficient: cp,
        thrust_per_blade: newtons(thrust / b),
        torque_per_blade: newton_meters(torque / b),
        propulsive_efficiency: efficiency,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    fn point(omega: f64, throttle: f64) -> ControlPoint {
        ControlPoint {
            v_thrust: Vector3::new(10.0, 0.0, 0.0),
            ua: 10.0,
            omega,
            density: 1.225,
            nu: 1.5e-5,
            speed_of_sound: 340.0,
            temperature: 288.15,
            throttle,
        }
    }

    #[test]
    fn sums_blades_and_forms_coefficients() {
        let p = integrate(&point(TAU * 50.0, 1.0), 2, 0.5, [10.0, 20.0], [1.0, 2.0]);
        assert_eq!(p.thrust.value, 60.0);
        assert_eq!(p.torque.value, 6.0);
        assert!((p.power.value - 6.0 * TAU * 50.0).abs() < 1e-9);
        // n = 50 rev/s, D = 1 m
        assert!((p.thrust_coefficient - 60.0 / (1.225 * 2500.0)).abs() < 1e-12);
        assert!((p.torque_coefficient - 6.0 / (1.225 * 2500.0)).abs() < 1e-12);
        assert_eq!(p.thrust_per_blade.value, 30.0);
        assert!((p.propulsive_efficiency - 600.0 / p.power.value).abs() < 1e-12);
    }

    #[test]
    fn stopped_rotor_is_all_zero() {
        let p = integrate(&point(0.0, 1.0), 3, 1.0, [5.0], [5.0]);
        assert_eq!(p.thrust.value, 0.0);
        assert_eq!(p.torque.value, 0.0);
        assert_eq!(p.power.value, 0.0);
        assert_eq!(p.thrust_coefficient, 0.0);
        assert_eq!(p.torque_coefficient, 0.0);
        assert_eq!(p.power_coefficient, 0.0);
        assert_eq!(p.propulsive_efficiency, 0.0);
    }

    #[test]
    fn zero_throttle_zeroes_loads_only() {
        let p = integrate(&point(100.0, 0.0), 2, 1.0, [5.0], [1.0]);
        assert_eq!(p.thrust.value, 0.0);
        assert_eq!(p.torque.value, 0.0);
        assert_eq!(p.power.value, 0.0);
        assert!(p.thrust_coefficient > 0.0);
    }

    #[test]
    fn reverse_rotation_flips_thrust() {
        let fwd = integrate(&point(100.0, 1.0), 2, 1.0, [5.0], [1.0]);
        let rev = integrate(&point(-100.0, 1.0), 2, 1.0, [5.0], [1.0]);
        assert_eq!(rev.thrust.value, -fwd.thrust.value);
        assert_eq!(rev.power.value, fwd.power.value);
        assert_eq!(rev.thrust_coefficient, fwd.thrust_coefficient);
    }

    #[test]
    fn negative_loads_floor_coefficients() {
        let p = integrate(&point(100.0, 1.0), 2, 1.0, [-5.0], [-1.0]);
        assert_eq!(p.thrust_coefficient, 0.0);
        assert_eq!(p.torque_coefficient, 0.0);
        assert_eq!(p.power_coefficient, 0.0);
    }
}
