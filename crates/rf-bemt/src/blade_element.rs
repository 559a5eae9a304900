//! Azimuthally resolved blade-element loads.
//!
//! Runs on top of a converged inflow state: the inflow ratio λw of each station is held
//! fixed while the in-plane velocity varies around the disk with the advance ratio. An
//! optional wake field perturbs the local velocities. Control points are independent
//! here and are evaluated in parallel; results keep input order.

use crate::compressibility::corrected_drag;
use crate::conditions::InflowRatios;
use crate::geometry::{BladeGeometry, Rotation};
use crate::inflow::{ControlPoint, InflowProblem, StationState};
use crate::output::DiscDistributions;
use crate::wake::WakeField;
use nalgebra::{DMatrix, Vector3};
use rayon::prelude::*;
use rf_core::numeric::finite_or;

/// Stations outboard of this normalized radius carry no lift.
pub const TIP_LOSS_CUTOFF: f64 = 0.97;

/// Local disk-frame velocities at one blade element [m/s].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ElementVelocity {
    pub tangential: f64,
    pub radial: f64,
    pub axial: f64,
}

/// Velocities at (`chi`, `azimuth`) including an optional wake contribution.
///
/// `wake` holds the normalized (ua, uv, uw) triple; it is scaled by the axial free
/// stream `v_axial` and oriented by the rotation sense.
pub fn element_velocity(
    tip_speed: f64,
    chi: f64,
    azimuth: f64,
    mu: f64,
    lambda: f64,
    wake: Option<(Vector3<f64>, f64, Rotation)>,
) -> ElementVelocity {
    let (sin_psi, cos_psi) = azimuth.sin_cos();
    let mut v = ElementVelocity {
        tangential: tip_speed * (chi + mu * sin_psi),
        radial: tip_speed * mu * cos_psi,
        axial: tip_speed * lambda,
    };
    if let Some((u, v_axial, rotation)) = wake {
        let (ua, uv, uw) = (u[0], u[1], u[2]);
        v.tangential += rotation.sign() * v_axial * (-uw * cos_psi + uv * sin_psi);
        v.radial += v_axial * (-uw * sin_psi - uv * cos_psi);
        v.axial += v_axial * ua;
    }
    v
}

/// Normal and tangential force per unit span from lift and drag at inflow angle `phi`.
///
/// Returns `(dFz, dFx)` with dFz = dL cosφ − dD sinφ and dFx = dL sinφ − dD cosφ.
pub fn element_forces(d_lift: f64, d_drag: f64, phi: f64) -> (f64, f64) {
    let (sin_phi, cos_phi) = phi.sin_cos();
    (
        d_lift * cos_phi - d_drag * sin_phi,
        d_lift * sin_phi - d_drag * cos_phi,
    )
}

/// Blade-element results for one control point.
#[derive(Clone, Debug)]
pub struct BladeElementPoint {
    pub disc: DiscDistributions,
    /// Azimuth-mean per-blade elemental thrust [N]
    pub thrust_distribution: Vec<f64>,
    /// Azimuth-mean per-blade elemental torque [N·m]
    pub torque_distribution: Vec<f64>,
    /// Azimuth-mean dT/dR [N/m]
    pub dt_d_radius: Vec<f64>,
    /// Azimuth-mean dQ/dR [N]
    pub dq_d_radius: Vec<f64>,
}

/// Evaluate the blade-element branch for every control point.
pub fn blade_element_loads(
    problem: &InflowProblem<'_>,
    state: &StationState,
    ratios: &[InflowRatios],
    wake: Option<&dyn WakeField>,
) -> Vec<BladeElementPoint> {
    problem
        .control_points()
        .par_iter()
        .enumerate()
        .map(|(i, point)| evaluate_point(problem, state, i, point, ratios[i].mu, wake))
        .collect()
}

fn evaluate_point(
    problem: &InflowProblem<'_>,
    state: &StationState,
    i: usize,
    point: &ControlPoint,
    mu: f64,
    wake: Option<&dyn WakeField>,
) -> BladeElementPoint {
    let geometry: &BladeGeometry = problem.geometry();
    let polars = problem.station_polars();
    let azimuths = geometry.azimuths();
    let (na, nr) = (azimuths.len(), geometry.station_count());
    let tip_radius = geometry.tip_radius();
    let tip_speed = point.omega.abs() * tip_radius;
    let delta_r = geometry.delta_r();
    let origin = geometry.origin();
    let pitch = geometry.total_pitch();
    let v_axial = point.axial_velocity();

    let mut disc = DiscDistributions {
        axial_velocity: DMatrix::zeros(na, nr),
        tangential_velocity: DMatrix::zeros(na, nr),
        radial_velocity: DMatrix::zeros(na, nr),
        axial_induced_velocity: DMatrix::from_fn(na, nr, |_, j| state.cell(i, j).va),
        tangential_induced_velocity: DMatrix::from_fn(na, nr, |_, j| state.cell(i, j).vt),
        lift_coefficient: DMatrix::zeros(na, nr),
        drag_coefficient: DMatrix::zeros(na, nr),
        circulation: DMatrix::zeros(na, nr),
        thrust: DMatrix::zeros(na, nr),
        torque: DMatrix::zeros(na, nr),
    };
    let mut d_fz_sum = vec![0.0; nr];
    let mut d_fx_sum = vec![0.0; nr];

    for (k, &psi) in azimuths.iter().enumerate() {
        for j in 0..nr {
            let chi = geometry.stations()[j];
            let r = chi * tip_radius;
            let chord = geometry.chord()[j];

            let induced = wake.and_then(|field| {
                let y = origin[1] + r * psi.cos();
                let z = origin[2] + r * psi.sin();
                field
                    .induced_velocity(y, z)
                    .map(|u| (u, v_axial, geometry.rotation()))
            });
            let vel = element_velocity(tip_speed, chi, psi, mu, state.cell(i, j).lambda_w, induced);

            let u = (vel.tangential.powi(2) + vel.axial.powi(2) + vel.radial.powi(2)).sqrt();
            let phi = finite_or((vel.axial / vel.tangential).atan(), 0.0);
            let alpha = pitch[j] - phi;
            let reynolds = u * chord / point.nu;
            let mach = u / point.speed_of_sound;
            let coeffs = polars[j].coefficients(reynolds, alpha);
            let cd = corrected_drag(coeffs.cd, mach, point.temperature);

            let q_c = 0.5 * point.density * u * u * chord;
            let d_lift = if chi > TIP_LOSS_CUTOFF { 0.0 } else { q_c * coeffs.cl };
            let d_drag = q_c * cd;
            let (d_fz, d_fx) = element_forces(d_lift, d_drag, phi);

            disc.axial_velocity[(k, j)] = vel.axial;
            disc.tangential_velocity[(k, j)] = vel.tangential;
            disc.radial_velocity[(k, j)] = vel.radial;
            disc.lift_coefficient[(k, j)] = coeffs.cl;
            disc.drag_coefficient[(k, j)] = cd;
            disc.circulation[(k, j)] = 0.5 * u * chord * coeffs.cl;
            disc.thrust[(k, j)] = d_fz * delta_r;
            disc.torque[(k, j)] = d_fx * r * delta_r;
            d_fz_sum[j] += d_fz;
            d_fx_sum[j] += d_fx;
        }
    }

    let n = na as f64;
    let radii = geometry.radii();
    let dt_d_radius: Vec<f64> = d_fz_sum.iter().map(|s| s / n).collect();
    let dq_d_radius: Vec<f64> = d_fx_sum.iter().zip(&radii).map(|(s, r)| s / n * r).collect();

    BladeElementPoint {
        thrust_distribution: dt_d_radius.iter().map(|g| g * delta_r).collect(),
        torque_distribution: dq_d_radius.iter().map(|g| g * delta_r).collect(),
        dt_d_radius,
        dq_d_radius,
        disc,
    }
}
