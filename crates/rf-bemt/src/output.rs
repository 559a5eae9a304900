//! Rotor solve results.

use crate::conditions::InflowRatios;
use crate::geometry::FidelityMode;
use crate::newton::Termination;
use nalgebra::DMatrix;
use rf_core::units::{Force, Power, Torque};

/// Integrated performance at one control point.
#[derive(Clone, Debug, PartialEq)]
pub struct RotorPerformance {
    /// Thrust along the thrust line; negative when the rotor spins backwards
    pub thrust: Force,
    pub torque: Torque,
    pub power: Power,
    /// Ct = T/(ρn²D⁴)
    pub thrust_coefficient: f64,
    /// Cq = Q/(ρn²D⁵)
    pub torque_coefficient: f64,
    /// Cp = P/(ρn³D⁵)
    pub power_coefficient: f64,
    pub thrust_per_blade: Force,
    pub torque_per_blade: Torque,
    /// η = V·T/P
    pub propulsive_efficiency: f64,
}

/// Per-station distributions, each a [control point × station] matrix.
#[derive(Clone, Debug)]
pub struct StationDistributions {
    /// Station radii [m]
    pub radii: Vec<f64>,
    pub inflow_angle: DMatrix<f64>,
    /// Circulation used for the loads [m²/s]
    pub circulation: DMatrix<f64>,
    pub axial_velocity: DMatrix<f64>,
    pub tangential_velocity: DMatrix<f64>,
    pub axial_induced_velocity: DMatrix<f64>,
    pub tangential_induced_velocity: DMatrix<f64>,
    pub angle_of_attack: DMatrix<f64>,
    pub reynolds: DMatrix<f64>,
    pub mach: DMatrix<f64>,
    pub lift_coefficient: DMatrix<f64>,
    /// Compressibility-corrected drag coefficient
    pub drag_coefficient: DMatrix<f64>,
    /// Per-blade elemental thrust [N]
    pub thrust_distribution: DMatrix<f64>,
    /// Per-blade elemental torque [N·m]
    pub torque_distribution: DMatrix<f64>,
    /// dT/dR [N/m]
    pub dt_d_radius: DMatrix<f64>,
    /// dQ/dR [N]
    pub dq_d_radius: DMatrix<f64>,
    /// dT/dχ = dT/dR·R, χ = r/R [N]
    pub dt_d_chi: DMatrix<f64>,
    /// dQ/dχ = dQ/dR·R [N·m]
    pub dq_d_chi: DMatrix<f64>,
}

/// Azimuth-resolved distributions at one control point, each [azimuth × station].
///
/// On the BEMT branch every azimuth row repeats the station values.
#[derive(Clone, Debug)]
pub struct DiscDistributions {
    pub axial_velocity: DMatrix<f64>,
    pub tangential_velocity: DMatrix<f64>,
    pub radial_velocity: DMatrix<f64>,
    pub axial_induced_velocity: DMatrix<f64>,
    pub tangential_induced_velocity: DMatrix<f64>,
    pub lift_coefficient: DMatrix<f64>,
    pub drag_coefficient: DMatrix<f64>,
    pub circulation: DMatrix<f64>,
    pub thrust: DMatrix<f64>,
    pub torque: DMatrix<f64>,
}

impl DiscDistributions {
    /// Repeat station rows `i` of the given matrices over `azimuths` rows.
    pub(crate) fn replicated(stations: &StationDistributions, i: usize, azimuths: usize) -> Self {
        let rep = |m: &DMatrix<f64>| DMatrix::from_fn(azimuths, m.ncols(), |_, j| m[(i, j)]);
        Self {
            axial_velocity: rep(&stations.axial_velocity),
            tangential_velocity: rep(&stations.tangential_velocity),
            radial_velocity: DMatrix::zeros(azimuths, stations.radii.len()),
            axial_induced_velocity: rep(&stations.axial_induced_velocity),
            tangential_induced_velocity: rep(&stations.tangential_induced_velocity),
            lift_coefficient: rep(&stations.lift_coefficient),
            drag_coefficient: rep(&stations.drag_coefficient),
            circulation: rep(&stations.circulation),
            thrust: rep(&stations.thrust_distribution),
            torque: rep(&stations.torque_distribution),
        }
    }
}

/// Complete result of a rotor solve over a batch of control points.
#[derive(Clone, Debug)]
pub struct RotorOutput {
    pub mode: FidelityMode,
    /// One entry per control point, in input order
    pub performance: Vec<RotorPerformance>,
    pub inflow_ratios: Vec<InflowRatios>,
    pub stations: StationDistributions,
    /// Azimuth stations [rad]
    pub azimuths: Vec<f64>,
    /// One entry per control point, in input order
    pub disc: Vec<DiscDistributions>,
    pub iterations: usize,
    pub termination: Termination,
    /// Largest |Γm − Γb| at the returned inflow state
    pub max_residual: f64,
}

impl RotorOutput {
    pub fn control_point_count(&self) -> usize {
        self.performance.len()
    }

    pub fn station_count(&self) -> usize {
        self.stations.radii.len()
    }

    pub fn converged(&self) -> bool {
        self.termination.is_converged()
    }
}
