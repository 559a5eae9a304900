//! Rotor solve entry points.

use crate::blade_element::blade_element_loads;
use crate::conditions::{InflowRatios, OperatingCondition};
use crate::error::BemtResult;
use crate::geometry::{BladeGeometry, FidelityMode};
use crate::inflow::{solve_inflow, InflowProblem};
use crate::integrate::{integrate, station_loads};
use crate::newton::NewtonConfig;
use crate::output::{DiscDistributions, RotorOutput, StationDistributions};
use crate::wake::WakeField;
use nalgebra::DMatrix;
use rf_airfoils::PolarSet;
use tracing::debug;

/// Rotor analysis bound to one geometry and polar set.
///
/// Holds no state between calls; every [`RotorSolver::spin`] is an independent solve.
pub struct RotorSolver<'a> {
    geometry: &'a BladeGeometry,
    polars: &'a PolarSet,
    config: NewtonConfig,
    wake: Option<&'a dyn WakeField>,
}

impl<'a> RotorSolver<'a> {
    pub fn new(geometry: &'a BladeGeometry, polars: &'a PolarSet) -> Self {
        Self {
            geometry,
            polars,
            config: NewtonConfig::default(),
            wake: None,
        }
    }

    pub fn with_config(mut self, config: NewtonConfig) -> Self {
        self.config = config;
        self
    }

    /// Wake field sampled by the blade-element branch. Ignored on the BEMT branch.
    pub fn with_wake(mut self, wake: &'a dyn WakeField) -> Self {
        self.wake = Some(wake);
        self
    }

    pub fn config(&self) -> &NewtonConfig {
        &self.config
    }

    /// Solve every control point in `conditions`.
    ///
    /// # Errors
    /// Invalid or empty conditions, or stations whose airfoil is missing from the polar
    /// set. Non-convergence is reported in [`RotorOutput::termination`].
    pub fn spin(&self, conditions: &[OperatingCondition]) -> BemtResult<RotorOutput> {
        let geometry = self.geometry;
        let problem = InflowProblem::new(geometry, self.polars, conditions)?;
        let solution = solve_inflow(&problem, &self.config)?;
        let state = &solution.state;
        let points = problem.control_points();
        let (ncp, nr) = problem.shape();
        let tip_radius = geometry.tip_radius();
        let radii = geometry.radii();
        let delta_r = geometry.delta_r();
        let azimuths = geometry.azimuths();

        let ratios: Vec<InflowRatios> = points
            .iter()
            .map(|p| InflowRatios::new(&p.v_thrust, p.ua - p.axial_velocity(), p.omega, tip_radius))
            .collect();

        let loads = DMatrix::from_fn(ncp, nr, |i, j| station_loads(&points[i], state, i, j, radii[j]));
        let mut stations = StationDistributions {
            inflow_angle: state.psi(),
            circulation: state.matrix(|c| c.gamma_m),
            axial_velocity: state.matrix(|c| c.wa),
            tangential_velocity: state.matrix(|c| c.wt),
            axial_induced_velocity: state.matrix(|c| c.va),
            tangential_induced_velocity: state.matrix(|c| c.vt),
            angle_of_attack: state.matrix(|c| c.alpha),
            reynolds: state.matrix(|c| c.reynolds),
            mach: state.matrix(|c| c.mach),
            lift_coefficient: state.matrix(|c| c.cl),
            drag_coefficient: loads.map(|l| l.cd),
            thrust_distribution: loads.map(|l| l.dt_d_radius * delta_r),
            torque_distribution: loads.map(|l| l.dq_d_radius * delta_r),
            dt_d_radius: loads.map(|l| l.dt_d_radius),
            dq_d_radius: loads.map(|l| l.dq_d_radius),
            dt_d_chi: loads.map(|l| l.dt_d_radius * tip_radius),
            dq_d_chi: loads.map(|l| l.dq_d_radius * tip_radius),
            radii,
        };

        let disc = match geometry.mode() {
            FidelityMode::Bemt => {
                if self.wake.is_some() {
                    debug!("wake field ignored on the BEMT branch");
                }
                (0..ncp)
                    .map(|i| DiscDistributions::replicated(&stations, i, azimuths.len()))
                    .collect()
            }
            FidelityMode::BladeElement => {
                debug!(azimuths = azimuths.len(), wake = self.wake.is_some(), "blade-element branch");
                let elements = blade_element_loads(&problem, state, &ratios, self.wake);
                let mut disc = Vec::with_capacity(ncp);
                for (i, p) in elements.into_iter().enumerate() {
                    for j in 0..nr {
                        stations.thrust_distribution[(i, j)] = p.thrust_distribution[j];
                        stations.torque_distribution[(i, j)] = p.torque_distribution[j];
                        stations.dt_d_radius[(i, j)] = p.dt_d_radius[j];
                        stations.dq_d_radius[(i, j)] = p.dq_d_radius[j];
                        stations.dt_d_chi[(i, j)] = p.dt_d_radius[j] * tip_radius;
                        stations.dq_d_chi[(i, j)] = p.dq_d_radius[j] * tip_radius;
                    }
                    disc.push(p.disc);
                }
                disc
            }
        };

        let performance = points
            .iter()
            .enumerate()
            .map(|(i, point)| {
                integrate(
                    point,
                    geometry.blade_count(),
                    tip_radius,
                    stations.thrust_distribution.row(i).iter().copied(),
                    stations.torque_distribution.row(i).iter().copied(),
                )
            })
            .collect();

        Ok(RotorOutput {
            mode: geometry.mode(),
            performance,
            inflow_ratios: ratios,
            stations,
            azimuths,
            disc,
            iterations: solution.iterations,
            termination: solution.termination,
            max_residual: state.max_residual(),
        })
    }
}

/// Solve with default settings and no wake field.
pub fn spin(
    geometry: &BladeGeometry,
    polars: &PolarSet,
    conditions: &[OperatingCondition],
) -> BemtResult<RotorOutput> {
    RotorSolver::new(geometry, polars).spin(conditions)
}
