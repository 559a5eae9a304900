//! Azimuth-averaged inflow solve.
//!
//! For every (control point, radial station) cell the unknown is the inflow angle PSI.
//! The residual is the difference between the Prandtl-corrected momentum circulation
//! and the blade-element circulation; its derivative with respect to PSI is built by
//! chain rule alongside the residual so one pass yields both.

use crate::conditions::{thrust_frame_velocity, OperatingCondition};
use crate::error::{BemtError, BemtResult};
use crate::geometry::BladeGeometry;
use crate::jacobian::{central_difference_derivative, forward_difference_derivative};
use crate::newton::{DerivativeMode, Evaluation, JointNewton, NewtonConfig, Termination};
use nalgebra::{DMatrix, Vector3};
use rf_airfoils::{AirfoilPolar, PolarSet};
use rf_core::numeric::finite_or;
use std::f64::consts::{FRAC_2_PI, FRAC_PI_2, PI};
use tracing::{debug, warn};

/// Prandtl tip-loss exponent and factor at one station.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TipLoss {
    /// Exponent f = (B/2)(1 - r/R)/λw, clamped at zero
    pub f: f64,
    /// F = (2/π) acos(exp(-f))
    pub factor: f64,
}

/// Prandtl tip loss for `blade_count` blades at normalized radius `chi`.
///
/// `lambda_w` must already be clamped non-negative. A zero inflow ratio drives the
/// exponent to infinity (no loss) inboard of the tip and to zero (full loss) at the tip.
pub fn prandtl_tip_loss(blade_count: f64, chi: f64, lambda_w: f64) -> TipLoss {
    let gap = (1.0 - chi).max(0.0);
    let f = if lambda_w > 0.0 {
        0.5 * blade_count * gap / lambda_w
    } else if gap > 0.0 {
        f64::INFINITY
    } else {
        0.0
    };
    TipLoss {
        f,
        factor: FRAC_2_PI * (-f).exp().acos(),
    }
}

/// Fixed inputs of one cell.
#[derive(Clone, Copy)]
pub struct CellInputs<'p> {
    /// Axial velocity including the hover induced term [m/s]
    pub ua: f64,
    /// Tangential velocity |Ω|r [m/s]
    pub ut: f64,
    /// Station radius [m]
    pub r: f64,
    pub tip_radius: f64,
    pub blade_count: f64,
    /// Twist plus pitch command [rad]
    pub pitch: f64,
    pub chord: f64,
    /// Kinematic viscosity [m²/s]
    pub nu: f64,
    pub speed_of_sound: f64,
    pub polar: &'p dyn AirfoilPolar,
}

/// Everything computed for one cell at one PSI.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CellState {
    pub psi: f64,
    pub ua: f64,
    pub ut: f64,
    /// Total velocity magnitude sqrt(Ua² + Ut²)
    pub u: f64,
    pub wa: f64,
    pub wt: f64,
    /// Axial induced velocity Wa - Ua
    pub va: f64,
    /// Tangential induced velocity Ut - Wt
    pub vt: f64,
    pub w: f64,
    pub alpha: f64,
    pub reynolds: f64,
    pub mach: f64,
    /// Clamped inflow ratio λw
    pub lambda_w: f64,
    pub tip_loss: f64,
    pub cl: f64,
    /// Uncorrected drag coefficient
    pub cd: f64,
    pub gamma_m: f64,
    pub gamma_b: f64,
    pub residual: f64,
    /// Analytic ∂residual/∂PSI
    pub derivative: f64,
}

impl CellInputs<'_> {
    /// Evaluate residual, derivative and every intermediate at `psi`.
    pub fn evaluate(&self, psi: f64) -> CellState {
        let CellInputs {
            ua,
            ut,
            r,
            tip_radius,
            blade_count,
            pitch,
            chord,
            nu,
            speed_of_sound,
            polar,
        } = *self;

        let u = (ua * ua + ut * ut).sqrt();
        let (sin_psi, cos_psi) = psi.sin_cos();
        let wa = 0.5 * ua + 0.5 * u * sin_psi;
        let wt = 0.5 * ut + 0.5 * u * cos_psi;
        let va = wa - ua;
        let vt = ut - wt;
        let alpha = pitch - wa.atan2(wt);
        let w = (wa * wa + wt * wt).sqrt();
        let mach = w / speed_of_sound;

        let chi = r / tip_radius;
        let lambda_raw = chi * wa / wt;
        let lambda_clamped = !(lambda_raw.is_finite() && lambda_raw > 0.0);
        let lambda_w = if lambda_clamped { 0.0 } else { lambda_raw };

        let tip = prandtl_tip_loss(blade_count, chi, lambda_w);
        let ring = 4.0 * PI * r / blade_count;
        let k = finite_or(4.0 * lambda_w * tip_radius / (PI * blade_count * r), 0.0);
        let swirl = (1.0 + k * k).sqrt();
        let gamma_m = vt * ring * tip.factor * swirl;

        let reynolds = w * chord / nu;
        let coeffs = polar.coefficients(reynolds, alpha);
        let gamma_b = 0.5 * w * chord * coeffs.cl;

        // chain rule through the velocity triangle
        let d_wa = 0.5 * u * cos_psi;
        let d_wt = -0.5 * u * sin_psi;
        let d_vt = -d_wt;
        let d_w = finite_or((wa * d_wa + wt * d_wt) / w, 0.0);
        let d_alpha = finite_or(-(wt * d_wa - wa * d_wt) / (wa * wa + wt * wt), 0.0);
        let d_lambda = if lambda_clamped {
            0.0
        } else {
            chi * (d_wa * wt - wa * d_wt) / (wt * wt)
        };

        let d_f = if tip.f.is_finite() && lambda_w > 0.0 {
            -tip.f / lambda_w * d_lambda
        } else {
            0.0
        };
        let d_factor = if d_f == 0.0 || !tip.f.is_finite() {
            0.0
        } else {
            let e = (-tip.f).exp();
            finite_or(FRAC_2_PI * e / (1.0 - e * e).sqrt() * d_f, 0.0)
        };
        let d_k = finite_or(4.0 * d_lambda * tip_radius / (PI * blade_count * r), 0.0);
        let d_swirl = k * d_k / swirl;
        let d_gamma_m = ring
            * (d_vt * tip.factor * swirl + vt * d_factor * swirl + vt * tip.factor * d_swirl);

        let grad = polar.cl_gradient(reynolds, alpha);
        let d_re = d_w * chord / nu;
        let d_gamma_b =
            0.5 * chord * (d_w * coeffs.cl + w * (grad.d_re * d_re + grad.d_alpha * d_alpha));

        CellState {
            psi,
            ua,
            ut,
            u,
            wa,
            wt,
            va,
            vt,
            w,
            alpha,
            reynolds,
            mach,
            lambda_w,
            tip_loss: tip.factor,
            cl: coeffs.cl,
            cd: coeffs.cd,
            gamma_m,
            gamma_b,
            residual: gamma_m - gamma_b,
            derivative: d_gamma_m - d_gamma_b,
        }
    }
}

/// Station state over the whole [control point × station] batch.
#[derive(Clone, Debug)]
pub struct StationState {
    nrows: usize,
    ncols: usize,
    cells: Vec<CellState>,
}

impl StationState {
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn ncols(&self) -> usize {
        self.ncols
    }

    pub fn cell(&self, i: usize, j: usize) -> &CellState {
        &self.cells[i * self.ncols + j]
    }

    /// Project one field into a [control point × station] matrix.
    pub fn matrix(&self, field: impl Fn(&CellState) -> f64) -> DMatrix<f64> {
        DMatrix::from_fn(self.nrows, self.ncols, |i, j| field(self.cell(i, j)))
    }

    pub fn psi(&self) -> DMatrix<f64> {
        self.matrix(|c| c.psi)
    }

    pub fn residual(&self) -> DMatrix<f64> {
        self.matrix(|c| c.residual)
    }

    pub fn derivative(&self) -> DMatrix<f64> {
        self.matrix(|c| c.derivative)
    }

    /// Largest absolute circulation residual over the batch.
    pub fn max_residual(&self) -> f64 {
        self.cells.iter().fold(0.0_f64, |m, c| m.max(c.residual.abs()))
    }
}

/// Per-control-point freestream quantities resolved once per solve.
#[derive(Clone, Debug)]
pub struct ControlPoint {
    /// Velocity in the thrust frame; x is the axial free stream
    pub v_thrust: Vector3<f64>,
    /// Axial velocity with the hover induced term, V + 2·v_hover
    pub ua: f64,
    /// Signed rotor speed [rad/s]
    pub omega: f64,
    pub density: f64,
    pub nu: f64,
    pub speed_of_sound: f64,
    pub temperature: f64,
    pub throttle: f64,
}

impl ControlPoint {
    pub fn axial_velocity(&self) -> f64 {
        self.v_thrust[0]
    }
}

/// Inflow problem for one geometry and a batch of conditions.
pub struct InflowProblem<'a> {
    geometry: &'a BladeGeometry,
    points: Vec<ControlPoint>,
    radii: Vec<f64>,
    pitch: Vec<f64>,
    polars: Vec<&'a dyn AirfoilPolar>,
}

impl<'a> InflowProblem<'a> {
    /// Resolve airfoils and freestream state.
    ///
    /// # Errors
    /// Empty condition batch, an invalid condition, or an airfoil id missing from
    /// `polars`.
    pub fn new(
        geometry: &'a BladeGeometry,
        polars: &'a PolarSet,
        conditions: &[OperatingCondition],
    ) -> BemtResult<Self> {
        if conditions.is_empty() {
            return Err(BemtError::InvalidCondition {
                index: 0,
                what: "at least one operating condition required".to_string(),
            });
        }

        let station_polars = geometry
            .airfoils()
            .iter()
            .map(|&id| polars.get(id))
            .collect::<Result<Vec<_>, _>>()?;

        let ua_induced = 2.0 * geometry.induced_hover_velocity();
        let points = conditions
            .iter()
            .enumerate()
            .map(|(index, cond)| {
                cond.validate(index)?;
                let v_thrust = thrust_frame_velocity(cond, geometry.thrust_angle());
                Ok(ControlPoint {
                    ua: v_thrust[0] + ua_induced,
                    v_thrust,
                    omega: cond.omega.value,
                    density: cond.density.value,
                    nu: cond.kinematic_viscosity(),
                    speed_of_sound: cond.speed_of_sound.value,
                    temperature: cond.temperature.value,
                    throttle: cond.throttle,
                })
            })
            .collect::<BemtResult<Vec<_>>>()?;

        Ok(Self {
            geometry,
            points,
            radii: geometry.radii(),
            pitch: geometry.total_pitch(),
            polars: station_polars,
        })
    }

    pub fn geometry(&self) -> &BladeGeometry {
        self.geometry
    }

    pub fn control_points(&self) -> &[ControlPoint] {
        &self.points
    }

    /// Resolved polar of each station.
    pub fn station_polars(&self) -> &[&'a dyn AirfoilPolar] {
        &self.polars
    }

    /// (control points, stations)
    pub fn shape(&self) -> (usize, usize) {
        (self.points.len(), self.radii.len())
    }

    /// True when every control point has a stopped rotor.
    pub fn all_static(&self) -> bool {
        self.points.iter().all(|p| p.omega == 0.0)
    }

    pub fn cell(&self, i: usize, j: usize) -> CellInputs<'a> {
        let point = &self.points[i];
        let r = self.radii[j];
        CellInputs {
            ua: point.ua,
            ut: point.omega.abs() * r,
            r,
            tip_radius: self.geometry.tip_radius(),
            blade_count: f64::from(self.geometry.blade_count()),
            pitch: self.pitch[j],
            chord: self.geometry.chord()[j],
            nu: point.nu,
            speed_of_sound: point.speed_of_sound,
            polar: self.polars[j],
        }
    }

    /// Evaluate every cell at `psi`.
    pub fn evaluate(&self, psi: &DMatrix<f64>) -> StationState {
        let (nrows, ncols) = self.shape();
        let mut cells = Vec::with_capacity(nrows * ncols);
        for i in 0..nrows {
            for j in 0..ncols {
                cells.push(self.cell(i, j).evaluate(psi[(i, j)]));
            }
        }
        StationState { nrows, ncols, cells }
    }

    fn residual(&self, psi: &DMatrix<f64>) -> BemtResult<DMatrix<f64>> {
        Ok(self.evaluate(psi).residual())
    }

    /// Residual and derivative using the configured derivative mode.
    pub fn evaluation(&self, psi: &DMatrix<f64>, mode: DerivativeMode) -> BemtResult<Evaluation> {
        let state = self.evaluate(psi);
        let derivative = match mode {
            DerivativeMode::Analytic => state.derivative(),
            DerivativeMode::ForwardDifference { epsilon } => {
                forward_difference_derivative(psi, |x| self.residual(x), epsilon)?
            }
            DerivativeMode::CentralDifference { epsilon } => {
                central_difference_derivative(psi, |x| self.residual(x), epsilon)?
            }
        };
        Ok(Evaluation {
            residual: state.residual(),
            derivative,
        })
    }
}

/// Converged (or last) inflow state plus iteration bookkeeping.
#[derive(Clone, Debug)]
pub struct InflowSolution {
    pub state: StationState,
    pub iterations: usize,
    pub termination: Termination,
    /// Maximum |ΔPSI| of the final update
    pub max_step: f64,
}

/// Early stop test applied after every update.
///
/// A stopped batch ends after one update. The batch diverges once any inflow angle
/// exceeds π/2 while any angle, not necessarily the same one, is still increasing.
pub fn stop_rule(all_static: bool, psi: &DMatrix<f64>, dx: &DMatrix<f64>) -> Option<Termination> {
    if all_static {
        return Some(Termination::Static);
    }
    let past_limit = psi.iter().any(|&p| p > FRAC_PI_2);
    let increasing = dx.iter().any(|&d| d > 0.0);
    (past_limit && increasing).then_some(Termination::Diverging)
}

/// Run the joint Newton iteration over the whole batch.
///
/// Non-convergence is soft: a warning is logged and the last iterate is returned with
/// its termination status.
pub fn solve_inflow(problem: &InflowProblem<'_>, config: &NewtonConfig) -> BemtResult<InflowSolution> {
    let (nrows, ncols) = problem.shape();
    let all_static = problem.all_static();

    let result = JointNewton::new(nrows, ncols, config).run(
        |psi| problem.evaluation(psi, config.derivative),
        |psi, dx| stop_rule(all_static, psi, dx),
    )?;

    match result.termination {
        Termination::Diverging | Termination::IterationLimit => warn!(
            iterations = result.iterations,
            max_step = result.max_step,
            termination = ?result.termination,
            "Propeller BEMT did not converge to a solution"
        ),
        _ => debug!(
            iterations = result.iterations,
            max_step = result.max_step,
            "inflow converged"
        ),
    }

    Ok(InflowSolution {
        state: problem.evaluate(&result.x),
        iterations: result.iterations,
        termination: result.termination,
        max_step: result.max_step,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rf_airfoils::ConstantPolar;
    use rf_core::units::{deg, m, mps, rad_per_s};

    /// Lift depends on both Reynolds number and angle of attack.
    struct SmoothPolar;

    impl AirfoilPolar for SmoothPolar {
        fn name(&self) -> &str {
            "smooth"
        }

        fn cl(&self, re: f64, alpha: f64) -> f64 {
            0.2 + 5.5 * alpha + 1e-7 * re
        }

        fn cd(&self, _re: f64, alpha: f64) -> f64 {
            0.01 + 0.5 * alpha * alpha
        }
    }

    fn cell<'p>(polar: &'p dyn AirfoilPolar, ua: f64, chi: f64) -> CellInputs<'p> {
        CellInputs {
            ua,
            ut: 150.0 * chi,
            r: chi,
            tip_radius: 1.0,
            blade_count: 3.0,
            pitch: 0.35,
            chord: 0.08,
            nu: 1.5e-5,
            speed_of_sound: 340.0,
            polar,
        }
    }

    #[test]
    fn tip_loss_limits() {
        let inboard = prandtl_tip_loss(2.0, 0.5, 0.0);
        assert!(inboard.f.is_infinite());
        assert!((inboard.factor - 1.0).abs() < 1e-12);

        let tip = prandtl_tip_loss(2.0, 1.0, 0.05);
        assert_eq!(tip.f, 0.0);
        assert_eq!(tip.factor, 0.0);

        let mid = prandtl_tip_loss(2.0, 0.9, 0.05);
        assert!(mid.factor > 0.0 && mid.factor < 1.0);
    }

    #[test]
    fn analytic_derivative_matches_central_difference() {
        let polar = SmoothPolar;
        for &ua in &[0.0, 12.0, 40.0] {
            for &chi in &[0.25, 0.6, 0.95] {
                let c = cell(&polar, ua, chi);
                for &psi in &[0.1, 0.4, 1.0] {
                    let h = 1e-6;
                    let fd = (c.evaluate(psi + h).residual - c.evaluate(psi - h).residual) / (2.0 * h);
                    let analytic = c.evaluate(psi).derivative;
                    let scale = fd.abs().max(1.0);
                    assert!(
                        (analytic - fd).abs() / scale < 1e-4,
                        "ua={ua} chi={chi} psi={psi}: analytic {analytic} vs fd {fd}"
                    );
                }
            }
        }
    }

    #[test]
    fn near_tip_state_is_finite() {
        let polar = ConstantPolar::new("flat", 0.5, 0.02);
        for &chi in &[0.99, 0.999_999, 1.0] {
            let s = cell(&polar, 5.0, chi).evaluate(0.3);
            assert!(s.lambda_w.is_finite() && s.lambda_w >= 0.0);
            assert!(s.tip_loss.is_finite());
            assert!(s.residual.is_finite());
            assert!(s.derivative.is_finite());
        }
    }

    fn hover_geometry() -> BladeGeometry {
        BladeGeometry::builder(2, m(1.0), m(0.1))
            .station_count(20)
            .uniform_chord(m(0.1))
            .uniform_twist(deg(10.0))
            .build()
            .unwrap()
    }

    fn polars() -> PolarSet {
        let mut set = PolarSet::new();
        set.insert(Box::new(ConstantPolar::new("flat", 0.5, 0.02)));
        set
    }

    #[test]
    fn batch_converges_with_small_residual() {
        let geometry = hover_geometry();
        let polars = polars();
        let conditions = vec![
            OperatingCondition::sea_level().with_omega(rad_per_s(100.0)),
            OperatingCondition::sea_level()
                .with_omega(rad_per_s(120.0))
                .with_velocity(Vector3::new(5.0, 0.0, 0.0)),
        ];
        let problem = InflowProblem::new(&geometry, &polars, &conditions).unwrap();
        let solution = solve_inflow(&problem, &NewtonConfig::default()).unwrap();
        assert_eq!(solution.termination, Termination::Converged);
        assert!(solution.state.max_residual() < 1e-4);
        assert_eq!(solution.state.nrows(), 2);
        assert_eq!(solution.state.ncols(), 20);
    }

    #[test]
    fn finite_difference_mode_agrees_with_analytic() {
        let geometry = hover_geometry();
        let polars = polars();
        let conditions = vec![OperatingCondition::sea_level().with_omega(rad_per_s(100.0))];
        let problem = InflowProblem::new(&geometry, &polars, &conditions).unwrap();

        let analytic = solve_inflow(&problem, &NewtonConfig::default()).unwrap();
        let config = NewtonConfig {
            derivative: DerivativeMode::CentralDifference { epsilon: 1e-7 },
            ..NewtonConfig::default()
        };
        let numeric = solve_inflow(&problem, &config).unwrap();
        assert!((analytic.state.psi() - numeric.state.psi()).amax() < 1e-5);
    }

    #[test]
    fn static_batch_stops_after_one_update() {
        let geometry = hover_geometry();
        let polars = polars();
        let conditions = vec![OperatingCondition::sea_level(); 3];
        let problem = InflowProblem::new(&geometry, &polars, &conditions).unwrap();
        let solution = solve_inflow(&problem, &NewtonConfig::default()).unwrap();
        assert_eq!(solution.termination, Termination::Static);
        assert_eq!(solution.iterations, 1);
    }

    #[test]
    fn divergence_is_judged_over_the_whole_batch() {
        let psi = DMatrix::from_row_slice(1, 2, &[1.7, 0.3]);
        let dx = DMatrix::from_row_slice(1, 2, &[-0.01, 0.2]);
        assert_eq!(stop_rule(false, &psi, &dx), Some(Termination::Diverging));

        let settling = DMatrix::from_row_slice(1, 2, &[-0.01, -0.2]);
        assert_eq!(stop_rule(false, &psi, &settling), None);
        let below = DMatrix::from_row_slice(1, 2, &[1.5, 0.3]);
        assert_eq!(stop_rule(false, &below, &dx), None);
        assert_eq!(stop_rule(true, &below, &dx), Some(Termination::Static));
    }

    #[test]
    fn runaway_batch_returns_last_iterate() {
        let config = NewtonConfig::default();
        let guess = DMatrix::from_row_slice(1, 2, &[1.7, 0.3]);
        let result = JointNewton::from_guess(guess, &config)
            .run(
                |_| {
                    Ok(Evaluation {
                        residual: DMatrix::from_row_slice(1, 2, &[0.01, -0.2]),
                        derivative: DMatrix::from_element(1, 2, 1.0),
                    })
                },
                |psi, dx| stop_rule(false, psi, dx),
            )
            .unwrap();
        assert_eq!(result.termination, Termination::Diverging);
        assert_eq!(result.iterations, 1);
        assert!((result.x[(0, 0)] - 1.69).abs() < 1e-12);
        assert!((result.x[(0, 1)] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn heavily_loaded_rotor_stops_as_diverging() {
        // solidity this high puts the hover balance past pi/2
        let geometry = BladeGeometry::builder(2, m(1.0), m(0.1))
            .stations(vec![0.5, 0.6])
            .uniform_chord(m(20.0))
            .uniform_twist(deg(10.0))
            .build()
            .unwrap();
        let polars = polars();
        let conditions = vec![OperatingCondition::sea_level().with_omega(rad_per_s(100.0))];
        let problem = InflowProblem::new(&geometry, &polars, &conditions).unwrap();
        let solution = solve_inflow(&problem, &NewtonConfig::default()).unwrap();

        assert_eq!(solution.termination, Termination::Diverging);
        assert!(solution.iterations < NewtonConfig::default().max_iterations);
        let psi = solution.state.psi();
        assert!(psi.iter().any(|&p| p > FRAC_PI_2));
        assert!(psi.iter().all(|p| p.is_finite()));
        assert!(solution.state.residual().iter().all(|r| r.is_finite()));
    }

    #[test]
    fn hover_induced_velocity_enters_axial_term() {
        let geometry = BladeGeometry::builder(2, m(1.0), m(0.1))
            .station_count(4)
            .uniform_chord(m(0.1))
            .uniform_twist(deg(10.0))
            .induced_hover_velocity(mps(3.0))
            .build()
            .unwrap();
        let polars = polars();
        let conditions = vec![OperatingCondition::sea_level().with_velocity(Vector3::new(4.0, 0.0, 0.0))];
        let problem = InflowProblem::new(&geometry, &polars, &conditions).unwrap();
        assert!((problem.control_points()[0].ua - 10.0).abs() < 1e-12);
    }

    #[test]
    fn rejects_empty_batch_and_unknown_airfoil() {
        let geometry = hover_geometry();
        let polars = polars();
        assert!(matches!(
            InflowProblem::new(&geometry, &polars, &[]),
            Err(BemtError::InvalidCondition { .. })
        ));
        let empty = PolarSet::new();
        assert!(matches!(
            InflowProblem::new(&geometry, &empty, &[OperatingCondition::sea_level()]),
            Err(BemtError::Polar(_))
        ));
    }
}
