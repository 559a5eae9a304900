//! Joint Newton iteration over a matrix of independent unknowns.
//!
//! Every cell of the unknown matrix has its own scalar residual, so the Jacobian is
//! diagonal and the update is elementwise. The stopping test is shared: one iteration
//! counter and the maximum step over the whole matrix decide when all cells stop
//! together.

use crate::error::BemtResult;
use nalgebra::DMatrix;

/// How the residual derivative is obtained.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DerivativeMode {
    /// Closed-form chain-rule derivative.
    Analytic,
    /// Forward difference with relative step.
    ForwardDifference { epsilon: f64 },
    /// Central difference with relative step.
    CentralDifference { epsilon: f64 },
}

/// Newton solver configuration.
#[derive(Clone, Debug)]
pub struct NewtonConfig {
    /// Iteration stops once the update count exceeds this
    pub max_iterations: usize,
    /// Convergence tolerance on the maximum absolute step
    pub tolerance: f64,
    /// Starting value for every unknown
    pub initial_guess: f64,
    /// Substitute for non-finite or zero derivative entries
    pub derivative_fallback: f64,
    pub derivative: DerivativeMode,
}

impl Default for NewtonConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10_000,
            tolerance: 1e-6,
            initial_guess: 1.0,
            derivative_fallback: 0.1,
            derivative: DerivativeMode::Analytic,
        }
    }
}

/// Why the iteration stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Termination {
    /// Maximum step fell below tolerance.
    Converged,
    /// Stop rule requested an early exit because there is nothing to solve.
    Static,
    /// Stop rule detected a run-away iterate.
    Diverging,
    /// Iteration cap reached.
    IterationLimit,
}

impl Termination {
    pub fn is_converged(self) -> bool {
        matches!(self, Termination::Converged | Termination::Static)
    }
}

/// Residual and derivative of every cell at one iterate.
pub struct Evaluation {
    pub residual: DMatrix<f64>,
    pub derivative: DMatrix<f64>,
}

/// Newton iteration result.
#[derive(Clone, Debug)]
pub struct NewtonResult {
    /// Final iterate
    pub x: DMatrix<f64>,
    /// Maximum absolute step of the last update
    pub max_step: f64,
    /// Number of updates applied
    pub iterations: usize,
    pub termination: Termination,
}

/// Iteration state: one matrix-valued unknown and one shared counter.
pub struct JointNewton<'c> {
    config: &'c NewtonConfig,
    x: DMatrix<f64>,
    iterations: usize,
    max_step: f64,
}

impl<'c> JointNewton<'c> {
    /// Start from the configured initial guess.
    pub fn new(nrows: usize, ncols: usize, config: &'c NewtonConfig) -> Self {
        Self::from_guess(DMatrix::from_element(nrows, ncols, config.initial_guess), config)
    }

    pub fn from_guess(x0: DMatrix<f64>, config: &'c NewtonConfig) -> Self {
        Self {
            config,
            x: x0,
            iterations: 0,
            max_step: f64::INFINITY,
        }
    }

    pub fn x(&self) -> &DMatrix<f64> {
        &self.x
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Apply one Newton update and return the step taken.
    pub fn step(&mut self, eval: &Evaluation) -> DMatrix<f64> {
        let fallback = self.config.derivative_fallback;
        let dx = eval.residual.zip_map(&eval.derivative, |r, d| {
            let d = if d.is_finite() && d != 0.0 { d } else { fallback };
            -r / d
        });
        self.x += &dx;
        self.max_step = dx.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
        self.iterations += 1;
        dx
    }

    /// Iterate until the shared stopping test fires.
    ///
    /// `stop` runs after every update with the new iterate and the step just taken; a
    /// `Some` ends the iteration with that termination.
    pub fn run<F, S>(mut self, mut evaluate: F, mut stop: S) -> BemtResult<NewtonResult>
    where
        F: FnMut(&DMatrix<f64>) -> BemtResult<Evaluation>,
        S: FnMut(&DMatrix<f64>, &DMatrix<f64>) -> Option<Termination>,
    {
        loop {
            let eval = evaluate(&self.x)?;
            let dx = self.step(&eval);

            if let Some(termination) = stop(&self.x, &dx) {
                return Ok(self.finish(termination));
            }
            // NaN steps never satisfy the tolerance
            if self.max_step < self.config.tolerance {
                return Ok(self.finish(Termination::Converged));
            }
            if self.iterations > self.config.max_iterations {
                return Ok(self.finish(Termination::IterationLimit));
            }
        }
    }

    fn finish(self, termination: Termination) -> NewtonResult {
        NewtonResult {
            x: self.x,
            max_step: self.max_step,
            iterations: self.iterations,
            termination,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quadratic(targets: &DMatrix<f64>) -> impl FnMut(&DMatrix<f64>) -> BemtResult<Evaluation> + '_ {
        move |x: &DMatrix<f64>| {
            Ok(Evaluation {
                residual: x.zip_map(targets, |x, t| x * x - t),
                derivative: x.map(|x| 2.0 * x),
            })
        }
    }

    #[test]
    fn solves_elementwise_square_roots() {
        let targets = DMatrix::from_row_slice(2, 2, &[4.0, 9.0, 2.0, 0.25]);
        let config = NewtonConfig {
            initial_guess: 3.0,
            ..NewtonConfig::default()
        };
        let result = JointNewton::new(2, 2, &config)
            .run(quadratic(&targets), |_, _| None)
            .unwrap();

        assert_eq!(result.termination, Termination::Converged);
        let expected = targets.map(f64::sqrt);
        assert!((result.x - expected).amax() < 1e-9);
    }

    #[test]
    fn shared_counter_waits_for_slowest_cell() {
        // one cell starts at its root; the other needs several updates
        let targets = DMatrix::from_row_slice(1, 2, &[9.0, 1e6]);
        let config = NewtonConfig {
            initial_guess: 3.0,
            ..NewtonConfig::default()
        };
        let result = JointNewton::new(1, 2, &config)
            .run(quadratic(&targets), |_, _| None)
            .unwrap();
        assert!(result.iterations > 5);
        assert!((result.x[(0, 0)] - 3.0).abs() < 1e-12);
        assert!((result.x[(0, 1)] - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn zero_derivative_uses_fallback() {
        let config = NewtonConfig::default();
        let mut newton = JointNewton::from_guess(DMatrix::from_element(1, 1, 0.0), &config);
        let dx = newton.step(&Evaluation {
            residual: DMatrix::from_element(1, 1, 0.2),
            derivative: DMatrix::from_element(1, 1, f64::NAN),
        });
        assert!((dx[(0, 0)] + 2.0).abs() < 1e-12);
        assert_eq!(newton.iterations(), 1);
        assert!((newton.x()[(0, 0)] + 2.0).abs() < 1e-12);
    }

    #[test]
    fn iteration_cap_returns_last_iterate() {
        let config = NewtonConfig {
            max_iterations: 3,
            ..NewtonConfig::default()
        };
        // x^2 + 1 has no real root
        let result = JointNewton::new(1, 1, &config)
            .run(
                |x: &DMatrix<f64>| {
                    Ok(Evaluation {
                        residual: x.map(|x| x * x + 1.0),
                        derivative: x.map(|x| 2.0 * x),
                    })
                },
                |_, _| None,
            )
            .unwrap();
        assert_eq!(result.termination, Termination::IterationLimit);
        // the cap is exceeded, not reached
        assert_eq!(result.iterations, 4);
        assert!(result.x[(0, 0)].is_finite());
    }

    #[test]
    fn stop_rule_ends_iteration() {
        let targets = DMatrix::from_element(1, 1, 4.0);
        let config = NewtonConfig::default();
        let result = JointNewton::new(1, 1, &config)
            .run(quadratic(&targets), |_, _| Some(Termination::Static))
            .unwrap();
        assert_eq!(result.termination, Termination::Static);
        assert_eq!(result.iterations, 1);
        assert!(result.termination.is_converged());
    }
}
