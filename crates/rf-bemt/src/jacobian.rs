//! Finite difference derivatives for elementwise residuals.
//!
//! The inflow residual of each cell depends only on that cell's unknown, so the
//! Jacobian is diagonal and one perturbation of the whole matrix yields every entry.

use crate::error::BemtResult;
use nalgebra::DMatrix;

fn steps(x: &DMatrix<f64>, epsilon: f64) -> DMatrix<f64> {
    x.map(|v| epsilon * v.abs().max(1.0))
}

/// Diagonal derivative by forward differences: (r(x+h) - r(x))/h per cell.
pub fn forward_difference_derivative<F>(
    x: &DMatrix<f64>,
    residual: F,
    epsilon: f64,
) -> BemtResult<DMatrix<f64>>
where
    F: Fn(&DMatrix<f64>) -> BemtResult<DMatrix<f64>>,
{
    let h = steps(x, epsilon);
    let r_x = residual(x)?;
    let r_plus = residual(&(x + &h))?;
    Ok((r_plus - r_x).component_div(&h))
}

/// Diagonal derivative by central differences (two evaluations, second order).
pub fn central_difference_derivative<F>(
    x: &DMatrix<f64>,
    residual: F,
    epsilon: f64,
) -> BemtResult<DMatrix<f64>>
where
    F: Fn(&DMatrix<f64>) -> BemtResult<DMatrix<f64>>,
{
    let h = steps(x, epsilon);
    let r_plus = residual(&(x + &h))?;
    let r_minus = residual(&(x - &h))?;
    Ok((r_plus - r_minus).component_div(&(&h * 2.0)))
}
