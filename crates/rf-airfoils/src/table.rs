//! Tabulated polar with bilinear interpolation in (Re, α).

use crate::error::{PolarError, PolarResult};
use crate::polar::AirfoilPolar;
use rf_core::numeric::strictly_increasing;

/// Polar built from a rectangular (Reynolds × angle of attack) table.
///
/// Values are interpolated bilinearly. Queries outside the table are clamped to the
/// nearest edge, so a rotor station that strays past the measured range keeps the last
/// measured coefficient instead of extrapolating into non-physical territory.
///
/// Tables are stored row-major: `cl[i_re * n_alpha + i_alpha]`.
#[derive(Clone, Debug)]
pub struct TabulatedPolar {
    name: String,
    reynolds: Vec<f64>,
    alpha: Vec<f64>,
    cl: Vec<f64>,
    cd: Vec<f64>,
}

/// Bracketing cell and blend weight along one axis.
#[derive(Clone, Copy, Debug)]
struct Bracket {
    lo: usize,
    hi: usize,
    t: f64,
}

fn bracket(axis: &[f64], x: f64) -> Bracket {
    let n = axis.len();
    // NaN lands on the lower edge
    if n == 1 || !(x > axis[0]) {
        return Bracket { lo: 0, hi: 0, t: 0.0 };
    }
    if x >= axis[n - 1] {
        return Bracket {
            lo: n - 1,
            hi: n - 1,
            t: 0.0,
        };
    }
    // first index with axis[i] > x; x is strictly inside so 1 <= hi <= n-1
    let hi = axis.partition_point(|&a| a <= x);
    let lo = hi - 1;
    let t = (x - axis[lo]) / (axis[hi] - axis[lo]);
    Bracket { lo, hi, t }
}

impl TabulatedPolar {
    /// Build a tabulated polar.
    ///
    /// # Errors
    /// - axes must be non-empty, finite and strictly increasing
    /// - tables must hold `reynolds.len() * alpha.len()` finite values
    /// - drag must be non-negative
    pub fn new(
        name: impl Into<String>,
        reynolds: Vec<f64>,
        alpha: Vec<f64>,
        cl: Vec<f64>,
        cd: Vec<f64>,
    ) -> PolarResult<Self> {
        if reynolds.is_empty() || alpha.is_empty() {
            return Err(PolarError::InvalidArg {
                what: "polar axes must be non-empty",
            });
        }
        if reynolds.iter().chain(alpha.iter()).any(|v| !v.is_finite()) {
            return Err(PolarError::NonPhysical {
                what: "polar axes must be finite",
            });
        }
        if !strictly_increasing(&reynolds) || !strictly_increasing(&alpha) {
            return Err(PolarError::InvalidArg {
                what: "polar axes must be strictly increasing",
            });
        }

        let expected = reynolds.len() * alpha.len();
        if cl.len() != expected {
            return Err(PolarError::ShapeMismatch {
                what: "cl table",
                expected,
                actual: cl.len(),
            });
        }
        if cd.len() != expected {
            return Err(PolarError::ShapeMismatch {
                what: "cd table",
                expected,
                actual: cd.len(),
            });
        }
        if cl.iter().chain(cd.iter()).any(|v| !v.is_finite()) {
            return Err(PolarError::NonPhysical {
                what: "polar coefficients must be finite",
            });
        }
        if cd.iter().any(|&v| v < 0.0) {
            return Err(PolarError::NonPhysical {
                what: "drag coefficient must be non-negative",
            });
        }

        Ok(Self {
            name: name.into(),
            reynolds,
            alpha,
            cl,
            cd,
        })
    }

    /// Single-Reynolds convenience constructor (α sweep only).
    pub fn from_alpha_sweep(
        name: impl Into<String>,
        reynolds: f64,
        alpha: Vec<f64>,
        cl: Vec<f64>,
        cd: Vec<f64>,
    ) -> PolarResult<Self> {
        Self::new(name, vec![reynolds], alpha, cl, cd)
    }

    pub fn reynolds(&self) -> &[f64] {
        &self.reynolds
    }

    pub fn alpha(&self) -> &[f64] {
        &self.alpha
    }

    fn interpolate(&self, table: &[f64], re: f64, alpha: f64) -> f64 {
        let n_alpha = self.alpha.len();
        let br = bracket(&self.reynolds, re);
        let ba = bracket(&self.alpha, alpha);
        let at = |i: usize, j: usize| table[i * n_alpha + j];

        let lo = at(br.lo, ba.lo) * (1.0 - ba.t) + at(br.lo, ba.hi) * ba.t;
        let hi = at(br.hi, ba.lo) * (1.0 - ba.t) + at(br.hi, ba.hi) * ba.t;
        lo * (1.0 - br.t) + hi * br.t
    }
}

impl AirfoilPolar for TabulatedPolar {
    fn name(&self) -> &str {
        &self.name
    }

    fn cl(&self, re: f64, alpha: f64) -> f64 {
        self.interpolate(&self.cl, re, alpha)
    }

    fn cd(&self, re: f64, alpha: f64) -> f64 {
        self.interpolate(&self.cd, re, alpha)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TabulatedPolar {
        // Re: 1e5, 1e6; alpha: -0.1, 0.0, 0.1
        TabulatedPolar::new(
            "sample",
            vec![1e5, 1e6],
            vec![-0.1, 0.0, 0.1],
            vec![-0.4, 0.2, 0.8, -0.6, 0.2, 1.0],
            vec![0.02, 0.01, 0.02, 0.012, 0.008, 0.012],
        )
        .unwrap()
    }

    #[test]
    fn hits_table_nodes_exactly() {
        let p = sample();
        assert_eq!(p.cl(1e5, -0.1), -0.4);
        assert_eq!(p.cl(1e6, 0.1), 1.0);
        assert_eq!(p.cd(1e6, 0.0), 0.008);
    }

    #[test]
    fn bilinear_midpoint() {
        let p = sample();
        let cl = p.cl(5.5e5, 0.05);
        // alpha midpoint at each Re: 0.5 and 0.6, then Re midpoint
        assert!((cl - 0.55).abs() < 1e-12);
    }

    #[test]
    fn clamps_outside_table() {
        let p = sample();
        assert_eq!(p.cl(1e3, -1.0), -0.4);
        assert_eq!(p.cl(1e8, 1.0), 1.0);
    }

    #[test]
    fn single_reynolds_sweep() {
        let p = TabulatedPolar::from_alpha_sweep(
            "sweep",
            2e5,
            vec![0.0, 0.2],
            vec![0.0, 1.0],
            vec![0.01, 0.03],
        )
        .unwrap();
        assert!((p.cl(1e4, 0.1) - 0.5).abs() < 1e-12);
        assert!((p.cd(9e9, 0.1) - 0.02).abs() < 1e-12);
    }

    #[test]
    fn rejects_bad_tables() {
        let err = TabulatedPolar::new("bad", vec![1e5], vec![0.0, 0.1], vec![0.0], vec![0.0, 0.0])
            .unwrap_err();
        assert!(matches!(err, PolarError::ShapeMismatch { what: "cl table", .. }));

        let err = TabulatedPolar::new(
            "bad",
            vec![1e5],
            vec![0.1, 0.0],
            vec![0.0, 0.0],
            vec![0.0, 0.0],
        )
        .unwrap_err();
        assert!(matches!(err, PolarError::InvalidArg { .. }));

        let err = TabulatedPolar::new(
            "bad",
            vec![1e5],
            vec![0.0, 0.1],
            vec![0.0, 0.0],
            vec![0.0, -0.1],
        )
        .unwrap_err();
        assert!(matches!(err, PolarError::NonPhysical { .. }));
    }
}
