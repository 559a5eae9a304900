//! Thin-airfoil lift with a parabolic drag polar.

use crate::error::{PolarError, PolarResult};
use crate::polar::{AirfoilPolar, ClGradient};
use std::f64::consts::PI;

/// Linear lift curve clipped at ±`cl_max`, with drag `Cd = cd0 + k·Cl²`.
///
/// ```text
/// Cl = clamp(cl0 + a·α, -cl_max, cl_max)
/// Cd = cd0 + k·Cl²
/// ```
///
/// The default lift slope is the thin-airfoil value 2π per radian.
#[derive(Clone, Debug)]
pub struct ThinAirfoilPolar {
    pub name: String,
    /// Zero-incidence lift coefficient
    pub cl0: f64,
    /// Lift-curve slope [1/rad]
    pub lift_slope: f64,
    /// Stall clip on |Cl|
    pub cl_max: f64,
    /// Minimum drag coefficient
    pub cd0: f64,
    /// Induced-drag factor
    pub k: f64,
}

impl ThinAirfoilPolar {
    /// Create a thin-airfoil polar with slope 2π.
    ///
    /// # Errors
    /// Returns error if `cl_max` is not positive or `cd0`/`k` are negative.
    pub fn new(name: impl Into<String>, cl0: f64, cl_max: f64, cd0: f64, k: f64) -> PolarResult<Self> {
        Self::with_slope(name, cl0, 2.0 * PI, cl_max, cd0, k)
    }

    pub fn with_slope(
        name: impl Into<String>,
        cl0: f64,
        lift_slope: f64,
        cl_max: f64,
        cd0: f64,
        k: f64,
    ) -> PolarResult<Self> {
        if !(cl_max > 0.0) {
            return Err(PolarError::InvalidArg {
                what: "cl_max must be positive",
            });
        }
        if !(cd0 >= 0.0) || !(k >= 0.0) {
            return Err(PolarError::NonPhysical {
                what: "drag polar terms must be non-negative",
            });
        }
        if !lift_slope.is_finite() || !cl0.is_finite() {
            return Err(PolarError::InvalidArg {
                what: "lift curve must be finite",
            });
        }
        Ok(Self {
            name: name.into(),
            cl0,
            lift_slope,
            cl_max,
            cd0,
            k,
        })
    }

    fn unclipped(&self, alpha: f64) -> f64 {
        self.cl0 + self.lift_slope * alpha
    }
}

impl AirfoilPolar for ThinAirfoilPolar {
    fn name(&self) -> &str {
        &self.name
    }

    fn cl(&self, _re: f64, alpha: f64) -> f64 {
        self.unclipped(alpha).clamp(-self.cl_max, self.cl_max)
    }

    fn cd(&self, re: f64, alpha: f64) -> f64 {
        let cl = self.cl(re, alpha);
        self.cd0 + self.k * cl * cl
    }

    fn cl_gradient(&self, _re: f64, alpha: f64) -> ClGradient {
        let d_alpha = if self.unclipped(alpha).abs() < self.cl_max {
            self.lift_slope
        } else {
            0.0
        };
        ClGradient { d_re: 0.0, d_alpha }
    }
}
