//! Airfoil polar trait and shared helpers.

/// Lift and drag coefficients at one (Reynolds, angle of attack) sample.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PolarPoint {
    pub cl: f64,
    pub cd: f64,
}

/// Partial derivatives of the lift coefficient.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ClGradient {
    /// ∂Cl/∂Re
    pub d_re: f64,
    /// ∂Cl/∂α [1/rad]
    pub d_alpha: f64,
}

/// Relative Reynolds step used by the finite-difference gradient.
const RE_REL_STEP: f64 = 1e-6;

/// Angle of attack step used by the finite-difference gradient [rad].
const ALPHA_STEP: f64 = 1e-6;

/// Trait for airfoil section polars.
///
/// Lookups are infallible: the rotor solver evaluates polars on every Newton iterate and
/// relies on its own clamping to keep hazardous values contained. Implementations must
/// be thread-safe (Send + Sync) so the blade-element branch can evaluate control points
/// in parallel.
pub trait AirfoilPolar: Send + Sync {
    /// Polar name (for debugging/logging).
    fn name(&self) -> &str;

    /// Lift coefficient at Reynolds number `re` and angle of attack `alpha` [rad].
    fn cl(&self, re: f64, alpha: f64) -> f64;

    /// Drag coefficient at Reynolds number `re` and angle of attack `alpha` [rad].
    fn cd(&self, re: f64, alpha: f64) -> f64;

    /// Both coefficients from a single call.
    fn coefficients(&self, re: f64, alpha: f64) -> PolarPoint {
        PolarPoint {
            cl: self.cl(re, alpha),
            cd: self.cd(re, alpha),
        }
    }

    /// Gradient of the lift coefficient, used by the inflow Newton derivative.
    ///
    /// The default is a central difference. Surrogates with closed-form slopes should
    /// override it.
    fn cl_gradient(&self, re: f64, alpha: f64) -> ClGradient {
        let h_re = RE_REL_STEP * re.abs().max(1.0);
        let d_re = (self.cl(re + h_re, alpha) - self.cl(re - h_re, alpha)) / (2.0 * h_re);
        let d_alpha =
            (self.cl(re, alpha + ALPHA_STEP) - self.cl(re, alpha - ALPHA_STEP)) / (2.0 * ALPHA_STEP);
        ClGradient { d_re, d_alpha }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Quadratic;

    impl AirfoilPolar for Quadratic {
        fn name(&self) -> &str {
            "quadratic"
        }

        fn cl(&self, re: f64, alpha: f64) -> f64 {
            1e-6 * re + 3.0 * alpha * alpha
        }

        fn cd(&self, _re: f64, _alpha: f64) -> f64 {
            0.01
        }
    }

    #[test]
    fn default_gradient_matches_closed_form() {
        let g = Quadratic.cl_gradient(2e5, 0.1);
        assert!((g.d_re - 1e-6).abs() < 1e-9);
        assert!((g.d_alpha - 0.6).abs() < 1e-6);
    }

    #[test]
    fn coefficients_bundle_both_lookups() {
        let p = Quadratic.coefficients(0.0, 1.0);
        assert_eq!(p, PolarPoint { cl: 3.0, cd: 0.01 });
    }
}
