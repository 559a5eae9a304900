//! Constant-coefficient polar.

use crate::polar::{AirfoilPolar, ClGradient};

/// Polar returning the same Cl and Cd for every (Re, α).
///
/// Useful for sizing studies and as a deterministic surrogate in tests.
#[derive(Clone, Debug)]
pub struct ConstantPolar {
    pub name: String,
    pub cl: f64,
    pub cd: f64,
}

impl ConstantPolar {
    pub fn new(name: impl Into<String>, cl: f64, cd: f64) -> Self {
        Self {
            name: name.into(),
            cl,
            cd,
        }
    }
}

impl AirfoilPolar for ConstantPolar {
    fn name(&self) -> &str {
        &self.name
    }

    fn cl(&self, _re: f64, _alpha: f64) -> f64 {
        self.cl
    }

    fn cd(&self, _re: f64, _alpha: f64) -> f64 {
        self.cd
    }

    fn cl_gradient(&self, _re: f64, _alpha: f64) -> ClGradient {
        ClGradient::default()
    }
}
