//! Error types for rotor solver operations.

use rf_airfoils::PolarError;
use rf_core::error::RfError;
use thiserror::Error;

/// Errors that can occur while setting up or running a rotor solve.
///
/// Non-convergence of the inflow iteration is not an error: it is reported through
/// [`crate::Termination`] on the output.
#[derive(Error, Debug)]
pub enum BemtError {
    #[error("Invalid geometry: {what}")]
    InvalidGeometry { what: String },

    #[error("Invalid operating condition {index}: {what}")]
    InvalidCondition { index: usize, what: String },

    #[error("Polar error: {0}")]
    Polar(#[from] PolarError),

    #[error("Wake field error: {what}")]
    Wake { what: String },
}

pub type BemtResult<T> = Result<T, BemtError>;

impl From<BemtError> for RfError {
    fn from(e: BemtError) -> Self {
        match e {
            BemtError::InvalidGeometry { what: _ } => RfError::InvalidArg { what: "geometry" },
            BemtError::InvalidCondition { .. } => RfError::InvalidArg {
                what: "operating condition",
            },
            BemtError::Polar(p) => p.into(),
            BemtError::Wake { what: _ } => RfError::InvalidArg { what: "wake field" },
        }
    }
}
