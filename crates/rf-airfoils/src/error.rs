//! Airfoil polar errors.

use rf_core::{AirfoilId, RfError};
use thiserror::Error;

/// Result type for polar operations.
pub type PolarResult<T> = Result<T, PolarError>;

/// Errors that can occur while building or querying airfoil polars.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PolarError {
    /// Non-physical values (negative drag, non-finite coefficients, etc.).
    #[error("Non-physical value for {what}")]
    NonPhysical { what: &'static str },

    /// Invalid argument.
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    /// Table shape does not match its axes.
    #[error("Table shape mismatch for {what}: expected {expected}, got {actual}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A station references an airfoil that was never registered.
    #[error("Unknown airfoil id {id} (set holds {len} polars)")]
    UnknownAirfoil { id: AirfoilId, len: usize },
}

impl From<PolarError> for RfError {
    fn from(err: PolarError) -> Self {
        match err {
            PolarError::NonPhysical { what } => RfError::Invariant { what },
            PolarError::InvalidArg { what } => RfError::InvalidArg { what },
            PolarError::ShapeMismatch {
                what,
                expected,
                actual,
            } => RfError::IndexOob {
                what,
                index: actual,
                len: expected,
            },
            PolarError::UnknownAirfoil { id, len } => RfError::IndexOob {
                what: "airfoil id",
                index: id.index() as usize,
                len,
            },
        }
    }
}
