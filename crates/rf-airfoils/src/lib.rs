//! rf-airfoils: airfoil polar surrogates for rotorflow.
//!
//! Provides:
//! - `AirfoilPolar` trait mapping (Reynolds, angle of attack) to (Cl, Cd)
//! - Constant, thin-airfoil and tabulated polar implementations
//! - `PolarSet` keyed by `AirfoilId` for per-station assignment
//!
//! # Architecture
//!
//! The rotor solver only sees the `AirfoilPolar` trait, which isolates it from how
//! section data was produced (wind tunnel tables, panel codes, fitted surrogates).
//!
//! # Example
//!
//! ```
//! use rf_airfoils::{AirfoilPolar, ConstantPolar, PolarSet};
//!
//! let mut set = PolarSet::new();
//! let id = set.insert(Box::new(ConstantPolar::new("flat", 0.5, 0.02)));
//! let polar = set.get(id).unwrap();
//! assert_eq!(polar.cl(1e5, 0.1), 0.5);
//! ```

pub mod constant;
pub mod error;
pub mod polar;
pub mod set;
pub mod table;
pub mod thin_airfoil;

// Re-exports for ergonomics
pub use constant::ConstantPolar;
pub use error::{PolarError, PolarResult};
pub use polar::{AirfoilPolar, ClGradient, PolarPoint};
pub use set::PolarSet;
pub use table::TabulatedPolar;
pub use thin_airfoil::ThinAirfoilPolar;
