//! rf-core: stable foundation for rotorflow.
//!
//! Contains:
//! - units (uom SI types + constructors)
//! - numeric (Real + float helpers)
//! - ids (stable compact IDs for airfoils and stations)
//! - error (shared error types)

pub mod error;
pub mod ids;
pub mod numeric;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use error::{RfError, RfResult};
pub use ids::*;
pub use numeric::*;
pub use units::*;
