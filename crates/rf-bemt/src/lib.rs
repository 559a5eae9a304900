//! Propeller performance by blade element momentum theory.
//!
//! Given a validated [`BladeGeometry`], a [`PolarSet`](rf_airfoils::PolarSet) and a
//! batch of [`OperatingCondition`]s, the solver finds the inflow angle of every
//! (control point, radial station) cell with a joint Newton iteration, applies a
//! compressibility correction to the section drag, optionally resolves the loads in
//! azimuth (with an injected [`WakeField`]), and integrates thrust, torque and power.
//!
//! # Example
//!
//! ```
//! use rf_airfoils::{ConstantPolar, PolarSet};
//! use rf_bemt::{spin, BladeGeometry, OperatingCondition};
//! use rf_core::units::{deg, m, rad_per_s};
//!
//! let geometry = BladeGeometry::builder(2, m(1.0), m(0.1))
//!     .station_count(20)
//!     .uniform_chord(m(0.1))
//!     .uniform_twist(deg(10.0))
//!     .build()
//!     .unwrap();
//! let mut polars = PolarSet::new();
//! polars.insert(Box::new(ConstantPolar::new("flat", 0.5, 0.02)));
//!
//! let hover = OperatingCondition::sea_level().with_omega(rad_per_s(100.0));
//! let out = spin(&geometry, &polars, &[hover]).unwrap();
//! assert!(out.performance[0].thrust.value > 0.0);
//! ```

pub mod blade_element;
pub mod compressibility;
pub mod conditions;
pub mod error;
pub mod geometry;
pub mod inflow;
pub mod integrate;
pub mod jacobian;
pub mod newton;
pub mod output;
pub mod solve;
pub mod wake;

pub use conditions::{InflowRatios, OperatingCondition, body_to_thrust, thrust_frame_velocity};
pub use error::{BemtError, BemtResult};
pub use geometry::{BladeGeometry, BladeGeometryBuilder, DEFAULT_AZIMUTH_STATIONS, FidelityMode, Rotation};
pub use inflow::{InflowProblem, InflowSolution, StationState, prandtl_tip_loss, solve_inflow};
pub use newton::{DerivativeMode, NewtonConfig, NewtonResult, Termination};
pub use output::{DiscDistributions, RotorOutput, RotorPerformance, StationDistributions};
pub use solve::{RotorSolver, spin};
pub use wake::{ScatteredWake, WakeField};
