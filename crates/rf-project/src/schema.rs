//! Case file schema definitions.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CaseFile {
    pub version: u32,
    pub name: String,
    pub rotor: RotorDef,
    #[serde(default)]
    pub airfoils: Vec<AirfoilDef>,
    #[serde(default)]
    pub solver: SolverDef,
    #[serde(default)]
    pub conditions: Vec<ConditionDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RotorDef {
    pub blade_count: u32,
    pub tip_radius_m: f64,
    pub hub_radius_m: f64,
    /// Normalized stations r/R; defaults to an even split of [hub/tip, 1)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stations: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub station_count: Option<usize>,
    pub twist_deg: DistributionDef,
    pub chord_m: DistributionDef,
    /// Airfoil id per station, or one id for the whole blade
    pub airfoil: StationAirfoilsDef,
    #[serde(default)]
    pub pitch_command_deg: f64,
    #[serde(default)]
    pub thrust_angle_deg: f64,
    #[serde(default)]
    pub rotation: RotationDef,
    #[serde(default)]
    pub mode: ModeDef,
    #[serde(default = "default_azimuth_stations")]
    pub azimuth_stations: usize,
    #[serde(default)]
    pub induced_hover_velocity_mps: f64,
    #[serde(default)]
    pub origin_m: [f64; 3],
}

fn default_azimuth_stations() -> usize {
    rf_bemt::DEFAULT_AZIMUTH_STATIONS
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum DistributionDef {
    Uniform(f64),
    PerStation(Vec<f64>),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum StationAirfoilsDef {
    Uniform(String),
    PerStation(Vec<String>),
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RotationDef {
    #[default]
    Positive,
    Negative,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ModeDef {
    #[default]
    Bemt,
    BladeElement,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AirfoilDef {
    pub id: String,
    pub kind: AirfoilKind,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum AirfoilKind {
    Constant {
        cl: f64,
        cd: f64,
    },
    ThinAirfoil {
        #[serde(default)]
        cl0: f64,
        /// Lift-curve slope [1/rad]; thin-airfoil 2π when omitted
        #[serde(default, skip_serializing_if = "Option::is_none")]
        lift_slope: Option<f64>,
        cl_max: f64,
        cd0: f64,
        #[serde(default)]
        k: f64,
    },
    /// One row of coefficients per Reynolds number, one column per angle of attack.
    Table {
        reynolds: Vec<f64>,
        alpha_deg: Vec<f64>,
        cl: Vec<Vec<f64>>,
        cd: Vec<Vec<f64>>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SolverDef {
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    #[serde(default = "default_initial_inflow_angle")]
    pub initial_inflow_angle_rad: f64,
    #[serde(default = "default_derivative_fallback")]
    pub derivative_fallback: f64,
    #[serde(default)]
    pub derivative: DerivativeDef,
}

impl Default for SolverDef {
    fn default() -> Self {
        Self {
            tolerance: default_tolerance(),
            max_iterations: default_max_iterations(),
            initial_inflow_angle_rad: default_initial_inflow_angle(),
            derivative_fallback: default_derivative_fallback(),
            derivative: DerivativeDef::default(),
        }
    }
}

fn default_tolerance() -> f64 {
    1e-6
}

fn default_max_iterations() -> usize {
    10_000
}

fn default_initial_inflow_angle() -> f64 {
    1.0
}

fn default_derivative_fallback() -> f64 {
    0.1
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum DerivativeDef {
    #[default]
    Analytic,
    ForwardDifference {
        epsilon: f64,
    },
    CentralDifference {
        epsilon: f64,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConditionDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub freestream: FreestreamDef,
    /// Inertial velocity [m/s]
    #[serde(default)]
    pub velocity_mps: [f64; 3],
    /// Body attitude as roll, pitch, yaw [deg]
    #[serde(default)]
    pub attitude_deg: [f64; 3],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub omega_rad_s: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rpm: Option<f64>,
    #[serde(default = "default_throttle")]
    pub throttle: f64,
}

fn default_throttle() -> f64 {
    1.0
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum FreestreamDef {
    Explicit {
        density_kg_m3: f64,
        dynamic_viscosity_pa_s: f64,
        speed_of_sound_mps: f64,
        temperature_k: f64,
    },
    /// ISA standard day at geometric altitude, optionally offset in temperature.
    Altitude {
        altitude_m: f64,
        #[serde(default)]
        temperature_offset_k: f64,
    },
}
