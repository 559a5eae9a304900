//! ISA standard atmosphere up to 20 km.

use rf_core::units::constants::{
    G0_MPS2, GAMMA_AIR, R_AIR, SEA_LEVEL_PRESSURE_PA, SEA_LEVEL_TEMPERATURE_K, SUTHERLAND_S_K,
};

/// Troposphere lapse rate [K/m]
const LAPSE_RATE: f64 = 0.0065;
const TROPOPAUSE_M: f64 = 11_000.0;
/// Upper limit of the model [m]
pub const CEILING_M: f64 = 20_000.0;

/// Sutherland reference viscosity [Pa·s] at 273.15 K
const MU_REF: f64 = 1.716e-5;
const T_REF_K: f64 = 273.15;

/// Freestream air state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AirState {
    pub temperature_k: f64,
    pub pressure_pa: f64,
    pub density_kg_m3: f64,
    pub speed_of_sound_mps: f64,
    pub dynamic_viscosity_pa_s: f64,
}

/// Dynamic viscosity of air by Sutherland's law [Pa·s].
pub fn sutherland_viscosity(temperature_k: f64) -> f64 {
    MU_REF * (temperature_k / T_REF_K).powf(1.5) * (T_REF_K + SUTHERLAND_S_K) / (temperature_k + SUTHERLAND_S_K)
}

/// Standard pressure and temperature at `altitude_m`, or `None` outside [0, ceiling].
fn standard(altitude_m: f64) -> Option<(f64, f64)> {
    if !(0.0..=CEILING_M).contains(&altitude_m) {
        return None;
    }
    let exponent = G0_MPS2 / (LAPSE_RATE * R_AIR);
    let t_trop = |h: f64| SEA_LEVEL_TEMPERATURE_K - LAPSE_RATE * h;
    let p_trop = |h: f64| SEA_LEVEL_PRESSURE_PA * (t_trop(h) / SEA_LEVEL_TEMPERATURE_K).powf(exponent);

    if altitude_m <= TROPOPAUSE_M {
        return Some((t_trop(altitude_m), p_trop(altitude_m)));
    }
    // isothermal lower stratosphere
    let t11 = t_trop(TROPOPAUSE_M);
    let p = p_trop(TROPOPAUSE_M) * (-G0_MPS2 * (altitude_m - TROPOPAUSE_M) / (R_AIR * t11)).exp();
    Some((t11, p))
}

/// Air state at `altitude_m` with the temperature shifted by `temperature_offset_k`.
///
/// Pressure follows the standard day; density comes from the ideal gas law at the
/// shifted temperature. Returns `None` outside the model range or for a non-positive
/// resulting temperature.
pub fn isa(altitude_m: f64, temperature_offset_k: f64) -> Option<AirState> {
    let (t_std, p) = standard(altitude_m)?;
    let t = t_std + temperature_offset_k;
    if !(t > 0.0) {
        return None;
    }
    Some(AirState {
        temperature_k: t,
        pressure_pa: p,
        density_kg_m3: p / (R_AIR * t),
        speed_of_sound_mps: (GAMMA_AIR * R_AIR * t).sqrt(),
        dynamic_viscosity_pa_s: sutherland_viscosity(t),
    })
}
