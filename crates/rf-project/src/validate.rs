//! Case file validation logic.

use crate::atmosphere::{CEILING_M, isa};
use crate::schema::{
    AirfoilKind, CaseFile, ConditionDef, DerivativeDef, DistributionDef, FreestreamDef, RotorDef,
    SolverDef, StationAirfoilsDef,
};
use std::collections::HashSet;

/// Latest case file version understood by this crate.
pub const LATEST_VERSION: u32 = 1;

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Duplicate ID: {id} in {context}")]
    DuplicateId { id: String, context: String },

    #[error("Missing reference: {id} in {context}")]
    MissingReference { id: String, context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

fn invalid(field: impl Into<String>, value: impl ToString, reason: impl Into<String>) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.into(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

fn positive(field: &str, v: f64) -> Result<(), ValidationError> {
    if v.is_finite() && v > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, v, "must be positive"))
    }
}

fn finite(field: &str, v: f64) -> Result<(), ValidationError> {
    if v.is_finite() {
        Ok(())
    } else {
        Err(invalid(field, v, "must be finite"))
    }
}

pub fn validate_case(case: &CaseFile) -> Result<(), ValidationError> {
    if case.version == 0 || case.version > LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: case.version,
        });
    }

    let mut airfoil_ids = HashSet::new();
    for airfoil in &case.airfoils {
        if !airfoil_ids.insert(airfoil.id.as_str()) {
            return Err(ValidationError::DuplicateId {
                id: airfoil.id.clone(),
                context: "airfoils".to_string(),
            });
        }
        validate_airfoil(&airfoil.id, &airfoil.kind)?;
    }

    validate_rotor(&case.rotor, &airfoil_ids)?;
    validate_solver(&case.solver)?;

    if case.conditions.is_empty() {
        return Err(invalid("conditions", "[]", "at least one operating condition required"));
    }
    for (i, condition) in case.conditions.iter().enumerate() {
        validate_condition(i, condition)?;
    }

    Ok(())
}

fn validate_rotor(rotor: &RotorDef, airfoil_ids: &HashSet<&str>) -> Result<(), ValidationError> {
    if rotor.blade_count == 0 {
        return Err(invalid("rotor.blade_count", 0, "at least one blade required"));
    }
    positive("rotor.tip_radius_m", rotor.tip_radius_m)?;
    if !(rotor.hub_radius_m.is_finite() && rotor.hub_radius_m >= 0.0 && rotor.hub_radius_m < rotor.tip_radius_m)
    {
        return Err(invalid(
            "rotor.hub_radius_m",
            rotor.hub_radius_m,
            "must lie in [0, tip_radius_m)",
        ));
    }

    let explicit = [
        rotor.stations.as_ref().map(Vec::len),
        rotor.station_count,
        per_station_len(&rotor.twist_deg),
        per_station_len(&rotor.chord_m),
        match &rotor.airfoil {
            StationAirfoilsDef::PerStation(ids) => Some(ids.len()),
            StationAirfoilsDef::Uniform(_) => None,
        },
    ];
    let mut counts = explicit.iter().flatten();
    let Some(&n) = counts.next() else {
        return Err(invalid(
            "rotor.station_count",
            "unset",
            "give stations, station_count or a per-station distribution",
        ));
    };
    if let Some(&other) = counts.find(|&&c| c != n) {
        return Err(invalid(
            "rotor.stations",
            other,
            format!("station-wise inputs disagree on length ({n} vs {other})"),
        ));
    }
    if n < 2 {
        return Err(invalid("rotor.station_count", n, "at least 2 radial stations required"));
    }

    if let Some(stations) = &rotor.stations {
        let chi_hub = rotor.hub_radius_m / rotor.tip_radius_m;
        for w in stations.windows(2) {
            if !(w[1] > w[0]) {
                return Err(invalid("rotor.stations", w[1], "must be strictly increasing"));
            }
        }
        if stations.iter().any(|&c| !(c >= chi_hub && c <= 1.0)) {
            return Err(invalid(
                "rotor.stations",
                format!("{stations:?}"),
                format!("must lie in [{chi_hub}, 1]"),
            ));
        }
    }

    for_each_value(&rotor.twist_deg, |v| finite("rotor.twist_deg", v))?;
    for_each_value(&rotor.chord_m, |v| positive("rotor.chord_m", v))?;

    let station_ids: Vec<&String> = match &rotor.airfoil {
        StationAirfoilsDef::Uniform(id) => vec![id],
        StationAirfoilsDef::PerStation(ids) => ids.iter().collect(),
    };
    for id in station_ids {
        if !airfoil_ids.contains(id.as_str()) {
            return Err(ValidationError::MissingReference {
                id: id.clone(),
                context: "rotor.airfoil".to_string(),
            });
        }
    }

    finite("rotor.pitch_command_deg", rotor.pitch_command_deg)?;
    finite("rotor.thrust_angle_deg", rotor.thrust_angle_deg)?;
    finite("rotor.induced_hover_velocity_mps", rotor.induced_hover_velocity_mps)?;
    for v in rotor.origin_m {
        finite("rotor.origin_m", v)?;
    }
    if rotor.azimuth_stations < 2 {
        return Err(invalid(
            "rotor.azimuth_stations",
            rotor.azimuth_stations,
            "at least 2 azimuth stations required",
        ));
    }
    Ok(())
}

fn per_station_len(d: &DistributionDef) -> Option<usize> {
    match d {
        DistributionDef::PerStation(v) => Some(v.len()),
        DistributionDef::Uniform(_) => None,
    }
}

fn for_each_value(
    d: &DistributionDef,
    check: impl Fn(f64) -> Result<(), ValidationError>,
) -> Result<(), ValidationError> {
    match d {
        DistributionDef::Uniform(v) => check(*v),
        DistributionDef::PerStation(vs) => vs.iter().try_for_each(|&v| check(v)),
    }
}

fn validate_airfoil(id: &str, kind: &AirfoilKind) -> Result<(), ValidationError> {
    let field = |name: &str| format!("airfoils.{id}.{name}");
    match kind {
        AirfoilKind::Constant { cl, cd } => {
            finite(&field("cl"), *cl)?;
            if !(cd.is_finite() && *cd >= 0.0) {
                return Err(invalid(field("cd"), cd, "must be non-negative"));
            }
        }
        AirfoilKind::ThinAirfoil {
            cl0,
            lift_slope,
            cl_max,
            cd0,
            k,
        } => {
            finite(&field("cl0"), *cl0)?;
            if let Some(slope) = lift_slope {
                finite(&field("lift_slope"), *slope)?;
            }
            positive(&field("cl_max"), *cl_max)?;
            if !(cd0.is_finite() && *cd0 >= 0.0) {
                return Err(invalid(field("cd0"), cd0, "must be non-negative"));
            }
            if !(k.is_finite() && *k >= 0.0) {
                return Err(invalid(field("k"), k, "must be non-negative"));
            }
        }
        AirfoilKind::Table {
            reynolds,
            alpha_deg,
            cl,
            cd,
        } => {
            if reynolds.is_empty() || alpha_deg.is_empty() {
                return Err(invalid(field("reynolds"), "[]", "table axes must be non-empty"));
            }
            for (name, table) in [("cl", cl), ("cd", cd)] {
                if table.len() != reynolds.len() || table.iter().any(|row| row.len() != alpha_deg.len()) {
                    return Err(invalid(
                        field(name),
                        format!("{} rows", table.len()),
                        format!("expected {} rows of {} values", reynolds.len(), alpha_deg.len()),
                    ));
                }
            }
        }
    }
    Ok(())
}

fn validate_solver(solver: &SolverDef) -> Result<(), ValidationError> {
    positive("solver.tolerance", solver.tolerance)?;
    if solver.max_iterations == 0 {
        return Err(invalid("solver.max_iterations", 0, "must be at least 1"));
    }
    finite("solver.initial_inflow_angle_rad", solver.initial_inflow_angle_rad)?;
    if !(solver.derivative_fallback.is_finite() && solver.derivative_fallback != 0.0) {
        return Err(invalid(
            "solver.derivative_fallback",
            solver.derivative_fallback,
            "must be finite and non-zero",
        ));
    }
    match solver.derivative {
        DerivativeDef::Analytic => Ok(()),
        DerivativeDef::ForwardDifference { epsilon } | DerivativeDef::CentralDifference { epsilon } => {
            positive("solver.derivative.epsilon", epsilon)
        }
    }
}

fn validate_condition(i: usize, c: &ConditionDef) -> Result<(), ValidationError> {
    let field = |name: &str| format!("conditions[{i}].{name}");
    match c.freestream {
        FreestreamDef::Explicit {
            density_kg_m3,
            dynamic_viscosity_pa_s,
            speed_of_sound_mps,
            temperature_k,
        } => {
            positive(&field("freestream.density_kg_m3"), density_kg_m3)?;
            positive(&field("freestream.dynamic_viscosity_pa_s"), dynamic_viscosity_pa_s)?;
            positive(&field("freestream.speed_of_sound_mps"), speed_of_sound_mps)?;
            positive(&field("freestream.temperature_k"), temperature_k)?;
        }
        FreestreamDef::Altitude {
            altitude_m,
            temperature_offset_k,
        } => {
            finite(&field("freestream.temperature_offset_k"), temperature_offset_k)?;
            if isa(altitude_m, temperature_offset_k).is_none() {
                return Err(invalid(
                    field("freestream.altitude_m"),
                    altitude_m,
                    format!("must lie in [0, {CEILING_M}] m with a positive temperature"),
                ));
            }
        }
    }

    for v in c.velocity_mps.iter().chain(c.attitude_deg.iter()) {
        finite(&field("velocity_mps/attitude_deg"), *v)?;
    }
    match (c.omega_rad_s, c.rpm) {
        (Some(w), None) => finite(&field("omega_rad_s"), w)?,
        (None, Some(rpm)) => finite(&field("rpm"), rpm)?,
        (Some(_), Some(_)) => {
            return Err(invalid(field("rpm"), "set", "give either omega_rad_s or rpm, not both"));
        }
        (None, None) => {
            return Err(invalid(field("omega_rad_s"), "unset", "rotor speed required"));
        }
    }
    finite(&field("throttle"), c.throttle)
}
