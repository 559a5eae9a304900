//! Turn a validated case file into solver inputs.

use crate::atmosphere::isa;
use crate::schema::{
    AirfoilKind, CaseFile, ConditionDef, DerivativeDef, DistributionDef, FreestreamDef, ModeDef,
    RotationDef, RotorDef, SolverDef, StationAirfoilsDef,
};
use crate::validate::{ValidationError, validate_case};
use crate::ProjectResult;
use nalgebra::{Rotation3, Vector3};
use rf_airfoils::{AirfoilPolar, ConstantPolar, PolarSet, TabulatedPolar, ThinAirfoilPolar};
use rf_bemt::{
    BladeGeometry, DerivativeMode, FidelityMode, NewtonConfig, OperatingCondition, Rotation,
};
use rf_core::AirfoilId;
use rf_core::units::{deg, k, kg_per_m3, m, mps, pa_s, rad_per_s};
use std::collections::HashMap;
use std::f64::consts::TAU;

/// Solver inputs built from one case file.
#[derive(Debug)]
pub struct CompiledCase {
    pub name: String,
    pub geometry: BladeGeometry,
    pub polars: PolarSet,
    pub conditions: Vec<OperatingCondition>,
    /// Display label per condition
    pub condition_labels: Vec<String>,
    pub config: NewtonConfig,
}

/// Validate `case` and build geometry, polars, conditions and solver settings.
pub fn compile_case(case: &CaseFile) -> ProjectResult<CompiledCase> {
    validate_case(case)?;

    let mut polars = PolarSet::new();
    let mut ids = HashMap::new();
    for airfoil in &case.airfoils {
        let id = polars.insert(build_polar(&airfoil.id, &airfoil.kind)?);
        ids.insert(airfoil.id.as_str(), id);
    }

    let geometry = build_geometry(&case.rotor, &ids)?;
    geometry.check_airfoils(&polars)?;

    let conditions = case
        .conditions
        .iter()
        .map(build_condition)
        .collect::<Result<Vec<_>, _>>()?;
    let condition_labels = case
        .conditions
        .iter()
        .enumerate()
        .map(|(i, c)| c.name.clone().unwrap_or_else(|| format!("#{i}")))
        .collect();

    Ok(CompiledCase {
        name: case.name.clone(),
        geometry,
        polars,
        conditions,
        condition_labels,
        config: build_config(&case.solver),
    })
}

fn build_polar(id: &str, kind: &AirfoilKind) -> ProjectResult<Box<dyn AirfoilPolar>> {
    Ok(match kind {
        AirfoilKind::Constant { cl, cd } => Box::new(ConstantPolar::new(id, *cl, *cd)),
        AirfoilKind::ThinAirfoil {
            cl0,
            lift_slope: Some(slope),
            cl_max,
            cd0,
            k,
        } => Box::new(ThinAirfoilPolar::with_slope(id, *cl0, *slope, *cl_max, *cd0, *k)?),
        AirfoilKind::ThinAirfoil {
            cl0,
            lift_slope: None,
            cl_max,
            cd0,
            k,
        } => Box::new(ThinAirfoilPolar::new(id, *cl0, *cl_max, *cd0, *k)?),
        AirfoilKind::Table {
            reynolds,
            alpha_deg,
            cl,
            cd,
        } => Box::new(TabulatedPolar::new(
            id,
            reynolds.clone(),
            alpha_deg.iter().map(|a| a.to_radians()).collect(),
            cl.concat(),
            cd.concat(),
        )?),
    })
}

fn lookup(ids: &HashMap<&str, AirfoilId>, id: &str) -> Result<AirfoilId, ValidationError> {
    ids.get(id).copied().ok_or_else(|| ValidationError::MissingReference {
        id: id.to_string(),
        context: "rotor.airfoil".to_string(),
    })
}

fn build_geometry(rotor: &RotorDef, ids: &HashMap<&str, AirfoilId>) -> ProjectResult<BladeGeometry> {
    let mut b = BladeGeometry::builder(rotor.blade_count, m(rotor.tip_radius_m), m(rotor.hub_radius_m))
        .pitch_command(deg(rotor.pitch_command_deg))
        .thrust_angle(deg(rotor.thrust_angle_deg))
        .rotation(match rotor.rotation {
            RotationDef::Positive => Rotation::Positive,
            RotationDef::Negative => Rotation::Negative,
        })
        .mode(match rotor.mode {
            ModeDef::Bemt => FidelityMode::Bemt,
            ModeDef::BladeElement => FidelityMode::BladeElement,
        })
        .azimuth_stations(rotor.azimuth_stations)
        .induced_hover_velocity(mps(rotor.induced_hover_velocity_mps))
        .origin(rotor.origin_m.map(m));

    if let Some(stations) = &rotor.stations {
        b = b.stations(stations.clone());
    }
    if let Some(n) = rotor.station_count {
        b = b.station_count(n);
    }
    b = match &rotor.twist_deg {
        DistributionDef::Uniform(t) => b.uniform_twist(deg(*t)),
        DistributionDef::PerStation(t) => b.twist(t.iter().map(|d| d.to_radians()).collect()),
    };
    b = match &rotor.chord_m {
        DistributionDef::Uniform(c) => b.uniform_chord(m(*c)),
        DistributionDef::PerStation(c) => b.chord(c.clone()),
    };
    b = match &rotor.airfoil {
        StationAirfoilsDef::Uniform(id) => b.uniform_airfoil(lookup(ids, id)?),
        StationAirfoilsDef::PerStation(list) => b.airfoils(
            list.iter()
                .map(|id| lookup(ids, id))
                .collect::<Result<Vec<_>, _>>()?,
        ),
    };
    Ok(b.build()?)
}

fn build_condition(c: &ConditionDef) -> Result<OperatingCondition, ValidationError> {
    let condition = match c.freestream {
        FreestreamDef::Explicit {
            density_kg_m3,
            dynamic_viscosity_pa_s,
            speed_of_sound_mps,
            temperature_k,
        } => OperatingCondition::new(
            kg_per_m3(density_kg_m3),
            pa_s(dynamic_viscosity_pa_s),
            mps(speed_of_sound_mps),
            k(temperature_k),
        ),
        FreestreamDef::Altitude {
            altitude_m,
            temperature_offset_k,
        } => {
            let air = isa(altitude_m, temperature_offset_k).ok_or_else(|| ValidationError::InvalidValue {
                field: "freestream.altitude_m".to_string(),
                value: altitude_m.to_string(),
                reason: "outside the standard atmosphere".to_string(),
            })?;
            OperatingCondition::new(
                kg_per_m3(air.density_kg_m3),
                pa_s(air.dynamic_viscosity_pa_s),
                mps(air.speed_of_sound_mps),
                k(air.temperature_k),
            )
        }
    };

    let omega = match (c.omega_rad_s, c.rpm) {
        (Some(w), _) => w,
        (None, Some(rpm)) => rpm * TAU / 60.0,
        (None, None) => 0.0,
    };
    let [roll, pitch, yaw] = c.attitude_deg.map(f64::to_radians);

    Ok(condition
        .with_velocity(Vector3::from(c.velocity_mps))
        .with_attitude(Rotation3::from_euler_angles(roll, pitch, yaw))
        .with_omega(rad_per_s(omega))
        .with_throttle(c.throttle))
}

fn build_config(solver: &SolverDef) -> NewtonConfig {
    NewtonConfig {
        max_iterations: solver.max_iterations,
        tolerance: solver.tolerance,
        initial_guess: solver.initial_inflow_angle_rad,
        derivative_fallback: solver.derivative_fallback,
        derivative: match solver.derivative {
            DerivativeDef::Analytic => DerivativeMode::Analytic,
            DerivativeDef::ForwardDifference { epsilon } => DerivativeMode::ForwardDifference { epsilon },
            DerivativeDef::CentralDifference { epsilon } => DerivativeMode::CentralDifference { epsilon },
        },
    }
}
