use rf_project::schema::*;
use rf_project::{ValidationError, load_yaml, save_json, save_yaml, load_json, validate_case};

fn base_case() -> CaseFile {
    CaseFile {
        version: 1,
        name: "Test rotor".to_string(),
        rotor: RotorDef {
            blade_count: 3,
            tip_radius_m: 0.5,
            hub_radius_m: 0.05,
            stations: None,
            station_count: Some(8),
            twist_deg: DistributionDef::Uniform(12.0),
            chord_m: DistributionDef::Uniform(0.04),
            airfoil: StationAirfoilsDef::Uniform("naca".to_string()),
            pitch_command_deg: 0.0,
            thrust_angle_deg: 0.0,
            rotation: RotationDef::Positive,
            mode: ModeDef::Bemt,
            azimuth_stations: 24,
            induced_hover_velocity_mps: 0.0,
            origin_m: [0.0; 3],
        },
        airfoils: vec![AirfoilDef {
            id: "naca".to_string(),
            kind: AirfoilKind::ThinAirfoil {
                cl0: 0.2,
                lift_slope: None,
                cl_max: 1.3,
                cd0: 0.012,
                k: 0.02,
            },
        }],
        solver: SolverDef::default(),
        conditions: vec![ConditionDef {
            name: Some("hover".to_string()),
            freestream: FreestreamDef::Altitude {
                altitude_m: 0.0,
                temperature_offset_k: 0.0,
            },
            velocity_mps: [0.0; 3],
            attitude_deg: [0.0; 3],
            omega_rad_s: Some(300.0),
            rpm: None,
            throttle: 1.0,
        }],
    }
}

#[test]
fn base_case_validates() {
    validate_case(&base_case()).expect("base case should validate");
}

#[test]
fn rejects_future_version() {
    let mut case = base_case();
    case.version = 99;
    assert!(matches!(
        validate_case(&case),
        Err(ValidationError::UnsupportedVersion { version: 99 })
    ));
}

#[test]
fn rejects_missing_airfoil() {
    let mut case = base_case();
    case.rotor.airfoil = StationAirfoilsDef::Uniform("clark-y".to_string());
    assert!(matches!(
        validate_case(&case),
        Err(ValidationError::MissingReference { .. })
    ));
}

#[test]
fn rejects_duplicate_airfoil() {
    let mut case = base_case();
    let dup = case.airfoils[0].clone();
    case.airfoils.push(dup);
    assert!(matches!(validate_case(&case), Err(ValidationError::DuplicateId { .. })));
}

#[test]
fn rejects_inconsistent_station_lengths() {
    let mut case = base_case();
    case.rotor.chord_m = DistributionDef::PerStation(vec![0.04; 5]);
    let err = validate_case(&case).unwrap_err();
    assert!(err.to_string().contains("disagree"), "{err}");
}

#[test]
fn rejects_hub_outside_tip() {
    let mut case = base_case();
    case.rotor.hub_radius_m = 0.6;
    assert!(validate_case(&case).is_err());
}

#[test]
fn rejects_stations_out_of_order() {
    let mut case = base_case();
    case.rotor.station_count = None;
    case.rotor.stations = Some(vec![0.2, 0.6, 0.4]);
    let err = validate_case(&case).unwrap_err();
    assert!(err.to_string().contains("strictly increasing"), "{err}");
}

#[test]
fn rejects_ambiguous_rotor_speed() {
    let mut case = base_case();
    case.conditions[0].rpm = Some(3000.0);
    assert!(validate_case(&case).is_err());
    case.conditions[0].rpm = None;
    case.conditions[0].omega_rad_s = None;
    assert!(validate_case(&case).is_err());
}

#[test]
fn rejects_altitude_above_ceiling() {
    let mut case = base_case();
    case.conditions[0].freestream = FreestreamDef::Altitude {
        altitude_m: 30_000.0,
        temperature_offset_k: 0.0,
    };
    assert!(validate_case(&case).is_err());
}

#[test]
fn rejects_ragged_table() {
    let mut case = base_case();
    case.airfoils[0].kind = AirfoilKind::Table {
        reynolds: vec![1e5, 1e6],
        alpha_deg: vec![0.0, 10.0],
        cl: vec![vec![0.2, 1.0], vec![0.3]],
        cd: vec![vec![0.01, 0.02], vec![0.01, 0.02]],
    };
    assert!(validate_case(&case).is_err());
}

#[test]
fn rejects_empty_condition_list() {
    let mut case = base_case();
    case.conditions.clear();
    assert!(validate_case(&case).is_err());
}

#[test]
fn roundtrip_yaml_and_json() {
    let case = base_case();
    let dir = std::env::temp_dir();

    let yaml = dir.join("rf_project_roundtrip.yaml");
    save_yaml(&yaml, &case).unwrap();
    assert_eq!(load_yaml(&yaml).unwrap(), case);

    let json = dir.join("rf_project_roundtrip.json");
    save_json(&json, &case).unwrap();
    assert_eq!(load_json(&json).unwrap(), case);
}

#[test]
fn solver_section_defaults() {
    let yaml = r#"
version: 1
name: minimal
rotor:
  blade_count: 2
  tip_radius_m: 1.0
  hub_radius_m: 0.1
  station_count: 6
  twist_deg: 8.0
  chord_m: 0.1
  airfoil: flat
airfoils:
  - id: flat
    kind: { type: Constant, cl: 0.5, cd: 0.02 }
conditions:
  - freestream: { type: Altitude, altitude_m: 0.0 }
    rpm: 1000.0
"#;
    let case: CaseFile = serde_yaml::from_str(yaml).unwrap();
    validate_case(&case).unwrap();
    assert_eq!(case.solver, SolverDef::default());
    assert_eq!(case.rotor.azimuth_stations, 24);
    assert_eq!(case.conditions[0].throttle, 1.0);
    assert_eq!(case.solver.max_iterations, 10_000);
}
