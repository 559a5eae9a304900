//! rf-project: rotor case file format, validation and compilation to solver inputs.

pub mod atmosphere;
pub mod compile;
pub mod schema;
pub mod validate;

pub use atmosphere::{AirState, isa, sutherland_viscosity};
pub use compile::{CompiledCase, compile_case};
pub use schema::*;
pub use validate::{LATEST_VERSION, ValidationError, validate_case};

use std::path::Path;

pub type ProjectResult<T> = Result<T, ProjectError>;

#[derive(thiserror::Error, Debug)]
pub enum ProjectError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Polar error: {0}")]
    Polar(#[from] rf_airfoils::PolarError),

    #[error("Rotor error: {0}")]
    Rotor(#[from] rf_bemt::BemtError),

    #[error("Unknown case file format: {0}")]
    UnknownFormat(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn load_yaml(path: &Path) -> ProjectResult<CaseFile> {
    let content = std::fs::read_to_string(path)?;
    let case: CaseFile = serde_yaml::from_str(&content)?;
    validate_case(&case)?;
    Ok(case)
}

pub fn save_yaml(path: &Path, case: &CaseFile) -> ProjectResult<()> {
    validate_case(case)?;
    let content = serde_yaml::to_string(case)?;
    std::fs::write(path, content)?;
    Ok(())
}

pub fn load_json(path: &Path) -> ProjectResult<CaseFile> {
    let content = std::fs::read_to_string(path)?;
    let case: CaseFile = serde_json::from_str(&content)?;
    validate_case(&case)?;
    Ok(case)
}

pub fn save_json(path: &Path, case: &CaseFile) -> ProjectResult<()> {
    validate_case(case)?;
    let content = serde_json::to_string_pretty(case)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Load a case file, choosing the format from the extension (`.yaml`, `.yml`, `.json`).
pub fn load_case(path: &Path) -> ProjectResult<CaseFile> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml" | "yml") => load_yaml(path),
        Some("json") => load_json(path),
        _ => Err(ProjectError::UnknownFormat(path.display().to_string())),
    }
}
