use std::path::PathBuf;

pub type CliResult<T> = Result<T, CliError>;

#[derive(thiserror::Error, Debug)]
pub enum CliError {
    #[error("Case error: {0}")]
    Project(#[from] rf_project::ProjectError),

    #[error("Solver error: {0}")]
    Solver(#[from] rf_bemt::BemtError),

    #[error("Failed to write report: {path}")]
    ReportWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
