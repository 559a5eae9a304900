mod error;
mod report;

use clap::{Parser, Subcommand};
use error::{CliError, CliResult};
use report::SpinReport;
use rf_bemt::RotorSolver;
use rf_project::{compile_case, load_case};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(name = "rf-cli")]
#[command(about = "RotorFlow CLI - propeller performance by blade element momentum theory", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a rotor case file
    Validate {
        /// Path to the case file (.yaml, .yml or .json)
        case_path: PathBuf,
    },
    /// Solve every operating condition in a case
    Spin {
        /// Path to the case file (.yaml, .yml or .json)
        case_path: PathBuf,
        /// Print the report as JSON instead of a table
        #[arg(long)]
        json: bool,
        /// Write the report to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { case_path } => cmd_validate(&case_path),
        Commands::Spin {
            case_path,
            json,
            output,
        } => cmd_spin(&case_path, json, output.as_deref()),
    }
}

fn cmd_validate(case_path: &Path) -> CliResult<()> {
    println!("Validating case: {}", case_path.display());
    let case = load_case(case_path)?;
    let compiled = compile_case(&case)?;
    println!("✓ Case is valid");
    println!(
        "  {} blades, {} stations, {} conditions",
        compiled.geometry.blade_count(),
        compiled.geometry.station_count(),
        compiled.conditions.len()
    );
    Ok(())
}

fn cmd_spin(case_path: &Path, json: bool, output: Option<&Path>) -> CliResult<()> {
    let case = load_case(case_path)?;
    let compiled = compile_case(&case)?;
    info!(
        case = %compiled.name,
        conditions = compiled.conditions.len(),
        "Solving rotor case"
    );

    let result = RotorSolver::new(&compiled.geometry, &compiled.polars)
        .with_config(compiled.config.clone())
        .spin(&compiled.conditions)?;
    let report = SpinReport::new(&compiled.name, &compiled.condition_labels, &result);

    let text = if json {
        report.to_json()?
    } else {
        report.to_table()
    };

    if let Some(path) = output {
        std::fs::write(path, text).map_err(|source| CliError::ReportWrite {
            path: path.to_path_buf(),
            source,
        })?;
        println!(
            "✓ Wrote {} control points to {}",
            report.points.len(),
            path.display()
        );
    } else {
        println!("{}", text.trim_end());
    }

    Ok(())
}
