//! Per-control-point summary of a rotor solve.

use rf_bemt::{RotorOutput, Termination};
use serde::Serialize;
use std::fmt::Write;

#[derive(Debug, Serialize)]
pub struct SpinReport {
    pub case: String,
    pub mode: String,
    pub iterations: usize,
    pub termination: String,
    pub converged: bool,
    pub max_residual: f64,
    pub points: Vec<PointReport>,
}

#[derive(Debug, Serialize)]
pub struct PointReport {
    pub label: String,
    pub thrust_n: f64,
    pub torque_n_m: f64,
    pub power_w: f64,
    pub ct: f64,
    pub cq: f64,
    pub cp: f64,
    pub efficiency: f64,
    pub advance_ratio: f64,
    pub inflow_ratio: f64,
}

fn termination_label(t: Termination) -> &'static str {
    match t {
        Termination::Converged => "converged",
        Termination::Static => "static",
        Termination::Diverging => "diverging",
        Termination::IterationLimit => "iteration_limit",
    }
}

impl SpinReport {
    pub fn new(case: &str, labels: &[String], output: &RotorOutput) -> Self {
        let points = output
            .performance
            .iter()
            .zip(&output.inflow_ratios)
            .enumerate()
            .map(|(i, (p, ratios))| PointReport {
                label: labels.get(i).cloned().unwrap_or_else(|| format!("#{i}")),
                thrust_n: p.thrust.value,
                torque_n_m: p.torque.value,
                power_w: p.power.value,
                ct: p.thrust_coefficient,
                cq: p.torque_coefficient,
                cp: p.power_coefficient,
                efficiency: p.propulsive_efficiency,
                advance_ratio: ratios.mu,
                inflow_ratio: ratios.lambda_total,
            })
            .collect();

        Self {
            case: case.to_string(),
            mode: format!("{:?}", output.mode),
            iterations: output.iterations,
            termination: termination_label(output.termination).to_string(),
            converged: output.converged(),
            max_residual: output.max_residual,
            points,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn to_table(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Case: {} ({})", self.case, self.mode);
        let _ = writeln!(
            out,
            "Solver: {} after {} iterations, max residual {:.3e}",
            self.termination, self.iterations, self.max_residual
        );
        let _ = writeln!(
            out,
            "\n{:<20} {:>11} {:>11} {:>12} {:>9} {:>9} {:>9} {:>7}",
            "point", "T [N]", "Q [N m]", "P [W]", "Ct", "Cq", "Cp", "eta"
        );
        for p in &self.points {
            let _ = writeln!(
                out,
                "{:<20} {:>11.3} {:>11.4} {:>12.2} {:>9.5} {:>9.6} {:>9.6} {:>7.3}",
                p.label, p.thrust_n, p.torque_n_m, p.power_w, p.ct, p.cq, p.cp, p.efficiency
            );
        }
        out
    }
}
