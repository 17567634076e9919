use crate::error::Result;
use good_lp::solvers::SolutionStatus;
use good_lp::{
    Constraint, Expression, ProblemVariables, ResolutionError, Solution, SolverModel, Variable,
    highs,
};
use serde::Serialize;
use std::time::Instant;
use strum_macros::Display;

/// Outcome reported by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum SolveStatus {
    Optimal,
    Feasible, // incumbent found, optimality not proven within the deadline
    Infeasible,
    Unbounded,
    Error,
    Timeout,
}

impl SolveStatus {
    /// Only these statuses carry a variable assignment
    pub fn has_solution(self) -> bool {
        matches!(self, SolveStatus::Optimal | SolveStatus::Feasible)
    }
}

/// Everything the engine needs for one solve
pub struct Problem {
    pub variables: ProblemVariables,
    pub objective: Expression, // maximised
    pub constraints: Vec<Constraint>,
    /// Variables whose values are read back, in this order
    pub readout: Vec<Variable>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SolveOptions {
    pub time_limit_secs: f64,
    pub verbose: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BackendOutcome {
    pub status: SolveStatus,
    /// Values aligned with `Problem::readout`; present only for OPTIMAL/FEASIBLE
    pub values: Option<Vec<f64>>,
    pub objective_value: Option<f64>,
    pub message: Option<String>,
}

impl BackendOutcome {
    pub fn solved(status: SolveStatus, values: Vec<f64>, objective_value: f64) -> Self {
        Self {
            status,
            values: Some(values),
            objective_value: Some(objective_value),
            message: None,
        }
    }

    pub fn unsolved(status: SolveStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            values: None,
            objective_value: None,
            message: Some(message.into()),
        }
    }
}

/// External MILP engine
pub trait SolverBackend {
    fn name(&self) -> &'static str;

    /// Infeasibility, unboundedness and timeouts are statuses, not errors
    fn solve(&self, problem: Problem, options: &SolveOptions) -> Result<BackendOutcome>;
}

/// HiGHS via good_lp
#[derive(Debug, Default, Clone, Copy)]
pub struct HighsBackend;

impl HighsBackend {
    pub fn new() -> Self {
        Self
    }
}

impl SolverBackend for HighsBackend {
    fn name(&self) -> &'static str {
        "highs"
    }

    fn solve(&self, problem: Problem, options: &SolveOptions) -> Result<BackendOutcome> {
        let Problem {
            variables,
            objective,
            constraints,
            readout,
        } = problem;

        let mut model = variables
            .maximise(objective.clone())
            .using(highs)
            .set_option("output_flag", options.verbose)
            .set_option("log_to_console", options.verbose)
            .set_option("time_limit", options.time_limit_secs);
        for constraint in constraints {
            model = model.with(constraint);
        }

        log::info!(
            "start solving with highs (time limit {:.1}s)...",
            options.time_limit_secs
        );
        let started = Instant::now();
        let result = model.solve();
        log::info!("highs finished in {:.3}s", started.elapsed().as_secs_f64());

        let outcome = match result {
            Ok(solution) => {
                let status = status_from_engine(solution.status());
                let values = readout.iter().map(|&v| solution.value(v)).collect();
                BackendOutcome::solved(status, values, solution.eval(&objective))
            }
            Err(ResolutionError::Infeasible) => {
                BackendOutcome::unsolved(SolveStatus::Infeasible, "model is infeasible")
            }
            Err(ResolutionError::Unbounded) => {
                BackendOutcome::unsolved(SolveStatus::Unbounded, "model is unbounded")
            }
            Err(e) => BackendOutcome::unsolved(SolveStatus::Error, e.to_string()),
        };
        Ok(outcome)
    }
}

/// Only a proven optimum is OPTIMAL; a time or gap limit leaves an unproven incumbent
fn status_from_engine(status: SolutionStatus) -> SolveStatus {
    match status {
        SolutionStatus::Optimal => SolveStatus::Optimal,
        _ => SolveStatus::Feasible,
    }
}
