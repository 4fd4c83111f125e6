//! Error types for allocation planning.
//!
//! Solver verdicts (`Infeasible`, `Unbounded`, `TimedOut`) are not errors:
//! they are reported through [`SolveStatus`](crate::lp::SolveStatus). Errors
//! here end a planning cycle without an authoritative allocation.

use thiserror::Error;

use crate::models::Violation;
use crate::validation::InputError;

/// Planning error.
#[derive(Error, Debug)]
pub enum PlanningError {
    /// Reference data, history or forecast failed validation.
    #[error("invalid input ({} problem(s)): {}", .0.len(), summarize(.0))]
    InvalidInput(Vec<InputError>),

    /// Configuration value out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration could not be read or parsed.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(String),

    /// Materials with positive demand that no plant can produce.
    #[error("no plant can produce material(s) with positive demand: {}", .materials.join(", "))]
    DataGap { materials: Vec<String> },

    /// Solver reported optimal, but the independent check found breaches.
    #[error("solver reported an optimal solution with {} constraint violation(s)", .violations.len())]
    ValidationViolation { violations: Vec<Violation> },

    /// Backend failure other than an infeasible/unbounded verdict.
    #[error("solver failure: {0}")]
    Solver(String),
}

fn summarize(errors: &[InputError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Crate result type.
pub type Result<T> = std::result::Result<T, PlanningError>;
