//! Linear program solving.
//!
//! [`LpSolver`] is the seam between the allocation model and a concrete LP
//! backend. [`MicroLpSolver`] drives the pure-Rust `microlp` simplex through
//! `good_lp`; any other backend can be plugged in by implementing the trait.
//!
//! [`solve_with_timeout`] runs a solver on a worker thread and reports
//! [`SolveOutcome::TimedOut`] if no verdict arrives within the budget. A late
//! result is discarded and never reaches the caller. The budget is also handed
//! to the backend through [`LpSolver::solve_within`], so backends that honor it
//! (such as [`MicroLpSolver`]) stop their worker once it elapses.

use std::fmt::Debug;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use good_lp::{
    constraint, microlp, variable, Expression, ProblemVariables, ResolutionError, Solution,
    SolutionStatus, SolverModel, Variable, WithTimeLimit,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{LinearProgram, Relation};
use crate::error::PlanningError;

/// Solver verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SolveStatus {
    /// An optimal assignment was found.
    Optimal,
    /// No assignment satisfies all constraints.
    Infeasible,
    /// The objective decreases without limit.
    Unbounded,
    /// The solver did not answer within the time budget.
    TimedOut,
}

/// An optimal assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LpSolution {
    /// Value of every variable, in program variable order.
    pub values: Vec<f64>,
    /// Objective value.
    pub objective: f64,
    /// Signed slack of every row, in program constraint order
    /// (see [`LinearConstraint::slack`](super::LinearConstraint::slack)).
    pub slacks: Vec<f64>,
}

/// Result of a solve.
#[derive(Debug, Clone, PartialEq)]
pub enum SolveOutcome {
    /// Optimal solution found.
    Optimal(LpSolution),
    /// Model has no feasible point.
    Infeasible,
    /// Objective unbounded below.
    Unbounded,
    /// Time budget exhausted.
    TimedOut,
}

impl SolveOutcome {
    /// Status of this outcome.
    pub fn status(&self) -> SolveStatus {
        match self {
            Self::Optimal(_) => SolveStatus::Optimal,
            Self::Infeasible => SolveStatus::Infeasible,
            Self::Unbounded => SolveStatus::Unbounded,
            Self::TimedOut => SolveStatus::TimedOut,
        }
    }

    /// The solution, if optimal.
    pub fn solution(&self) -> Option<&LpSolution> {
        match self {
            Self::Optimal(sol) => Some(sol),
            _ => None,
        }
    }

    /// Builds an optimal outcome from variable values, computing objective and slacks.
    pub fn optimal(program: &LinearProgram, values: Vec<f64>) -> Self {
        Self::Optimal(LpSolution {
            objective: program.objective_value(&values),
            slacks: program.slacks(&values),
            values,
        })
    }
}

/// A linear programming backend.
///
/// Minimizes `program`'s objective over non-negative continuous variables.
/// Infeasible and unbounded models are verdicts, not errors; `Err` is
/// reserved for backend failures.
pub trait LpSolver: Send + Sync + Debug {
    /// Backend name (e.g., "microlp").
    fn name(&self) -> &'static str;

    /// Solves the program (blocking).
    fn solve(&self, program: &LinearProgram) -> Result<SolveOutcome, PlanningError>;

    /// Solves the program, stopping with [`SolveOutcome::TimedOut`] once
    /// `time_limit` elapses. Backends without a time limit ignore it.
    fn solve_within(
        &self,
        program: &LinearProgram,
        time_limit: Option<Duration>,
    ) -> Result<SolveOutcome, PlanningError> {
        let _ = time_limit;
        self.solve(program)
    }
}

/// Pure-Rust simplex backend (`good_lp` + `microlp`).
#[derive(Debug, Clone, Copy, Default)]
pub struct MicroLpSolver;

/// Rows without terms whose constant side is violated by more than this are infeasible.
const EMPTY_ROW_EPS: f64 = 1e-9;

impl LpSolver for MicroLpSolver {
    fn name(&self) -> &'static str {
        "microlp"
    }

    fn solve(&self, program: &LinearProgram) -> Result<SolveOutcome, PlanningError> {
        self.solve_within(program, None)
    }

    fn solve_within(
        &self,
        program: &LinearProgram,
        time_limit: Option<Duration>,
    ) -> Result<SolveOutcome, PlanningError> {
        let n = program.variable_count();
        if let Some(row) = program
            .constraints
            .iter()
            .find(|c| c.terms.iter().any(|&(idx, _)| idx >= n))
        {
            return Err(PlanningError::Solver(format!(
                "constraint '{}' references a variable index outside 0..{n}",
                row.name
            )));
        }

        // Term-less rows reduce to `0 (rel) rhs`; decide them here.
        if program
            .constraints
            .iter()
            .any(|c| c.terms.is_empty() && c.slack(&[]) < -EMPTY_ROW_EPS)
        {
            return Ok(SolveOutcome::Infeasible);
        }
        if program.variables.is_empty() {
            return Ok(SolveOutcome::optimal(program, Vec::new()));
        }

        let mut vars = ProblemVariables::new();
        let xs: Vec<Variable> = program
            .variables
            .iter()
            .map(|_| vars.add(variable().min(0.0)))
            .collect();

        let objective = program
            .variables
            .iter()
            .zip(&xs)
            .fold(Expression::from(0.0), |acc, (v, x)| acc + v.cost * *x);

        let mut problem = vars.minimise(objective).using(microlp);
        if let Some(limit) = time_limit {
            problem = problem.with_time_limit(limit.as_secs_f64());
        }
        for row in program.constraints.iter().filter(|c| !c.terms.is_empty()) {
            let lhs = row
                .terms
                .iter()
                .fold(Expression::from(0.0), |acc, &(idx, coef)| acc + coef * xs[idx]);
            let rhs = Expression::from(row.rhs);
            let row_constraint = match row.relation {
                Relation::LessEq => constraint::leq(lhs, rhs),
                Relation::GreaterEq => constraint::leq(rhs, lhs),
                Relation::Equal => constraint::eq(lhs, rhs),
            };
            problem.add_constraint(row_constraint);
        }

        let started = Instant::now();
        match problem.solve() {
            // stopped at the limit with a non-optimal incumbent
            Ok(solution) if !matches!(solution.status(), SolutionStatus::Optimal) => {
                Ok(SolveOutcome::TimedOut)
            }
            Ok(solution) => {
                let values = xs.iter().map(|x| solution.value(*x)).collect();
                Ok(SolveOutcome::optimal(program, values))
            }
            Err(ResolutionError::Infeasible) => Ok(SolveOutcome::Infeasible),
            Err(ResolutionError::Unbounded) => Ok(SolveOutcome::Unbounded),
            // stopped at the limit before any feasible point
            Err(_) if time_limit.is_some_and(|limit| started.elapsed() >= limit) => {
                Ok(SolveOutcome::TimedOut)
            }
            Err(other) => Err(PlanningError::Solver(other.to_string())),
        }
    }
}

/// Runs `solver` with an optional time budget.
///
/// With `None` the solve runs on the calling thread. Otherwise it runs on a
/// dedicated thread; if the budget elapses first, [`SolveOutcome::TimedOut`]
/// is returned and the eventual result is dropped.
///
/// The worker thread cannot be killed. It exits when the backend honors the
/// budget passed to [`LpSolver::solve_within`]; a backend that ignores it keeps
/// its thread busy until it finishes on its own.
pub fn solve_with_timeout(
    solver: Arc<dyn LpSolver>,
    program: Arc<LinearProgram>,
    timeout: Option<Duration>,
) -> Result<SolveOutcome, PlanningError> {
    let started = Instant::now();

    let result = match timeout {
        None => solver.solve(&program),
        Some(budget) => {
            let (tx, rx) = mpsc::channel();
            let worker_solver = Arc::clone(&solver);
            let worker_program = Arc::clone(&program);
            thread::Builder::new()
                .name("lp-solve".into())
                .spawn(move || {
                    // receiver may be gone after a timeout
                    let _ = tx.send(worker_solver.solve_within(&worker_program, Some(budget)));
                })
                .map_err(|e| PlanningError::Solver(format!("failed to spawn solver thread: {e}")))?;

            match rx.recv_timeout(budget) {
                Ok(result) => result,
                Err(RecvTimeoutError::Timeout) => {
                    warn!(
                        solver = solver.name(),
                        budget_ms = budget.as_millis() as u64,
                        "solve timed out"
                    );
                    Ok(SolveOutcome::TimedOut)
                }
                Err(RecvTimeoutError::Disconnected) => Err(PlanningError::Solver(
                    "solver thread exited without a result".into(),
                )),
            }
        }
    };

    if let Ok(outcome) = &result {
        info!(
            solver = solver.name(),
            status = ?outcome.status(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "solve finished"
        );
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lp::{
        AllocationModelBuilder, ConstraintKind, DecisionVariable, LinearConstraint, RouteKey,
    };
    use std::sync::Mutex;
    use crate::models::{CostMatrix, DemandForecast, Material, Plant};

    fn two_plant_program(demand: f64) -> LinearProgram {
        let materials = vec![Material::new("M", 1.0)];
        let plants = vec![Plant::new("P1", 100.0), Plant::new("P2", 80.0)];
        let costs = CostMatrix::new()
            .with_cost("P1", "M", 10.0)
            .with_cost("P2", "M", 8.0);
        let forecast = DemandForecast::new().with("M", demand);
        AllocationModelBuilder::new(&materials, &plants, &costs, &forecast)
            .build()
            .unwrap()
    }

    #[test]
    fn test_cheapest_plant_first() {
        let lp = two_plant_program(50.0);
        let outcome = MicroLpSolver.solve(&lp).unwrap();
        let sol = outcome.solution().unwrap();
        assert!((sol.values[0] - 0.0).abs() < 1e-6); // P1
        assert!((sol.values[1] - 50.0).abs() < 1e-6); // P2
        assert!((sol.objective - 400.0).abs() < 1e-6);
    }

    #[test]
    fn test_capacity_spill_over() {
        let lp = two_plant_program(150.0);
        let outcome = MicroLpSolver.solve(&lp).unwrap();
        assert_eq!(outcome.status(), SolveStatus::Optimal);
        let sol = outcome.solution().unwrap();
        assert!((sol.values[0] - 70.0).abs() < 1e-6);
        assert!((sol.values[1] - 80.0).abs() < 1e-6);
        assert!((sol.objective - 1340.0).abs() < 1e-6);

        let cap_p1 = lp
            .constraints
            .iter()
            .position(|c| c.name == "Capacity_P1")
            .unwrap();
        let cap_p2 = lp
            .constraints
            .iter()
            .position(|c| c.name == "Capacity_P2")
            .unwrap();
        assert!((sol.slacks[cap_p1] - 30.0).abs() < 1e-6);
        assert!(sol.slacks[cap_p2].abs() < 1e-6);
    }

    #[test]
    fn test_infeasible() {
        let lp = two_plant_program(500.0);
        let outcome = MicroLpSolver.solve(&lp).unwrap();
        assert_eq!(outcome.status(), SolveStatus::Infeasible);
        assert!(outcome.solution().is_none());
    }

    #[test]
    fn test_empty_program() {
        let outcome = MicroLpSolver.solve(&LinearProgram::new()).unwrap();
        let sol = outcome.solution().unwrap();
        assert!(sol.values.is_empty());
        assert!((sol.objective - 0.0).abs() < 1e-10);
    }

    /// One variable with the given cost and a single `≥ 1` row.
    fn single_variable_program(cost: f64, terms: Vec<(usize, f64)>) -> LinearProgram {
        LinearProgram {
            variables: vec![DecisionVariable {
                key: RouteKey::new("P", "M"),
                cost,
            }],
            constraints: vec![LinearConstraint {
                name: "Demand_M".into(),
                kind: ConstraintKind::Demand,
                entity_id: "M".into(),
                terms,
                relation: Relation::GreaterEq,
                rhs: 1.0,
            }],
        }
    }

    #[test]
    fn test_unbounded_verdict_passed_through() {
        let lp = single_variable_program(-1.0, vec![(0, 1.0)]);
        let outcome = MicroLpSolver.solve(&lp).unwrap();
        assert_eq!(outcome.status(), SolveStatus::Unbounded);
        assert!(outcome.solution().is_none());
    }

    #[test]
    fn test_term_index_out_of_range() {
        let lp = single_variable_program(1.0, vec![(0, 1.0), (3, 1.0)]);
        let err = MicroLpSolver.solve(&lp).unwrap_err();
        assert!(matches!(err, PlanningError::Solver(_)));
    }

    #[test]
    fn test_generous_time_limit_is_optimal() {
        let lp = two_plant_program(50.0);
        let outcome = MicroLpSolver
            .solve_within(&lp, Some(Duration::from_secs(10)))
            .unwrap();
        assert_eq!(outcome.status(), SolveStatus::Optimal);
    }

    /// Records the limit it was handed.
    #[derive(Debug, Default)]
    struct RecordingSolver(Mutex<Option<Option<Duration>>>);

    impl LpSolver for RecordingSolver {
        fn name(&self) -> &'static str {
            "recording"
        }

        fn solve(&self, program: &LinearProgram) -> Result<SolveOutcome, PlanningError> {
            self.solve_within(program, None)
        }

        fn solve_within(
            &self,
            _program: &LinearProgram,
            time_limit: Option<Duration>,
        ) -> Result<SolveOutcome, PlanningError> {
            *self.0.lock().unwrap() = Some(time_limit);
            Ok(SolveOutcome::Infeasible)
        }
    }

    #[test]
    fn test_budget_forwarded_to_backend() {
        let solver = Arc::new(RecordingSolver::default());
        let budget = Duration::from_secs(5);
        let outcome = solve_with_timeout(
            Arc::clone(&solver) as Arc<dyn LpSolver>,
            Arc::new(LinearProgram::new()),
            Some(budget),
        )
        .unwrap();
        assert_eq!(outcome.status(), SolveStatus::Infeasible);
        assert_eq!(*solver.0.lock().unwrap(), Some(Some(budget)));
    }

    #[derive(Debug)]
    struct SlowSolver(Duration);

    impl LpSolver for SlowSolver {
        fn name(&self) -> &'static str {
            "slow"
        }

        fn solve(&self, _program: &LinearProgram) -> Result<SolveOutcome, PlanningError> {
            thread::sleep(self.0);
            Ok(SolveOutcome::Infeasible)
        }
    }

    #[test]
    fn test_timeout_is_distinct_from_infeasible() {
        let solver: Arc<dyn LpSolver> = Arc::new(SlowSolver(Duration::from_millis(500)));
        let program = Arc::new(LinearProgram::new());
        let outcome =
            solve_with_timeout(solver, program, Some(Duration::from_millis(20))).unwrap();
        assert_eq!(outcome.status(), SolveStatus::TimedOut);
    }

    #[test]
    fn test_within_budget_returns_verdict() {
        let solver: Arc<dyn LpSolver> = Arc::new(SlowSolver(Duration::from_millis(1)));
        let program = Arc::new(LinearProgram::new());
        let outcome =
            solve_with_timeout(solver, program, Some(Duration::from_secs(5))).unwrap();
        assert_eq!(outcome.status(), SolveStatus::Infeasible);
    }

    #[test]
    fn test_inline_solve() {
        let solver: Arc<dyn LpSolver> = Arc::new(MicroLpSolver);
        let outcome = solve_with_timeout(solver, Arc::new(two_plant_program(50.0)), None).unwrap();
        assert_eq!(outcome.status(), SolveStatus::Optimal);
    }
}
