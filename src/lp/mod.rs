//! Linear-programming allocation model and solver seam.
//!
//! Builds a plant × material cost-minimization program from reference data
//! and a demand forecast, and solves it through any [`LpSolver`].
//!
//! # Usage
//!
//! ```
//! use u_allocate::lp::{AllocationModelBuilder, LpSolver, MicroLpSolver, SolveStatus};
//! use u_allocate::models::{CostMatrix, DemandForecast, Material, Plant};
//!
//! let materials = vec![Material::new("M", 1.0)];
//! let plants = vec![Plant::new("P1", 100.0)];
//! let costs = CostMatrix::new().with_cost("P1", "M", 2.0);
//! let forecast = DemandForecast::new().with("M", 10.0);
//!
//! let model = AllocationModelBuilder::new(&materials, &plants, &costs, &forecast)
//!     .build()
//!     .unwrap();
//! let outcome = MicroLpSolver.solve(&model).unwrap();
//! assert_eq!(outcome.status(), SolveStatus::Optimal);
//! ```
//!
//! # References
//!
//! - Dantzig (1963), "Linear Programming and Extensions"
//! - Hillier & Lieberman (2015), "Introduction to Operations Research", Ch. 3-4

mod builder;
mod program;
mod solver;

pub use builder::AllocationModelBuilder;
pub use program::{
    ConstraintKind, DecisionVariable, LinearConstraint, LinearProgram, Relation, RouteKey,
};
pub use solver::{solve_with_timeout, LpSolution, LpSolver, MicroLpSolver, SolveOutcome, SolveStatus};
