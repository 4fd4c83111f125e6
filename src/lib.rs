//! Production allocation framework for the U-Engine ecosystem.
//!
//! Allocates production of materials across plants at minimum cost, subject
//! to demand-satisfaction and plant-capacity constraints. Demand is estimated
//! per material from noisy order history, the allocation is solved as a
//! linear program, and the solver's answer is independently re-checked
//! before it is accepted.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Material`, `Plant`, `CostMatrix`,
//!   `HistoricalSeries`, `DemandForecast`, `Inventory`, `Allocation`
//! - **`forecasting`**: Outlier filtering (IQR, z-score) and demand forecasting
//!   (moving average, weighted moving average, linear trend)
//! - **`lp`**: Allocation model builder, `LpSolver` backend seam, timed solving
//! - **`validation`**: Input integrity checks and the solution feasibility check
//! - **`planner`**: End-to-end planning cycle and plan KPIs
//! - **`config`**: Serde-backed planner configuration
//! - **`error`**: `PlanningError`
//!
//! # Pipeline
//!
//! ```text
//! history → anomaly filter → demand estimator → forecast
//!         → model builder → LP solver → solution check → allocation
//! ```
//!
//! # References
//!
//! - Hillier & Lieberman (2015), "Introduction to Operations Research"
//! - Hyndman & Athanasopoulos (2021), "Forecasting: Principles and Practice"
//! - Nahmias & Olsen (2015), "Production and Operations Analysis"

pub mod config;
pub mod error;
pub mod forecasting;
pub mod lp;
pub mod models;
pub mod planner;
pub mod validation;

pub use error::{PlanningError, Result};
