//! Planning cycle: forecast, build, solve, validate.
//!
//! [`ProductionPlanner`] runs one planning cycle end to end:
//!
//! 1. Validate reference data and demand history
//! 2. Clean and forecast demand per material (parallel over materials)
//! 3. Net the forecast against on-hand inventory, if supplied
//! 4. Build the allocation linear program
//! 5. Solve under the configured time budget
//! 6. Independently re-check the solution before accepting it
//!
//! Each cycle owns its forecast, model and allocation; nothing is carried
//! over between calls.

mod kpi;

pub use kpi::PlanKpi;

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::config::PlannerConfig;
use crate::error::PlanningError;
use crate::forecasting::{DemandEstimator, MaterialForecast};
use crate::lp::{
    solve_with_timeout, AllocationModelBuilder, LinearProgram, LpSolver, MicroLpSolver,
    SolveOutcome, SolveStatus,
};
use crate::models::{
    Allocation, CostMatrix, DemandForecast, HistoricalSeries, Inventory, Material, Plant,
    Violation,
};
use crate::validation::{check_allocation, validate_input, validate_inventory, SolutionCheck};

/// Borrowed inputs of one planning cycle.
#[derive(Debug, Clone, Copy)]
pub struct PlanningInputs<'a> {
    /// Materials with production times.
    pub materials: &'a [Material],
    /// Plants with capacities.
    pub plants: &'a [Plant],
    /// Unit cost per legal route.
    pub costs: &'a CostMatrix,
    /// Demand history per material.
    pub history: &'a BTreeMap<String, HistoricalSeries>,
    /// Optional on-hand stock netted from the forecast.
    pub inventory: Option<&'a Inventory>,
}

impl<'a> PlanningInputs<'a> {
    /// Creates inputs without inventory.
    pub fn new(
        materials: &'a [Material],
        plants: &'a [Plant],
        costs: &'a CostMatrix,
        history: &'a BTreeMap<String, HistoricalSeries>,
    ) -> Self {
        Self {
            materials,
            plants,
            costs,
            history,
            inventory: None,
        }
    }

    /// Nets the forecast against on-hand stock.
    pub fn with_inventory(mut self, inventory: &'a Inventory) -> Self {
        self.inventory = Some(inventory);
        self
    }
}

/// Result of a planning cycle.
///
/// `allocation`, `total_cost`, `check` and `kpi` are populated only when
/// `status` is [`SolveStatus::Optimal`].
#[derive(Debug, Clone, Serialize)]
pub struct PlanOutcome {
    /// Solver verdict.
    pub status: SolveStatus,
    /// Demand the model was built on (net of inventory, if any).
    pub forecast: DemandForecast,
    /// Per-material forecasting details (empty when the forecast was supplied).
    #[serde(skip)]
    pub forecast_details: Vec<MaterialForecast>,
    /// Accepted allocation, one line per cost-matrix route.
    pub allocation: Option<Allocation>,
    /// Objective value of the allocation.
    pub total_cost: Option<f64>,
    /// Signed slack per constraint name (`Demand_<m>`, `Capacity_<p>`).
    pub slacks: BTreeMap<String, f64>,
    /// Independent feasibility check of the allocation.
    pub check: Option<SolutionCheck>,
    /// Plan indicators.
    pub kpi: Option<PlanKpi>,
}

impl PlanOutcome {
    fn without_solution(status: SolveStatus, forecast: DemandForecast) -> Self {
        Self {
            status,
            forecast,
            forecast_details: Vec::new(),
            allocation: None,
            total_cost: None,
            slacks: BTreeMap::new(),
            check: None,
            kpi: None,
        }
    }

    /// Whether an optimal allocation was accepted.
    pub fn is_optimal(&self) -> bool {
        self.status == SolveStatus::Optimal
    }

    /// Slack of a named constraint.
    pub fn slack(&self, constraint_name: &str) -> Option<f64> {
        self.slacks.get(constraint_name).copied()
    }

    /// Violations found by the check (always empty for an accepted plan).
    pub fn violations(&self) -> &[Violation] {
        self.check
            .as_ref()
            .map(|c| c.violations.as_slice())
            .unwrap_or(&[])
    }
}

/// Runs planning cycles with a fixed configuration and LP backend.
///
/// # Example
/// ```
/// use std::collections::BTreeMap;
/// use u_allocate::config::PlannerConfig;
/// use u_allocate::models::{CostMatrix, HistoricalSeries, Material, Plant};
/// use u_allocate::planner::{PlanningInputs, ProductionPlanner};
///
/// let materials = vec![Material::new("M", 1.0)];
/// let plants = vec![Plant::new("P1", 100.0), Plant::new("P2", 80.0)];
/// let costs = CostMatrix::new().with_cost("P1", "M", 10.0).with_cost("P2", "M", 8.0);
/// let mut history = BTreeMap::new();
/// history.insert("M".to_string(), HistoricalSeries::new(vec![48.0, 50.0, 52.0]));
///
/// let planner = ProductionPlanner::new(PlannerConfig::default());
/// let outcome = planner
///     .plan(&PlanningInputs::new(&materials, &plants, &costs, &history))
///     .unwrap();
/// assert!(outcome.is_optimal());
/// assert!((outcome.total_cost.unwrap() - 400.0).abs() < 1e-6);
/// ```
#[derive(Debug, Clone)]
pub struct ProductionPlanner {
    config: PlannerConfig,
    solver: Arc<dyn LpSolver>,
}

impl Default for ProductionPlanner {
    fn default() -> Self {
        Self::new(PlannerConfig::default())
    }
}

impl ProductionPlanner {
    /// Creates a planner using the built-in simplex backend.
    pub fn new(config: PlannerConfig) -> Self {
        Self {
            config,
            solver: Arc::new(MicroLpSolver),
        }
    }

    /// Replaces the LP backend.
    pub fn with_solver<S: LpSolver + 'static>(mut self, solver: S) -> Self {
        self.solver = Arc::new(solver);
        self
    }

    /// Active configuration.
    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Runs a full cycle from demand history.
    ///
    /// # Errors
    /// - [`PlanningError::InvalidConfig`] / [`PlanningError::InvalidInput`] before any work
    /// - [`PlanningError::DataGap`] when a demanded material cannot be produced anywhere
    /// - [`PlanningError::ValidationViolation`] when an optimal answer fails the re-check
    /// - [`PlanningError::Solver`] on backend failure
    ///
    /// Infeasible, unbounded and timed-out solves are returned as `Ok` with
    /// the matching status and no allocation.
    #[instrument(skip_all, fields(materials = inputs.materials.len(), plants = inputs.plants.len()))]
    pub fn plan(&self, inputs: &PlanningInputs<'_>) -> Result<PlanOutcome, PlanningError> {
        self.config.validate()?;
        let mut input_errors =
            validate_input(inputs.materials, inputs.plants, inputs.costs, inputs.history)
                .err()
                .unwrap_or_default();
        if let Some(inventory) = inputs.inventory {
            if let Err(e) = validate_inventory(inputs.materials, inventory) {
                input_errors.extend(e);
            }
        }
        if !input_errors.is_empty() {
            return Err(PlanningError::InvalidInput(input_errors));
        }

        let run = DemandEstimator::from_config(&self.config).estimate_all(inputs.history);
        info!(
            materials = run.details.len(),
            total_demand = run.forecast.total(),
            warnings = run.warnings().len(),
            "demand forecast ready"
        );

        let requirement = match inputs.inventory {
            Some(inventory) => run.forecast.net_of(inventory),
            None => run.forecast.clone(),
        };

        let mut outcome = self.plan_with_forecast(
            inputs.materials,
            inputs.plants,
            inputs.costs,
            &requirement,
        )?;
        outcome.forecast_details = run.details;
        Ok(outcome)
    }

    /// Runs build, solve and check against a supplied forecast.
    pub fn plan_with_forecast(
        &self,
        materials: &[Material],
        plants: &[Plant],
        costs: &CostMatrix,
        forecast: &DemandForecast,
    ) -> Result<PlanOutcome, PlanningError> {
        self.config.validate()?;

        let program =
            Arc::new(AllocationModelBuilder::new(materials, plants, costs, forecast).build()?);
        let outcome = solve_with_timeout(
            Arc::clone(&self.solver),
            Arc::clone(&program),
            self.config.solve_timeout(),
        )?;

        let solution = match outcome {
            SolveOutcome::Optimal(solution) => solution,
            other => {
                warn!(status = ?other.status(), "no allocation produced");
                return Ok(PlanOutcome::without_solution(other.status(), forecast.clone()));
            }
        };

        let allocation = self.to_allocation(&program, &solution.values)?;
        let check = check_allocation(
            materials,
            plants,
            costs,
            forecast,
            &allocation,
            self.config.tolerance,
        );
        if !check.passed() {
            warn!(
                violations = check.violations.len(),
                "optimal solution rejected by feasibility check"
            );
            return Err(PlanningError::ValidationViolation {
                violations: check.violations,
            });
        }

        let kpi = PlanKpi::calculate(
            materials,
            plants,
            costs,
            forecast,
            &allocation,
            self.config.tolerance,
        );
        let slacks = program
            .constraints
            .iter()
            .zip(&solution.slacks)
            .map(|(c, s)| (c.name.clone(), *s))
            .collect();
        let total_cost = allocation.total_cost(costs);
        info!(
            total_cost,
            total_units = kpi.total_units,
            binding_plants = kpi.binding_plants.len(),
            "allocation accepted"
        );

        Ok(PlanOutcome {
            status: SolveStatus::Optimal,
            forecast: forecast.clone(),
            forecast_details: Vec::new(),
            allocation: Some(allocation),
            total_cost: Some(total_cost),
            slacks,
            check: Some(check),
            kpi: Some(kpi),
        })
    }

    /// Maps solver values onto routes. Round-off negatives within tolerance become 0.
    fn to_allocation(
        &self,
        program: &LinearProgram,
        values: &[f64],
    ) -> Result<Allocation, PlanningError> {
        if values.len() != program.variable_count() {
            return Err(PlanningError::Solver(format!(
                "solver returned {} values for {} variables",
                values.len(),
                program.variable_count()
            )));
        }

        let tolerance = self.config.tolerance;
        let mut allocation = Allocation::new();
        for (var, &value) in program.variables.iter().zip(values) {
            let quantity = if value < 0.0 && value >= -tolerance {
                0.0
            } else {
                value
            };
            allocation.set(&var.key.plant_id, &var.key.material_id, quantity);
        }
        Ok(allocation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ViolationKind;
    use std::time::Duration;

    fn materials() -> Vec<Material> {
        vec![Material::new("M", 1.0)]
    }

    fn plants() -> Vec<Plant> {
        vec![Plant::new("P1", 100.0), Plant::new("P2", 80.0)]
    }

    fn costs() -> CostMatrix {
        CostMatrix::new()
            .with_cost("P1", "M", 10.0)
            .with_cost("P2", "M", 8.0)
    }

    fn planner() -> ProductionPlanner {
        ProductionPlanner::new(PlannerConfig::default().with_parallel_forecast(false))
    }

    #[test]
    fn test_cheaper_plant_covers_demand() {
        let forecast = DemandForecast::new().with("M", 50.0);
        let outcome = planner()
            .plan_with_forecast(&materials(), &plants(), &costs(), &forecast)
            .unwrap();

        assert!(outcome.is_optimal());
        let alloc = outcome.allocation.as_ref().unwrap();
        assert_eq!(alloc.len(), 2);
        assert!((alloc.quantity("P2", "M").unwrap() - 50.0).abs() < 1e-6);
        assert!(alloc.quantity("P1", "M").unwrap().abs() < 1e-6);
        assert!((outcome.total_cost.unwrap() - 400.0).abs() < 1e-6);
        assert!(outcome.violations().is_empty());
    }

    #[test]
    fn test_saturated_plant_spills_over() {
        let forecast = DemandForecast::new().with("M", 150.0);
        let outcome = planner()
            .plan_with_forecast(&materials(), &plants(), &costs(), &forecast)
            .unwrap();

        let alloc = outcome.allocation.as_ref().unwrap();
        assert!((alloc.quantity("P2", "M").unwrap() - 80.0).abs() < 1e-6);
        assert!((alloc.quantity("P1", "M").unwrap() - 70.0).abs() < 1e-6);
        assert!((outcome.total_cost.unwrap() - 1340.0).abs() < 1e-6);

        let check = outcome.check.as_ref().unwrap();
        assert!((check.capacity_for("P2").unwrap().used_hours - 80.0).abs() < 1e-6);
        assert!((check.capacity_for("P1").unwrap().slack() - 30.0).abs() < 1e-6);
        assert!((outcome.slack("Capacity_P1").unwrap() - 30.0).abs() < 1e-6);
        assert!(outcome.slack("Capacity_P2").unwrap().abs() < 1e-6);
        assert!(outcome.slack("Demand_M").unwrap().abs() < 1e-6);
        assert_eq!(outcome.kpi.as_ref().unwrap().binding_plants, vec!["P2"]);
    }

    #[test]
    fn test_data_gap_fails_before_solve() {
        let forecast = DemandForecast::new().with("M", 10.0);
        let err = planner()
            .with_solver(PanicSolver)
            .plan_with_forecast(&materials(), &plants(), &CostMatrix::new(), &forecast)
            .unwrap_err();
        match err {
            PlanningError::DataGap { materials } => assert_eq!(materials, vec!["M"]),
            other => panic!("expected DataGap, got {other:?}"),
        }
    }

    #[test]
    fn test_over_capacity_is_infeasible() {
        let forecast = DemandForecast::new().with("M", 500.0);
        let outcome = planner()
            .plan_with_forecast(&materials(), &plants(), &costs(), &forecast)
            .unwrap();

        assert_eq!(outcome.status, SolveStatus::Infeasible);
        assert!(outcome.allocation.is_none());
        assert!(outcome.total_cost.is_none());
        assert!(outcome.kpi.is_none());
        assert!(outcome.slacks.is_empty());
    }

    #[test]
    fn test_plan_from_history() {
        let mut history = BTreeMap::new();
        history.insert("M".to_string(), HistoricalSeries::new(vec![50.0, 50.0, 50.0]));
        let (m, p, c) = (materials(), plants(), costs());

        let outcome = planner()
            .plan(&PlanningInputs::new(&m, &p, &c, &history))
            .unwrap();
        assert!((outcome.forecast.demand("M") - 50.0).abs() < 1e-9);
        assert_eq!(outcome.forecast_details.len(), 1);
        assert!((outcome.total_cost.unwrap() - 400.0).abs() < 1e-6);
    }

    #[test]
    fn test_plan_nets_inventory() {
        let mut history = BTreeMap::new();
        history.insert("M".to_string(), HistoricalSeries::new(vec![50.0, 50.0, 50.0]));
        let inventory = Inventory::new().with_stock("M", 20.0);
        let (m, p, c) = (materials(), plants(), costs());

        let outcome = planner()
            .plan(&PlanningInputs::new(&m, &p, &c, &history).with_inventory(&inventory))
            .unwrap();
        assert!((outcome.forecast.demand("M") - 30.0).abs() < 1e-9);
        assert!((outcome.total_cost.unwrap() - 240.0).abs() < 1e-6);
    }

    #[test]
    fn test_plan_rejects_unknown_history_material() {
        let mut history = BTreeMap::new();
        history.insert("X".to_string(), HistoricalSeries::new(vec![1.0]));
        let (m, p, c) = (materials(), plants(), costs());

        let err = planner()
            .plan(&PlanningInputs::new(&m, &p, &c, &history))
            .unwrap_err();
        assert!(matches!(err, PlanningError::InvalidInput(_)));
    }

    #[test]
    fn test_plan_rejects_invalid_inventory() {
        let mut history = BTreeMap::new();
        history.insert("M".to_string(), HistoricalSeries::new(vec![50.0, 50.0, 50.0]));
        let (m, p, c) = (materials(), plants(), costs());

        for inventory in [
            Inventory::new().with_stock("M", f64::NAN),
            Inventory::new().with_stock("M", -10.0),
            Inventory::new().with_stock("X", 5.0),
        ] {
            let err = planner()
                .plan(&PlanningInputs::new(&m, &p, &c, &history).with_inventory(&inventory))
                .unwrap_err();
            assert!(matches!(err, PlanningError::InvalidInput(_)));
        }
    }

    #[test]
    fn test_invalid_config() {
        let planner = ProductionPlanner::new(PlannerConfig::default().with_window(0));
        let err = planner
            .plan_with_forecast(&materials(), &plants(), &costs(), &DemandForecast::new())
            .unwrap_err();
        assert!(matches!(err, PlanningError::InvalidConfig(_)));
    }

    /// Claims optimality with every variable at zero.
    #[derive(Debug)]
    struct ZeroSolver;

    impl LpSolver for ZeroSolver {
        fn name(&self) -> &'static str {
            "zero"
        }

        fn solve(&self, program: &LinearProgram) -> Result<SolveOutcome, PlanningError> {
            Ok(SolveOutcome::optimal(program, vec![0.0; program.variable_count()]))
        }
    }

    #[test]
    fn test_bad_optimal_is_rejected() {
        let forecast = DemandForecast::new().with("M", 50.0);
        let err = planner()
            .with_solver(ZeroSolver)
            .plan_with_forecast(&materials(), &plants(), &costs(), &forecast)
            .unwrap_err();
        match err {
            PlanningError::ValidationViolation { violations } => {
                assert_eq!(violations.len(), 1);
                assert_eq!(violations[0].kind, ViolationKind::DemandShortfall);
                assert!((violations[0].amount - 50.0).abs() < 1e-9);
            }
            other => panic!("expected ValidationViolation, got {other:?}"),
        }
    }

    /// Claims optimality with NaN values.
    #[derive(Debug)]
    struct NanSolver;

    impl LpSolver for NanSolver {
        fn name(&self) -> &'static str {
            "nan"
        }

        fn solve(&self, program: &LinearProgram) -> Result<SolveOutcome, PlanningError> {
            Ok(SolveOutcome::optimal(program, vec![f64::NAN; program.variable_count()]))
        }
    }

    #[test]
    fn test_nan_optimal_is_rejected() {
        let forecast = DemandForecast::new().with("M", 50.0);
        let err = planner()
            .with_solver(NanSolver)
            .plan_with_forecast(&materials(), &plants(), &costs(), &forecast)
            .unwrap_err();
        match err {
            PlanningError::ValidationViolation { violations } => {
                assert!(violations
                    .iter()
                    .any(|v| v.kind == ViolationKind::NonFiniteQuantity));
                assert!(violations
                    .iter()
                    .any(|v| v.kind == ViolationKind::DemandShortfall));
            }
            other => panic!("expected ValidationViolation, got {other:?}"),
        }
    }

    #[derive(Debug)]
    struct ShortSolver;

    impl LpSolver for ShortSolver {
        fn name(&self) -> &'static str {
            "short"
        }

        fn solve(&self, _program: &LinearProgram) -> Result<SolveOutcome, PlanningError> {
            Ok(SolveOutcome::Optimal(crate::lp::LpSolution {
                values: vec![1.0],
                objective: 0.0,
                slacks: Vec::new(),
            }))
        }
    }

    #[test]
    fn test_value_count_mismatch() {
        let forecast = DemandForecast::new().with("M", 1.0);
        let err = planner()
            .with_solver(ShortSolver)
            .plan_with_forecast(&materials(), &plants(), &costs(), &forecast)
            .unwrap_err();
        assert!(matches!(err, PlanningError::Solver(_)));
    }

    #[derive(Debug)]
    struct SleepySolver;

    impl LpSolver for SleepySolver {
        fn name(&self) -> &'static str {
            "sleepy"
        }

        fn solve(&self, program: &LinearProgram) -> Result<SolveOutcome, PlanningError> {
            std::thread::sleep(Duration::from_millis(500));
            MicroLpSolver.solve(program)
        }
    }

    #[test]
    fn test_timeout_reported_as_status() {
        let config = PlannerConfig::default().with_solve_timeout(Some(Duration::from_millis(20)));
        let forecast = DemandForecast::new().with("M", 50.0);
        let outcome = ProductionPlanner::new(config)
            .with_solver(SleepySolver)
            .plan_with_forecast(&materials(), &plants(), &costs(), &forecast)
            .unwrap();
        assert_eq!(outcome.status, SolveStatus::TimedOut);
        assert!(outcome.allocation.is_none());
    }

    #[derive(Debug)]
    struct PanicSolver;

    impl LpSolver for PanicSolver {
        fn name(&self) -> &'static str {
            "panic"
        }

        fn solve(&self, _program: &LinearProgram) -> Result<SolveOutcome, PlanningError> {
            panic!("solver must not be invoked");
        }
    }

    #[test]
    fn test_negative_round_off_snapped() {
        let lp = AllocationModelBuilder::new(
            &materials(),
            &plants(),
            &costs(),
            &DemandForecast::new().with("M", 1.0),
        )
        .build()
        .unwrap();
        let alloc = planner().to_allocation(&lp, &[-1e-9, 1.0]).unwrap();
        assert_eq!(alloc.quantity("P1", "M"), Some(0.0));
        assert_eq!(alloc.quantity("P2", "M"), Some(1.0));
    }
}
