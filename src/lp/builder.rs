//! Allocation model construction.
//!
//! # Formulation
//!
//! ```text
//! V = {(p, m) : cost[p, m] defined}
//! minimize   Σ_{(p,m)∈V} cost[p,m] · x[p,m]
//! subject to Σ_p x[p,m] ≥ forecast[m]                     ∀ m with a producing plant
//!            Σ_m time[m] · x[p,m] ≤ capacity[p]            ∀ p
//!            x[p,m] ≥ 0
//! ```
//!
//! A material with positive demand and no producing plant makes the model
//! infeasible by construction; it is reported as a data gap instead of being
//! dropped.
//!
//! # Reference
//! Hillier & Lieberman (2015), "Introduction to Operations Research", Ch. 3

use std::collections::HashMap;

use tracing::info;

use super::{ConstraintKind, DecisionVariable, LinearConstraint, LinearProgram, Relation, RouteKey};
use crate::error::PlanningError;
use crate::models::{CostMatrix, DemandForecast, Material, Plant};
use crate::validation::{validate_forecast, validate_reference_data};

/// Builds the allocation linear program. Performs no solving.
///
/// # Example
/// ```
/// use u_allocate::lp::AllocationModelBuilder;
/// use u_allocate::models::{CostMatrix, DemandForecast, Material, Plant};
///
/// let materials = vec![Material::new("M", 1.0)];
/// let plants = vec![Plant::new("P1", 100.0), Plant::new("P2", 80.0)];
/// let costs = CostMatrix::new().with_cost("P1", "M", 10.0).with_cost("P2", "M", 8.0);
/// let forecast = DemandForecast::new().with("M", 50.0);
///
/// let model = AllocationModelBuilder::new(&materials, &plants, &costs, &forecast)
///     .build()
///     .unwrap();
/// assert_eq!(model.variable_count(), 2);
/// assert_eq!(model.constraint_count(), 3);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct AllocationModelBuilder<'a> {
    materials: &'a [Material],
    plants: &'a [Plant],
    costs: &'a CostMatrix,
    forecast: &'a DemandForecast,
}

impl<'a> AllocationModelBuilder<'a> {
    /// Creates a builder over borrowed inputs.
    pub fn new(
        materials: &'a [Material],
        plants: &'a [Plant],
        costs: &'a CostMatrix,
        forecast: &'a DemandForecast,
    ) -> Self {
        Self {
            materials,
            plants,
            costs,
            forecast,
        }
    }

    /// Materials with positive demand that no plant can produce, in id order.
    pub fn data_gaps(&self) -> Vec<String> {
        let mut gaps: Vec<String> = self
            .materials
            .iter()
            .filter(|m| self.forecast.demand(&m.id) > 0.0)
            .filter(|m| self.costs.plants_for(&m.id).is_empty())
            .map(|m| m.id.clone())
            .collect();
        gaps.sort();
        gaps
    }

    /// Builds the linear program.
    ///
    /// # Errors
    /// - [`PlanningError::InvalidInput`] for inconsistent reference data or forecasts.
    /// - [`PlanningError::DataGap`] when a demanded material has no producing plant.
    pub fn build(&self) -> Result<LinearProgram, PlanningError> {
        let mut input_errors = Vec::new();
        if let Err(e) = validate_reference_data(self.materials, self.plants, self.costs) {
            input_errors.extend(e);
        }
        if let Err(e) = validate_forecast(self.materials, self.forecast) {
            input_errors.extend(e);
        }
        if !input_errors.is_empty() {
            return Err(PlanningError::InvalidInput(input_errors));
        }

        let gaps = self.data_gaps();
        if !gaps.is_empty() {
            return Err(PlanningError::DataGap { materials: gaps });
        }

        let times: HashMap<&str, f64> = self
            .materials
            .iter()
            .map(|m| (m.id.as_str(), m.production_time_per_unit))
            .collect();

        let variables: Vec<DecisionVariable> = self
            .costs
            .routes()
            .map(|(plant, material, cost)| DecisionVariable {
                key: RouteKey::new(plant, material),
                cost,
            })
            .collect();

        let mut constraints = Vec::with_capacity(self.materials.len() + self.plants.len());

        let mut materials: Vec<&Material> = self.materials.iter().collect();
        materials.sort_by(|a, b| a.id.cmp(&b.id));
        for m in materials {
            let terms: Vec<(usize, f64)> = variables
                .iter()
                .enumerate()
                .filter(|(_, v)| v.key.material_id == m.id)
                .map(|(idx, _)| (idx, 1.0))
                .collect();
            if terms.is_empty() {
                continue;
            }
            constraints.push(LinearConstraint {
                name: format!("Demand_{}", m.id),
                kind: ConstraintKind::Demand,
                entity_id: m.id.clone(),
                terms,
                relation: Relation::GreaterEq,
                rhs: self.forecast.demand(&m.id),
            });
        }

        let mut plants: Vec<&Plant> = self.plants.iter().collect();
        plants.sort_by(|a, b| a.id.cmp(&b.id));
        for p in plants {
            let terms: Vec<(usize, f64)> = variables
                .iter()
                .enumerate()
                .filter(|(_, v)| v.key.plant_id == p.id)
                .filter_map(|(idx, v)| times.get(v.key.material_id.as_str()).map(|t| (idx, *t)))
                .collect();
            constraints.push(LinearConstraint {
                name: format!("Capacity_{}", p.id),
                kind: ConstraintKind::Capacity,
                entity_id: p.id.clone(),
                terms,
                relation: Relation::LessEq,
                rhs: p.capacity_hours,
            });
        }

        let program = LinearProgram {
            variables,
            constraints,
        };
        info!(
            variables = program.variable_count(),
            constraints = program.constraint_count(),
            "allocation model built"
        );
        Ok(program)
    }
}
