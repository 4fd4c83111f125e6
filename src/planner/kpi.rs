//! Allocation quality metrics (KPIs).
//!
//! Computes plant loading and cost indicators from an accepted allocation
//! and the inputs it was planned from.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Total Cost | Σ cost[p,m] · x[p,m] |
//! | Units / Hours by Plant | Σ_m x[p,m], Σ_m time[m] · x[p,m] |
//! | Utilization | hours / capacity (undefined for zero capacity) |
//! | Binding Plants | plants whose capacity slack is within tolerance |
//! | Demand Value | Σ_m forecast[m] · min_p cost[p,m] (lower cost bound) |
//!
//! # Reference
//! Nahmias & Olsen (2015), "Production and Operations Analysis", Ch. 3

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::{Allocation, CostMatrix, DemandForecast, Material, Plant};

/// Allocation performance indicators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanKpi {
    /// Objective value of the allocation.
    pub total_cost: f64,
    /// Units over all routes.
    pub total_units: f64,
    /// Units produced per plant.
    pub units_by_plant: BTreeMap<String, f64>,
    /// Hours consumed per plant.
    pub hours_by_plant: BTreeMap<String, f64>,
    /// Per-plant utilization (`None` for zero-capacity plants).
    pub utilization_by_plant: BTreeMap<String, Option<f64>>,
    /// Mean utilization over plants with positive capacity (0.0..1.0).
    pub avg_utilization: f64,
    /// Plants with positive capacity used to capacity, in id order.
    pub binding_plants: Vec<String>,
    /// Cost of covering the forecast at each material's cheapest route.
    pub demand_value: f64,
}

impl PlanKpi {
    /// Computes KPIs.
    ///
    /// # Arguments
    /// * `materials` - Materials with production times.
    /// * `plants` - Plants with capacities.
    /// * `costs` - Unit cost per route.
    /// * `forecast` - Demand the allocation covers.
    /// * `allocation` - The accepted allocation.
    /// * `tolerance` - Relative tolerance for the binding test.
    pub fn calculate(
        materials: &[Material],
        plants: &[Plant],
        costs: &CostMatrix,
        forecast: &DemandForecast,
        allocation: &Allocation,
        tolerance: f64,
    ) -> Self {
        let mut units_by_plant = BTreeMap::new();
        let mut hours_by_plant = BTreeMap::new();
        let mut utilization_by_plant = BTreeMap::new();
        let mut binding_plants = Vec::new();
        let mut util_sum = 0.0;
        let mut util_count = 0usize;

        for plant in plants {
            let units = allocation.units_for_plant(&plant.id);
            let hours = allocation.hours_for_plant(&plant.id, materials);
            let utilization = plant.utilization(hours);

            if let Some(u) = utilization {
                util_sum += u;
                util_count += 1;
                let slack = plant.capacity_hours - hours;
                if slack.abs() <= tolerance * plant.capacity_hours.max(1.0) {
                    binding_plants.push(plant.id.clone());
                }
            }

            units_by_plant.insert(plant.id.clone(), units);
            hours_by_plant.insert(plant.id.clone(), hours);
            utilization_by_plant.insert(plant.id.clone(), utilization);
        }
        binding_plants.sort();

        let avg_utilization = if util_count == 0 {
            0.0
        } else {
            util_sum / util_count as f64
        };

        let demand_value = forecast
            .iter()
            .filter_map(|(id, qty)| costs.cheapest_cost(id).map(|c| c * qty))
            .sum();

        Self {
            total_cost: allocation.total_cost(costs),
            total_units: allocation.total_units(),
            units_by_plant,
            hours_by_plant,
            utilization_by_plant,
            avg_utilization,
            binding_plants,
            demand_value,
        }
    }

    /// Whether the plan meets the given cost ceiling and loading floor.
    pub fn meets_thresholds(&self, max_cost: f64, min_utilization: f64) -> bool {
        self.total_cost <= max_cost && self.avg_utilization >= min_utilization
    }

    /// Cost above the cheapest-route bound (0 when every unit uses its cheapest plant).
    pub fn cost_premium(&self) -> f64 {
        (self.total_cost - self.demand_value).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs() -> (Vec<Material>, Vec<Plant>, CostMatrix) {
        (
            vec![Material::new("M", 1.0)],
            vec![
                Plant::new("P1", 100.0),
                Plant::new("P2", 80.0),
                Plant::new("P3", 0.0),
            ],
            CostMatrix::new()
                .with_cost("P1", "M", 10.0)
                .with_cost("P2", "M", 8.0),
        )
    }

    #[test]
    fn test_kpi_capacity_spill_over() {
        let (m, p, c) = inputs();
        let forecast = DemandForecast::new().with("M", 150.0);
        let alloc = Allocation::new().with("P1", "M", 70.0).with("P2", "M", 80.0);

        let kpi = PlanKpi::calculate(&m, &p, &c, &forecast, &alloc, 1e-6);
        assert!((kpi.total_cost - 1340.0).abs() < 1e-9);
        assert!((kpi.total_units - 150.0).abs() < 1e-9);
        assert!((kpi.hours_by_plant["P1"] - 70.0).abs() < 1e-9);
        assert!((kpi.units_by_plant["P2"] - 80.0).abs() < 1e-9);
        assert_eq!(kpi.utilization_by_plant["P3"], None);
        assert!((kpi.utilization_by_plant["P2"].unwrap() - 1.0).abs() < 1e-9);
        // (0.7 + 1.0) / 2, zero-capacity plant excluded
        assert!((kpi.avg_utilization - 0.85).abs() < 1e-9);
        assert_eq!(kpi.binding_plants, vec!["P2"]);
        assert!((kpi.demand_value - 1200.0).abs() < 1e-9);
        assert!((kpi.cost_premium() - 140.0).abs() < 1e-9);
    }

    #[test]
    fn test_kpi_empty_allocation() {
        let (m, p, c) = inputs();
        let kpi = PlanKpi::calculate(&m, &p, &c, &DemandForecast::new(), &Allocation::new(), 1e-6);
        assert!((kpi.total_cost - 0.0).abs() < 1e-10);
        assert!((kpi.avg_utilization - 0.0).abs() < 1e-10);
        assert!(kpi.binding_plants.is_empty());
        assert!((kpi.demand_value - 0.0).abs() < 1e-10);
    }

    #[test]
    fn test_meets_thresholds() {
        let (m, p, c) = inputs();
        let forecast = DemandForecast::new().with("M", 50.0);
        let alloc = Allocation::new().with("P2", "M", 50.0);
        let kpi = PlanKpi::calculate(&m, &p, &c, &forecast, &alloc, 1e-6);

        assert!(kpi.meets_thresholds(400.0, 0.3));
        assert!(!kpi.meets_thresholds(399.0, 0.3));
        assert!(!kpi.meets_thresholds(1000.0, 0.5));
    }
}
