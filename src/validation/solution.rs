//! Independent feasibility check of an allocation.
//!
//! Recomputes, from the model inputs only, how much of each material is
//! produced and how many hours each plant uses. Solver-reported slacks are
//! ignored; every constraint is re-evaluated from the allocation.
//!
//! # Tolerance
//! A breach is reported only when it exceeds `tolerance × max(1, |bound|)`.
//! Non-finite line quantities and NaN totals are always breaches.

use serde::{Deserialize, Serialize};

use crate::models::{Allocation, CostMatrix, DemandForecast, Material, Plant, Violation};

/// Demand coverage of one material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandCheck {
    /// Material id.
    pub material_id: String,
    /// Forecast demand.
    pub required: f64,
    /// Units allocated across all plants.
    pub produced: f64,
}

/// Hours usage of one plant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityCheck {
    /// Plant id.
    pub plant_id: String,
    /// Available hours.
    pub capacity_hours: f64,
    /// Hours consumed by the allocation.
    pub used_hours: f64,
}

/// Result of [`check_allocation`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SolutionCheck {
    /// Per-material coverage, in material id order.
    pub demand: Vec<DemandCheck>,
    /// Per-plant usage, in plant id order.
    pub capacity: Vec<CapacityCheck>,
    /// Breaches beyond tolerance: demand first, then capacity, then routes.
    pub violations: Vec<Violation>,
}

impl DemandCheck {
    /// Produced minus required (negative means short).
    pub fn surplus(&self) -> f64 {
        self.produced - self.required
    }
}

impl CapacityCheck {
    /// Unused hours (negative means over capacity).
    pub fn slack(&self) -> f64 {
        self.capacity_hours - self.used_hours
    }

    /// Whether the plant is used to capacity within `tolerance`.
    pub fn is_binding(&self, tolerance: f64) -> bool {
        self.slack().abs() <= allowance(tolerance, self.capacity_hours)
    }
}

impl SolutionCheck {
    /// Whether no violation was found.
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }

    /// Coverage entry for a material.
    pub fn demand_for(&self, material_id: &str) -> Option<&DemandCheck> {
        self.demand.iter().find(|d| d.material_id == material_id)
    }

    /// Usage entry for a plant.
    pub fn capacity_for(&self, plant_id: &str) -> Option<&CapacityCheck> {
        self.capacity.iter().find(|c| c.plant_id == plant_id)
    }

    /// Converts into `Ok(self)` when passed, `Err(violations)` otherwise.
    pub fn into_result(self) -> Result<Self, Vec<Violation>> {
        if self.passed() {
            Ok(self)
        } else {
            Err(self.violations)
        }
    }
}

#[inline]
fn allowance(tolerance: f64, bound: f64) -> f64 {
    tolerance * bound.abs().max(1.0)
}

/// Checks an allocation against demand, capacity and route constraints.
///
/// # Arguments
/// * `materials` - Materials with production times.
/// * `plants` - Plants with capacities.
/// * `costs` - The cost matrix (defines the legal routes).
/// * `forecast` - Demand to cover; materials without a forecast need nothing.
/// * `allocation` - The allocation to classify.
/// * `tolerance` - Relative numerical tolerance.
pub fn check_allocation(
    materials: &[Material],
    plants: &[Plant],
    costs: &CostMatrix,
    forecast: &DemandForecast,
    allocation: &Allocation,
    tolerance: f64,
) -> SolutionCheck {
    let mut check = SolutionCheck::default();

    let mut sorted_materials: Vec<&Material> = materials.iter().collect();
    sorted_materials.sort_by(|a, b| a.id.cmp(&b.id));
    for m in sorted_materials {
        let required = forecast.demand(&m.id);
        let produced = allocation.total_for_material(&m.id);
        let shortfall = required - produced;
        if produced.is_nan() || shortfall > allowance(tolerance, required) {
            check
                .violations
                .push(Violation::demand_shortfall(&m.id, shortfall));
        }
        check.demand.push(DemandCheck {
            material_id: m.id.clone(),
            required,
            produced,
        });
    }

    let mut sorted_plants: Vec<&Plant> = plants.iter().collect();
    sorted_plants.sort_by(|a, b| a.id.cmp(&b.id));
    let mut capacity_violations = Vec::new();
    for p in sorted_plants {
        let used = allocation.hours_for_plant(&p.id, materials);
        let overage = used - p.capacity_hours;
        if used.is_nan() || overage > allowance(tolerance, p.capacity_hours) {
            capacity_violations.push(Violation::capacity_exceeded(&p.id, overage));
        }
        check.capacity.push(CapacityCheck {
            plant_id: p.id.clone(),
            capacity_hours: p.capacity_hours,
            used_hours: used,
        });
    }
    check.violations.extend(capacity_violations);

    for line in allocation.lines() {
        if !line.quantity.is_finite() {
            check.violations.push(Violation::non_finite_quantity(
                &line.plant_id,
                &line.material_id,
                line.quantity,
            ));
            continue;
        }
        if line.quantity < -allowance(tolerance, 0.0) {
            check.violations.push(Violation::negative_quantity(
                &line.plant_id,
                &line.material_id,
                line.quantity,
            ));
        }
        if !costs.can_produce(&line.plant_id, &line.material_id)
            && line.quantity.abs() > allowance(tolerance, 0.0)
        {
            check.violations.push(Violation::unknown_route(
                &line.plant_id,
                &line.material_id,
                line.quantity,
            ));
        }
    }

    check
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ViolationKind;

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

    #[test]
    fn test_feasible_allocation_passes() {
        let forecast = DemandForecast::new().with("M", 150.0);
        let allocation = Allocation::new().with("P1", "M", 70.0).with("P2", "M", 80.0);

        let check = check_allocation(&materials(), &plants(), &costs(), &forecast, &allocation, 1e-6);
        assert!(check.passed());

        let p1 = check.capacity_for("P1").unwrap();
        assert!((p1.used_hours - 70.0).abs() < 1e-10);
        assert!((p1.slack() - 30.0).abs() < 1e-10);
        assert!(!p1.is_binding(1e-6));

        let p2 = check.capacity_for("P2").unwrap();
        assert!((p2.used_hours - 80.0).abs() < 1e-10);
        assert!(p2.is_binding(1e-6));

        let m = check.demand_for("M").unwrap();
        assert!((m.surplus() - 0.0).abs() < 1e-10);
    }

    #[test]
    fn test_shortfall_detected() {
        let forecast = DemandForecast::new().with("M", 150.0);
        let allocation = Allocation::new().with("P2", "M", 80.0);

        let check = check_allocation(&materials(), &plants(), &costs(), &forecast, &allocation, 1e-6);
        assert_eq!(check.violations.len(), 1);
        assert_eq!(check.violations[0].kind, ViolationKind::DemandShortfall);
        assert_eq!(check.violations[0].entity_id, "M");
        assert!((check.violations[0].amount - 70.0).abs() < 1e-10);
    }

    #[test]
    fn test_capacity_overage_detected() {
        let forecast = DemandForecast::new().with("M", 90.0);
        let allocation = Allocation::new().with("P2", "M", 90.0);

        let violations =
            check_allocation(&materials(), &plants(), &costs(), &forecast, &allocation, 1e-6)
                .into_result()
                .unwrap_err();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::CapacityExceeded);
        assert_eq!(violations[0].entity_id, "P2");
        assert!((violations[0].amount - 10.0).abs() < 1e-10);
    }

    #[test]
    fn test_within_tolerance_is_accepted() {
        let forecast = DemandForecast::new().with("M", 80.0);
        // 1e-7 short and 1e-7 over: both inside 1e-6 × 80
        let allocation = Allocation::new().with("P2", "M", 80.0 - 1e-7);
        let check = check_allocation(&materials(), &plants(), &costs(), &forecast, &allocation, 1e-6);
        assert!(check.passed());

        let allocation = Allocation::new().with("P2", "M", 80.0 + 1e-7);
        let check = check_allocation(&materials(), &plants(), &costs(), &forecast, &allocation, 1e-6);
        assert!(check.passed());
    }

    #[test]
    fn test_route_violations() {
        let forecast = DemandForecast::new();
        let costs = CostMatrix::new().with_cost("P1", "M", 10.0);
        let allocation = Allocation::new().with("P2", "M", 5.0).with("P1", "M", -3.0);

        let check = check_allocation(&materials(), &plants(), &costs, &forecast, &allocation, 1e-6);
        let kinds: Vec<ViolationKind> = check.violations.iter().map(|v| v.kind).collect();
        assert_eq!(
            kinds,
            vec![ViolationKind::NegativeQuantity, ViolationKind::UnknownRoute]
        );
    }

    #[test]
    fn test_nan_quantity_rejected() {
        let forecast = DemandForecast::new().with("M", 50.0);
        let allocation = Allocation::new().with("P1", "M", f64::NAN);

        let check = check_allocation(&materials(), &plants(), &costs(), &forecast, &allocation, 1e-6);
        assert!(!check.passed());
        let kinds: Vec<ViolationKind> = check.violations.iter().map(|v| v.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ViolationKind::DemandShortfall,
                ViolationKind::CapacityExceeded,
                ViolationKind::NonFiniteQuantity,
            ]
        );
        assert_eq!(check.violations[1].entity_id, "P1");
    }

    #[test]
    fn test_infinite_quantity_rejected() {
        let forecast = DemandForecast::new().with("M", 50.0);
        let allocation = Allocation::new().with("P2", "M", f64::INFINITY);

        let check = check_allocation(&materials(), &plants(), &costs(), &forecast, &allocation, 1e-6);
        let kinds: Vec<ViolationKind> = check.violations.iter().map(|v| v.kind).collect();
        assert_eq!(
            kinds,
            vec![ViolationKind::CapacityExceeded, ViolationKind::NonFiniteQuantity]
        );
    }

    #[test]
    fn test_violation_order_demand_before_capacity() {
        let materials = vec![Material::new("A", 1.0), Material::new("B", 1.0)];
        let forecast = DemandForecast::new().with("A", 10.0).with("B", 200.0);
        let costs = CostMatrix::new()
            .with_cost("P1", "B", 1.0)
            .with_cost("P2", "B", 1.0);
        let allocation = Allocation::new().with("P1", "B", 120.0).with("P2", "B", 80.0);

        let check = check_allocation(&materials, &plants(), &costs, &forecast, &allocation, 1e-6);
        let kinds: Vec<ViolationKind> = check.violations.iter().map(|v| v.kind).collect();
        assert_eq!(
            kinds,
            vec![ViolationKind::DemandShortfall, ViolationKind::CapacityExceeded]
        );
        assert_eq!(check.violations[0].entity_id, "A");
        assert_eq!(check.violations[1].entity_id, "P1");
    }

    #[test]
    fn test_allocation_not_mutated() {
        let forecast = DemandForecast::new().with("M", 10.0);
        let allocation = Allocation::new().with("P1", "M", 5.0);
        let before = allocation.clone();
        let _ = check_allocation(&materials(), &plants(), &costs(), &forecast, &allocation, 1e-6);
        assert_eq!(allocation, before);
    }
}
