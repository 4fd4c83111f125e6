//! Allocation (solution) model.
//!
//! An allocation assigns a production quantity to each (plant, material)
//! route of the cost matrix. Violations describe constraint breaches found
//! when the allocation is checked against the inputs it was built from.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{CostMatrix, Material};

/// Production quantities per (plant, material).
///
/// Lines are kept sorted by plant then material and each route appears once.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    lines: Vec<AllocationLine>,
}

/// Quantity of one material produced at one plant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationLine {
    /// Producing plant.
    pub plant_id: String,
    /// Produced material.
    pub material_id: String,
    /// Units to produce.
    pub quantity: f64,
}

/// A constraint breach in an allocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    /// Breached constraint family.
    pub kind: ViolationKind,
    /// Material id (demand, route) or plant id (capacity).
    pub entity_id: String,
    /// Shortfall or overage amount (units or hours).
    pub amount: f64,
    /// Human-readable description.
    pub message: String,
}

/// Classification of allocation violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViolationKind {
    /// Total production of a material is below its forecast.
    DemandShortfall,
    /// Hours used at a plant exceed its capacity.
    CapacityExceeded,
    /// Quantity on a route missing from the cost matrix.
    UnknownRoute,
    /// Negative production quantity.
    NegativeQuantity,
    /// NaN or infinite production quantity.
    NonFiniteQuantity,
}

impl AllocationLine {
    /// Creates an allocation line.
    pub fn new(plant_id: impl Into<String>, material_id: impl Into<String>, quantity: f64) -> Self {
        Self {
            plant_id: plant_id.into(),
            material_id: material_id.into(),
            quantity,
        }
    }
}

impl Violation {
    /// Creates a demand shortfall violation.
    pub fn demand_shortfall(material_id: impl Into<String>, amount: f64) -> Self {
        let material_id = material_id.into();
        Self {
            message: format!("Material '{material_id}' is short by {amount:.6} units"),
            kind: ViolationKind::DemandShortfall,
            entity_id: material_id,
            amount,
        }
    }

    /// Creates a capacity exceeded violation.
    pub fn capacity_exceeded(plant_id: impl Into<String>, amount: f64) -> Self {
        let plant_id = plant_id.into();
        Self {
            message: format!("Plant '{plant_id}' exceeds capacity by {amount:.6} hours"),
            kind: ViolationKind::CapacityExceeded,
            entity_id: plant_id,
            amount,
        }
    }

    /// Creates an unknown route violation.
    pub fn unknown_route(plant_id: &str, material_id: impl Into<String>, amount: f64) -> Self {
        let material_id = material_id.into();
        Self {
            message: format!(
                "Plant '{plant_id}' cannot produce '{material_id}' but was allocated {amount:.6} units"
            ),
            kind: ViolationKind::UnknownRoute,
            entity_id: material_id,
            amount,
        }
    }

    /// Creates a non-finite quantity violation.
    pub fn non_finite_quantity(plant_id: &str, material_id: impl Into<String>, amount: f64) -> Self {
        let material_id = material_id.into();
        Self {
            message: format!("Plant '{plant_id}' has non-finite quantity {amount} for '{material_id}'"),
            kind: ViolationKind::NonFiniteQuantity,
            entity_id: material_id,
            amount,
        }
    }

    /// Creates a negative quantity violation.
    pub fn negative_quantity(plant_id: &str, material_id: impl Into<String>, amount: f64) -> Self {
        let material_id = material_id.into();
        Self {
            message: format!(
                "Plant '{plant_id}' has negative quantity {amount:.6} for '{material_id}'"
            ),
            kind: ViolationKind::NegativeQuantity,
            entity_id: material_id,
            amount,
        }
    }
}

impl Allocation {
    /// Creates an empty allocation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the quantity for a route, replacing any previous value.
    pub fn set(&mut self, plant_id: &str, material_id: &str, quantity: f64) {
        let pos = self.lines.binary_search_by(|l| {
            (l.plant_id.as_str(), l.material_id.as_str()).cmp(&(plant_id, material_id))
        });
        match pos {
            Ok(i) => self.lines[i].quantity = quantity,
            Err(i) => self
                .lines
                .insert(i, AllocationLine::new(plant_id, material_id, quantity)),
        }
    }

    /// Builder-style [`set`](Self::set).
    pub fn with(mut self, plant_id: &str, material_id: &str, quantity: f64) -> Self {
        self.set(plant_id, material_id, quantity);
        self
    }

    /// Quantity on a route (`None` if the route carries no line).
    pub fn quantity(&self, plant_id: &str, material_id: &str) -> Option<f64> {
        self.lines
            .iter()
            .find(|l| l.plant_id == plant_id && l.material_id == material_id)
            .map(|l| l.quantity)
    }

    /// All lines, ordered by plant then material.
    pub fn lines(&self) -> &[AllocationLine] {
        &self.lines
    }

    /// Lines for one plant.
    pub fn lines_for_plant(&self, plant_id: &str) -> Vec<&AllocationLine> {
        self.lines.iter().filter(|l| l.plant_id == plant_id).collect()
    }

    /// Total units of a material across all plants.
    pub fn total_for_material(&self, material_id: &str) -> f64 {
        self.lines
            .iter()
            .filter(|l| l.material_id == material_id)
            .map(|l| l.quantity)
            .sum()
    }

    /// Total units produced at a plant.
    pub fn units_for_plant(&self, plant_id: &str) -> f64 {
        self.lines
            .iter()
            .filter(|l| l.plant_id == plant_id)
            .map(|l| l.quantity)
            .sum()
    }

    /// Plant hours consumed, weighting each line by its material's unit time.
    ///
    /// Lines for materials not in `materials` contribute nothing.
    pub fn hours_for_plant(&self, plant_id: &str, materials: &[Material]) -> f64 {
        let times: HashMap<&str, f64> = materials
            .iter()
            .map(|m| (m.id.as_str(), m.production_time_per_unit))
            .collect();
        self.lines
            .iter()
            .filter(|l| l.plant_id == plant_id)
            .filter_map(|l| times.get(l.material_id.as_str()).map(|t| t * l.quantity))
            .sum()
    }

    /// Objective value: Σ cost × quantity over routes present in `costs`.
    pub fn total_cost(&self, costs: &CostMatrix) -> f64 {
        self.lines
            .iter()
            .filter_map(|l| {
                costs
                    .get(&l.plant_id, &l.material_id)
                    .map(|c| c * l.quantity)
            })
            .sum()
    }

    /// Total units across all lines.
    pub fn total_units(&self) -> f64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Number of lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether there are no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
