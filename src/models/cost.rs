//! Plant × material cost matrix.
//!
//! The matrix is deliberately partial: a missing (plant, material) entry means
//! the plant cannot produce that material. Lookups return `Option` so the
//! absence can never be mistaken for a zero cost.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::validation::{InputError, InputErrorKind};

/// Cost type that [`CostMatrix::from_records`] keeps.
pub const PRODUCTION_COST_TYPE: &str = "Production";

/// Partial mapping (plant, material) → unit production cost.
///
/// Stored as `plant → material → cost` in ordered maps, so iteration order
/// (and everything derived from it) is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CostMatrix {
    entries: BTreeMap<String, BTreeMap<String, f64>>,
}

/// A raw cost row as delivered by the ingestion layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostRecord {
    /// Plant the cost applies to.
    pub plant_id: String,
    /// Material the cost applies to.
    pub material_id: String,
    /// Cost category (only `"Production"` rows become matrix entries).
    pub cost_type: String,
    /// Cost per unit.
    pub cost_per_unit: f64,
}

impl CostRecord {
    /// Creates a production cost record.
    pub fn production(
        plant_id: impl Into<String>,
        material_id: impl Into<String>,
        cost_per_unit: f64,
    ) -> Self {
        Self {
            plant_id: plant_id.into(),
            material_id: material_id.into(),
            cost_type: PRODUCTION_COST_TYPE.to_string(),
            cost_per_unit,
        }
    }

    /// Sets the cost type.
    pub fn with_cost_type(mut self, cost_type: impl Into<String>) -> Self {
        self.cost_type = cost_type.into();
        self
    }
}

impl CostMatrix {
    /// Creates an empty matrix (no plant can produce anything).
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) an entry.
    pub fn with_cost(
        mut self,
        plant_id: impl Into<String>,
        material_id: impl Into<String>,
        unit_cost: f64,
    ) -> Self {
        self.insert(plant_id, material_id, unit_cost);
        self
    }

    /// Inserts an entry, returning the previous cost if one existed.
    pub fn insert(
        &mut self,
        plant_id: impl Into<String>,
        material_id: impl Into<String>,
        unit_cost: f64,
    ) -> Option<f64> {
        self.entries
            .entry(plant_id.into())
            .or_default()
            .insert(material_id.into(), unit_cost)
    }

    /// Builds a matrix from raw cost rows.
    ///
    /// Rows whose `cost_type` is not `"Production"` are ignored. Duplicate
    /// production rows for the same (plant, material) and negative or
    /// non-finite costs are rejected; all problems are reported together.
    pub fn from_records(records: &[CostRecord]) -> Result<Self, Vec<InputError>> {
        let mut matrix = Self::new();
        let mut errors = Vec::new();

        for rec in records.iter().filter(|r| r.cost_type == PRODUCTION_COST_TYPE) {
            if !rec.cost_per_unit.is_finite() || rec.cost_per_unit < 0.0 {
                errors.push(InputError::new(
                    InputErrorKind::InvalidCost,
                    format!(
                        "Cost for ({}, {}) must be a non-negative number, got {}",
                        rec.plant_id, rec.material_id, rec.cost_per_unit
                    ),
                ));
                continue;
            }
            if matrix
                .insert(&rec.plant_id, &rec.material_id, rec.cost_per_unit)
                .is_some()
            {
                errors.push(InputError::new(
                    InputErrorKind::DuplicateId,
                    format!(
                        "Duplicate production cost for ({}, {})",
                        rec.plant_id, rec.material_id
                    ),
                ));
            }
        }

        if errors.is_empty() {
            Ok(matrix)
        } else {
            Err(errors)
        }
    }

    /// Unit cost of producing `material_id` at `plant_id`, if the plant can.
    pub fn get(&self, plant_id: &str, material_id: &str) -> Option<f64> {
        self.entries
            .get(plant_id)
            .and_then(|row| row.get(material_id))
            .copied()
    }

    /// Whether `plant_id` can produce `material_id`.
    pub fn can_produce(&self, plant_id: &str, material_id: &str) -> bool {
        self.get(plant_id, material_id).is_some()
    }

    /// Plants able to produce a material, in id order.
    pub fn plants_for(&self, material_id: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(_, row)| row.contains_key(material_id))
            .map(|(plant, _)| plant.as_str())
            .collect()
    }

    /// Materials a plant can produce, in id order.
    pub fn materials_for(&self, plant_id: &str) -> Vec<&str> {
        self.entries
            .get(plant_id)
            .map(|row| row.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Cheapest unit cost for a material across all plants.
    pub fn cheapest_cost(&self, material_id: &str) -> Option<f64> {
        self.entries
            .values()
            .filter_map(|row| row.get(material_id).copied())
            .min_by(|a, b| a.total_cmp(b))
    }

    /// All entries as `(plant, material, cost)`, ordered by plant then material.
    pub fn routes(&self) -> impl Iterator<Item = (&str, &str, f64)> + '_ {
        self.entries.iter().flat_map(|(plant, row)| {
            row.iter()
                .map(move |(material, cost)| (plant.as_str(), material.as_str(), *cost))
        })
    }

    /// Number of (plant, material) entries.
    pub fn len(&self) -> usize {
        self.entries.values().map(BTreeMap::len).sum()
    }

    /// Whether the matrix has no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
