//! Input validation for allocation problems.
//!
//! Checks structural integrity of materials, plants, costs and demand data
//! before planning. Detects:
//! - Duplicate IDs
//! - Non-positive production times and negative capacities
//! - Cost entries referencing unknown plants or materials
//! - Negative or non-finite costs and demand observations
//! - History, forecasts or stock for unknown materials
//! - Negative or non-finite on-hand stock

use std::collections::{BTreeMap, HashSet};

use crate::models::{CostMatrix, DemandForecast, HistoricalSeries, Inventory, Material, Plant};

/// Validation result.
pub type ValidationResult = Result<(), Vec<InputError>>;

/// An input validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct InputError {
    /// Error category.
    pub kind: InputErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of input validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputErrorKind {
    /// Two entities share the same ID.
    DuplicateId,
    /// Production time is zero, negative or not finite.
    InvalidProductionTime,
    /// Capacity is negative or not finite.
    InvalidCapacity,
    /// Cost is negative or not finite.
    InvalidCost,
    /// A cost entry references a plant that doesn't exist.
    UnknownPlant,
    /// A cost entry, history, forecast or stock entry references a material that doesn't exist.
    UnknownMaterial,
    /// A demand observation, forecast or stock level is negative or not finite.
    InvalidDemand,
}

impl InputError {
    pub(crate) fn new(kind: InputErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for InputError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

/// Validates the reference data of an allocation problem.
///
/// Checks:
/// 1. No duplicate material IDs
/// 2. No duplicate plant IDs
/// 3. Production times are finite and positive
/// 4. Capacities are finite and non-negative
/// 5. Every cost entry references an existing plant and material
/// 6. Costs are finite and non-negative
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_reference_data(
    materials: &[Material],
    plants: &[Plant],
    costs: &CostMatrix,
) -> ValidationResult {
    let mut errors = Vec::new();

    let mut material_ids = HashSet::new();
    for m in materials {
        if !material_ids.insert(m.id.as_str()) {
            errors.push(InputError::new(
                InputErrorKind::DuplicateId,
                format!("Duplicate material ID: {}", m.id),
            ));
        }
        if !m.production_time_per_unit.is_finite() || m.production_time_per_unit <= 0.0 {
            errors.push(InputError::new(
                InputErrorKind::InvalidProductionTime,
                format!(
                    "Material '{}' has invalid production time {}",
                    m.id, m.production_time_per_unit
                ),
            ));
        }
    }

    let mut plant_ids = HashSet::new();
    for p in plants {
        if !plant_ids.insert(p.id.as_str()) {
            errors.push(InputError::new(
                InputErrorKind::DuplicateId,
                format!("Duplicate plant ID: {}", p.id),
            ));
        }
        if !p.capacity_hours.is_finite() || p.capacity_hours < 0.0 {
            errors.push(InputError::new(
                InputErrorKind::InvalidCapacity,
                format!("Plant '{}' has invalid capacity {}", p.id, p.capacity_hours),
            ));
        }
    }

    for (plant, material, cost) in costs.routes() {
        if !plant_ids.contains(plant) {
            errors.push(InputError::new(
                InputErrorKind::UnknownPlant,
                format!("Cost entry ({plant}, {material}) references unknown plant '{plant}'"),
            ));
        }
        if !material_ids.contains(material) {
            errors.push(InputError::new(
                InputErrorKind::UnknownMaterial,
                format!(
                    "Cost entry ({plant}, {material}) references unknown material '{material}'"
                ),
            ));
        }
        if !cost.is_finite() || cost < 0.0 {
            errors.push(InputError::new(
                InputErrorKind::InvalidCost,
                format!("Cost entry ({plant}, {material}) has invalid cost {cost}"),
            ));
        }
    }

    into_result(errors)
}

/// Validates demand history: known materials and non-negative finite values.
pub fn validate_history(
    materials: &[Material],
    history: &BTreeMap<String, HistoricalSeries>,
) -> ValidationResult {
    let material_ids: HashSet<&str> = materials.iter().map(|m| m.id.as_str()).collect();
    let mut errors = Vec::new();

    for (material_id, series) in history {
        if !material_ids.contains(material_id.as_str()) {
            errors.push(InputError::new(
                InputErrorKind::UnknownMaterial,
                format!("History references unknown material '{material_id}'"),
            ));
        }
        if let Some((idx, value)) = series
            .values()
            .iter()
            .enumerate()
            .find(|(_, v)| !v.is_finite() || **v < 0.0)
        {
            errors.push(InputError::new(
                InputErrorKind::InvalidDemand,
                format!("History of '{material_id}' has invalid value {value} at period {idx}"),
            ));
        }
    }

    into_result(errors)
}

/// Validates a forecast: known materials and non-negative finite values.
pub fn validate_forecast(materials: &[Material], forecast: &DemandForecast) -> ValidationResult {
    let material_ids: HashSet<&str> = materials.iter().map(|m| m.id.as_str()).collect();
    let mut errors = Vec::new();

    for (material_id, quantity) in forecast.iter() {
        if !material_ids.contains(material_id) {
            errors.push(InputError::new(
                InputErrorKind::UnknownMaterial,
                format!("Forecast references unknown material '{material_id}'"),
            ));
        }
        if !quantity.is_finite() {
            errors.push(InputError::new(
                InputErrorKind::InvalidDemand,
                format!("Forecast for '{material_id}' is not finite"),
            ));
        }
    }

    into_result(errors)
}

/// Validates on-hand stock: known materials and non-negative finite levels.
pub fn validate_inventory(materials: &[Material], inventory: &Inventory) -> ValidationResult {
    let material_ids: HashSet<&str> = materials.iter().map(|m| m.id.as_str()).collect();
    let mut errors = Vec::new();

    for (material_id, on_hand) in inventory.iter() {
        if !material_ids.contains(material_id) {
            errors.push(InputError::new(
                InputErrorKind::UnknownMaterial,
                format!("Inventory references unknown material '{material_id}'"),
            ));
        }
        if !on_hand.is_finite() || on_hand < 0.0 {
            errors.push(InputError::new(
                InputErrorKind::InvalidDemand,
                format!("Inventory of '{material_id}' has invalid level {on_hand}"),
            ));
        }
    }

    into_result(errors)
}

/// Validates reference data and history together, reporting all issues.
pub fn validate_input(
    materials: &[Material],
    plants: &[Plant],
    costs: &CostMatrix,
    history: &BTreeMap<String, HistoricalSeries>,
) -> ValidationResult {
    let mut errors = Vec::new();
    if let Err(e) = validate_reference_data(materials, plants, costs) {
        errors.extend(e);
    }
    if let Err(e) = validate_history(materials, history) {
        errors.extend(e);
    }
    into_result(errors)
}

fn into_result(errors: Vec<InputError>) -> ValidationResult {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
