//! Material model.
//!
//! A material is a producible item. Its only planning-relevant property is
//! the number of plant hours one unit consumes; unit costs live in the
//! [`CostMatrix`](super::CostMatrix) because they vary by plant.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A material that plants can produce.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Material {
    /// Unique material identifier.
    pub id: String,
    /// Human-readable description.
    pub description: String,
    /// Plant hours consumed per unit produced (must be positive).
    pub production_time_per_unit: f64,
    /// Domain-specific metadata (e.g., unit of measure, product group).
    pub attributes: HashMap<String, String>,
}

impl Material {
    /// Creates a new material.
    pub fn new(id: impl Into<String>, production_time_per_unit: f64) -> Self {
        Self {
            id: id.into(),
            description: String::new(),
            production_time_per_unit,
            attributes: HashMap::new(),
        }
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Adds a domain-specific attribute.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Plant hours needed to produce `quantity` units.
    #[inline]
    pub fn hours_for(&self, quantity: f64) -> f64 {
        self.production_time_per_unit * quantity
    }
}
