//! Plant model.
//!
//! Plants are the production sites an allocation distributes work over.
//! Each plant offers a fixed number of production hours per planning period.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A production plant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plant {
    /// Unique plant identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Production hours available per planning period (non-negative).
    pub capacity_hours: f64,
    /// Domain-specific metadata (e.g., region, company code).
    pub attributes: HashMap<String, String>,
}

impl Plant {
    /// Creates a new plant.
    pub fn new(id: impl Into<String>, capacity_hours: f64) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            capacity_hours,
            attributes: HashMap::new(),
        }
    }

    /// Sets the plant name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Adds a domain-specific attribute.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Fraction of capacity consumed by `hours_used`.
    ///
    /// Returns `None` for zero-capacity plants.
    pub fn utilization(&self, hours_used: f64) -> Option<f64> {
        if self.capacity_hours <= 0.0 {
            return None;
        }
        Some(hours_used / self.capacity_hours)
    }
}
