//! Demand-side models: history, forecasts and on-hand inventory.
//!
//! # Lifecycle
//! `HistoricalSeries` arrives per material per planning cycle. A
//! `DemandForecast` is derived from it for exactly one period and is never
//! persisted. `Inventory` optionally nets the forecast down before allocation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Chronological past-period demand observations for one material.
///
/// Oldest observation first. May be empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoricalSeries {
    values: Vec<f64>,
}

impl HistoricalSeries {
    /// Creates a series from observations (oldest first).
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    /// Observations, oldest first.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Appends the observation for the next period.
    pub fn push(&mut self, value: f64) {
        self.values.push(value);
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether there are no observations.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl From<Vec<f64>> for HistoricalSeries {
    fn from(values: Vec<f64>) -> Self {
        Self::new(values)
    }
}

/// A single sales order line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRecord {
    /// Ordered material.
    pub material_id: String,
    /// Zero-based planning period the order falls into.
    pub period: usize,
    /// Ordered quantity.
    pub quantity: f64,
}

impl OrderRecord {
    /// Creates an order line.
    pub fn new(material_id: impl Into<String>, period: usize, quantity: f64) -> Self {
        Self {
            material_id: material_id.into(),
            period,
            quantity,
        }
    }
}

/// One-period demand estimate per material (all values non-negative).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DemandForecast {
    values: BTreeMap<String, f64>,
}

impl DemandForecast {
    /// Creates an empty forecast.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the forecast for a material. Negative values are clamped to zero.
    pub fn with(mut self, material_id: impl Into<String>, quantity: f64) -> Self {
        self.set(material_id, quantity);
        self
    }

    /// Sets the forecast for a material. Negative values are clamped to zero.
    pub fn set(&mut self, material_id: impl Into<String>, quantity: f64) {
        self.values.insert(material_id.into(), quantity.max(0.0));
    }

    /// Forecast for a material, if one was produced.
    pub fn get(&self, material_id: &str) -> Option<f64> {
        self.values.get(material_id).copied()
    }

    /// Forecast for a material, zero when absent.
    pub fn demand(&self, material_id: &str) -> f64 {
        self.get(material_id).unwrap_or(0.0)
    }

    /// Sum of all forecasts.
    pub fn total(&self) -> f64 {
        self.values.values().sum()
    }

    /// `(material, quantity)` pairs in material id order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.values.iter().map(|(id, q)| (id.as_str(), *q))
    }

    /// Number of materials with a forecast.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no material has a forecast.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Net requirement after consuming on-hand stock: `max(forecast - on_hand, 0)`.
    pub fn net_of(&self, inventory: &Inventory) -> DemandForecast {
        let values = self
            .values
            .iter()
            .map(|(id, q)| (id.clone(), (q - inventory.on_hand(id)).max(0.0)))
            .collect();
        Self { values }
    }
}

impl FromIterator<(String, f64)> for DemandForecast {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        let mut forecast = Self::new();
        for (id, q) in iter {
            forecast.set(id, q);
        }
        forecast
    }
}

/// On-hand stock per material, summed over storage locations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Inventory {
    on_hand: BTreeMap<String, f64>,
}

impl Inventory {
    /// Creates an empty inventory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds stock for a material (accumulates across locations).
    pub fn with_stock(mut self, material_id: impl Into<String>, quantity: f64) -> Self {
        self.add(material_id, quantity);
        self
    }

    /// Adds stock for a material (accumulates across locations).
    pub fn add(&mut self, material_id: impl Into<String>, quantity: f64) {
        *self.on_hand.entry(material_id.into()).or_insert(0.0) += quantity;
    }

    /// On-hand quantity, zero when unknown.
    pub fn on_hand(&self, material_id: &str) -> f64 {
        self.on_hand.get(material_id).copied().unwrap_or(0.0)
    }

    /// Stock entries in material id order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.on_hand.iter().map(|(id, q)| (id.as_str(), *q))
    }

    /// Inventory coverage: on-hand / demand.
    ///
    /// Returns `None` when demand is zero.
    pub fn coverage_ratio(&self, material_id: &str, demand: f64) -> Option<f64> {
        if demand <= 0.0 {
            return None;
        }
        Some(self.on_hand(material_id) / demand)
    }

    /// Whether stock does not cover demand (coverage < 1).
    pub fn needs_production(&self, material_id: &str, demand: f64) -> bool {
        self.coverage_ratio(material_id, demand)
            .is_some_and(|ratio| ratio < 1.0)
    }
}
