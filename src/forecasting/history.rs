//! Aggregation of order lines into per-material demand history.

use std::collections::BTreeMap;

use crate::models::{HistoricalSeries, OrderRecord};

/// Sums order quantities per material and period.
///
/// Every series spans periods `0..=max_period` (the latest period seen in
/// any order) so all materials share the same time axis; periods without
/// orders contribute zero demand.
pub fn aggregate_orders(orders: &[OrderRecord]) -> BTreeMap<String, HistoricalSeries> {
    let Some(max_period) = orders.iter().map(|o| o.period).max() else {
        return BTreeMap::new();
    };

    let mut buckets: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for order in orders {
        let bucket = buckets
            .entry(order.material_id.clone())
            .or_insert_with(|| vec![0.0; max_period + 1]);
        bucket[order.period] += order.quantity;
    }

    buckets
        .into_iter()
        .map(|(id, values)| (id, HistoricalSeries::new(values)))
        .collect()
}
