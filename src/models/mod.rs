//! Production allocation domain models.
//!
//! Provides the reference data (materials, plants, costs), demand data
//! (history, forecasts, inventory) and the solution type (allocation).
//!
//! # Domain Mappings
//!
//! | u-allocate | Manufacturing | Energy | Logistics |
//! |------------|---------------|--------|-----------|
//! | Material | Product/SKU | Energy product | Commodity |
//! | Plant | Factory | Generator | Warehouse |
//! | CostMatrix | Unit production cost | Marginal cost | Handling cost |
//! | Allocation | Production plan | Dispatch | Stock assignment |

mod allocation;
mod cost;
mod demand;
mod material;
mod plant;

pub use allocation::{Allocation, AllocationLine, Violation, ViolationKind};
pub use cost::{CostMatrix, CostRecord, PRODUCTION_COST_TYPE};
pub use demand::{DemandForecast, HistoricalSeries, Inventory, OrderRecord};
pub use material::Material;
pub use plant::Plant;
