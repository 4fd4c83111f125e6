//! Demand estimation: anomaly filtering and single-period forecasting.
//!
//! Each material's history is cleaned on a copy (anomalies replaced by the
//! series median) and then forecast by a [`Forecaster`]. Materials are
//! independent, so [`DemandEstimator`] fans them out across worker threads.
//!
//! # Usage
//!
//! ```
//! use std::collections::BTreeMap;
//! use u_allocate::forecasting::{AnomalyMethod, DemandEstimator, ForecastMethod};
//! use u_allocate::models::HistoricalSeries;
//!
//! let estimator = DemandEstimator::new(ForecastMethod::MovingAverage, 3)
//!     .with_anomaly_filter(Some(AnomalyMethod::iqr()));
//!
//! let mut history = BTreeMap::new();
//! history.insert("M1".to_string(), HistoricalSeries::new(vec![10.0, 11.0, 12.0]));
//! let run = estimator.estimate_all(&history);
//! assert!((run.forecast.demand("M1") - 11.0).abs() < 1e-9);
//! ```
//!
//! # References
//!
//! - Hyndman & Athanasopoulos (2021), "Forecasting: Principles and Practice"
//! - Tukey (1977), "Exploratory Data Analysis"

mod anomaly;
mod estimator;
mod history;
pub mod methods;

pub use anomaly::{
    median, quantile, AnomalyMethod, AnomalyScan, CleanedSeries, ForecastWarning,
    DEFAULT_IQR_MULTIPLIER, DEFAULT_ZSCORE_THRESHOLD,
};
pub use estimator::{DemandEstimator, ForecastRun, MaterialForecast};
pub use history::aggregate_orders;
pub use methods::{ForecastMethod, DEFAULT_WINDOW};

use std::fmt::Debug;

/// A single-period demand forecasting method.
///
/// # Output Convention
/// Implementations must be deterministic and return a finite value ≥ 0
/// for any input, including an empty series.
pub trait Forecaster: Send + Sync + Debug {
    /// Method name (e.g., "MA", "TREND").
    fn name(&self) -> &'static str;

    /// Forecasts the next period from a chronological series.
    fn forecast(&self, series: &[f64]) -> f64;

    /// Method description.
    fn description(&self) -> &'static str {
        self.name()
    }
}
