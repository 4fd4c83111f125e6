//! Per-material demand estimation with parallel fan-out.
//!
//! Each worker reads one material's series and produces one forecast entry.
//! Keys are disjoint, so results are joined into the forecast map after all
//! workers finish; no shared accumulator is written concurrently.

use std::collections::BTreeMap;
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, warn};

use super::{AnomalyMethod, ForecastMethod, ForecastWarning, Forecaster};
use crate::config::PlannerConfig;
use crate::models::{DemandForecast, HistoricalSeries};

/// Forecast for one material with cleaning diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialForecast {
    /// Material id.
    pub material_id: String,
    /// Forecast quantity (≥ 0).
    pub quantity: f64,
    /// Number of historical observations.
    pub observations: usize,
    /// Observations replaced by the anomaly filter.
    pub anomalies_replaced: usize,
    /// Non-fatal condition met while cleaning.
    pub warning: Option<ForecastWarning>,
}

/// Output of [`DemandEstimator::estimate_all`].
#[derive(Debug, Clone, Default)]
pub struct ForecastRun {
    /// Forecast map for the planning period.
    pub forecast: DemandForecast,
    /// Per-material details, in material id order.
    pub details: Vec<MaterialForecast>,
}

impl ForecastRun {
    /// Materials whose cleaning produced a warning.
    pub fn warnings(&self) -> Vec<(&str, ForecastWarning)> {
        self.details
            .iter()
            .filter_map(|d| d.warning.map(|w| (d.material_id.as_str(), w)))
            .collect()
    }
}

/// Cleans and forecasts demand history.
#[derive(Debug, Clone)]
pub struct DemandEstimator {
    forecaster: Arc<dyn Forecaster>,
    anomaly: Option<AnomalyMethod>,
    parallel: bool,
}

impl DemandEstimator {
    /// Creates an estimator with a built-in method and IQR cleaning.
    pub fn new(method: ForecastMethod, window: usize) -> Self {
        Self {
            forecaster: Arc::from(method.forecaster(window)),
            anomaly: Some(AnomalyMethod::iqr()),
            parallel: true,
        }
    }

    /// Creates an estimator from planner configuration.
    pub fn from_config(config: &PlannerConfig) -> Self {
        Self::new(config.forecast_method, config.window)
            .with_anomaly_filter(config.anomaly)
            .with_parallel(config.parallel_forecast)
    }

    /// Uses a custom forecasting method.
    pub fn with_forecaster<F: Forecaster + 'static>(mut self, forecaster: F) -> Self {
        self.forecaster = Arc::new(forecaster);
        self
    }

    /// Sets the anomaly filter (`None` disables cleaning).
    pub fn with_anomaly_filter(mut self, anomaly: Option<AnomalyMethod>) -> Self {
        self.anomaly = anomaly;
        self
    }

    /// Enables or disables parallel per-material estimation.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// The forecasting method in use.
    pub fn forecaster(&self) -> &dyn Forecaster {
        self.forecaster.as_ref()
    }

    /// Cleans and forecasts a single material. The series is not modified.
    pub fn estimate(&self, material_id: &str, series: &HistoricalSeries) -> MaterialForecast {
        let (values, replaced, warning) = match &self.anomaly {
            Some(method) => {
                let cleaned = method.clean(series.values());
                (cleaned.values, cleaned.replaced, cleaned.warning)
            }
            None => (series.values().to_vec(), 0, None),
        };

        if let Some(w) = warning {
            warn!(material = material_id, warning = ?w, "anomaly filter degenerated, series left as is");
        }

        let quantity = self.forecaster.forecast(&values);
        debug!(
            material = material_id,
            method = self.forecaster.name(),
            observations = series.len(),
            replaced,
            quantity,
            "forecast"
        );

        MaterialForecast {
            material_id: material_id.to_string(),
            quantity,
            observations: series.len(),
            anomalies_replaced: replaced,
            warning,
        }
    }

    /// Forecasts every material in `history`.
    pub fn estimate_all(&self, history: &BTreeMap<String, HistoricalSeries>) -> ForecastRun {
        let items: Vec<(&String, &HistoricalSeries)> = history.iter().collect();

        let details: Vec<MaterialForecast> = if self.parallel {
            items
                .par_iter()
                .map(|(id, series)| self.estimate(id, series))
                .collect()
        } else {
            items
                .iter()
                .map(|(id, series)| self.estimate(id, series))
                .collect()
        };

        let forecast = details
            .iter()
            .map(|d| (d.material_id.clone(), d.quantity))
            .collect();

        ForecastRun { forecast, details }
    }
}
