//! Planner configuration.
//!
//! Every field has a default, so a partial JSON document (or `{}`) is a
//! valid configuration.
//!
//! ```
//! use u_allocate::config::PlannerConfig;
//! use u_allocate::forecasting::ForecastMethod;
//!
//! let config = PlannerConfig::from_json_str(
//!     r#"{ "forecast_method": "linear_trend", "solve_timeout_ms": 5000 }"#,
//! ).unwrap();
//! assert_eq!(config.forecast_method, ForecastMethod::LinearTrend);
//! assert_eq!(config.window, 3);
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::PlanningError;
use crate::forecasting::{AnomalyMethod, ForecastMethod, DEFAULT_WINDOW};

/// Default relative feasibility tolerance.
pub const DEFAULT_TOLERANCE: f64 = 1e-6;
/// Default solver time budget (ms).
pub const DEFAULT_SOLVE_TIMEOUT_MS: u64 = 30_000;

/// Planning cycle settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Forecasting method.
    pub forecast_method: ForecastMethod,
    /// Moving-average window (≥ 1).
    pub window: usize,
    /// Anomaly filter applied before forecasting (`None` = no cleaning).
    pub anomaly: Option<AnomalyMethod>,
    /// Relative tolerance for solution validation.
    pub tolerance: f64,
    /// Solver time budget in ms (`None` = unlimited, solve inline).
    pub solve_timeout_ms: Option<u64>,
    /// Forecast materials in parallel.
    pub parallel_forecast: bool,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            forecast_method: ForecastMethod::default(),
            window: DEFAULT_WINDOW,
            anomaly: Some(AnomalyMethod::iqr()),
            tolerance: DEFAULT_TOLERANCE,
            solve_timeout_ms: Some(DEFAULT_SOLVE_TIMEOUT_MS),
            parallel_forecast: true,
        }
    }
}

impl PlannerConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses and validates a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, PlanningError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| PlanningError::ConfigLoad(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, PlanningError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| PlanningError::ConfigLoad(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&text)
    }

    /// Sets the forecasting method.
    pub fn with_method(mut self, method: ForecastMethod) -> Self {
        self.forecast_method = method;
        self
    }

    /// Sets the moving-average window.
    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }

    /// Sets the anomaly filter.
    pub fn with_anomaly(mut self, anomaly: Option<AnomalyMethod>) -> Self {
        self.anomaly = anomaly;
        self
    }

    /// Sets the validation tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Sets the solver time budget, rounded up to whole milliseconds.
    pub fn with_solve_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.solve_timeout_ms = timeout.map(|t| t.as_nanos().div_ceil(1_000_000) as u64);
        self
    }

    /// Enables or disables parallel forecasting.
    pub fn with_parallel_forecast(mut self, parallel: bool) -> Self {
        self.parallel_forecast = parallel;
        self
    }

    /// Solver time budget as a `Duration`.
    pub fn solve_timeout(&self) -> Option<Duration> {
        self.solve_timeout_ms.map(Duration::from_millis)
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), PlanningError> {
        if self.window == 0 {
            return Err(PlanningError::InvalidConfig("window must be at least 1".into()));
        }
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(PlanningError::InvalidConfig(format!(
                "tolerance must be positive, got {}",
                self.tolerance
            )));
        }
        if self.solve_timeout_ms == Some(0) {
            return Err(PlanningError::InvalidConfig(
                "solve_timeout_ms must be positive (use null for no limit)".into(),
            ));
        }
        match self.anomaly {
            Some(AnomalyMethod::Iqr { multiplier }) if !(multiplier.is_finite() && multiplier > 0.0) => {
                Err(PlanningError::InvalidConfig(format!(
                    "IQR multiplier must be positive, got {multiplier}"
                )))
            }
            Some(AnomalyMethod::ZScore { threshold }) if !(threshold.is_finite() && threshold > 0.0) => {
                Err(PlanningError::InvalidConfig(format!(
                    "z-score threshold must be positive, got {threshold}"
                )))
            }
            _ => Ok(()),
        }
    }
}
