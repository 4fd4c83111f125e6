//! Built-in single-period forecasting methods.
//!
//! # Methods
//!
//! - **MA**: mean of the last `w` observations
//! - **WMA**: fixed most-recent-first weight vectors, renormalized for short series
//! - **TREND**: least-squares line over the whole series, evaluated one step ahead
//!
//! # Output Convention
//! Every method returns a finite value ≥ 0. An empty series forecasts 0.
//!
//! # Reference
//! Hyndman & Athanasopoulos (2021), "Forecasting: Principles and Practice", Ch. 3, 7

use serde::{Deserialize, Serialize};

use super::Forecaster;

/// Default moving-average window.
pub const DEFAULT_WINDOW: usize = 3;

/// Forecasting method selector (configuration form of the built-in methods).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForecastMethod {
    /// Simple moving average.
    #[default]
    MovingAverage,
    /// Weighted moving average.
    WeightedMovingAverage,
    /// Linear trend extrapolation.
    LinearTrend,
}

impl ForecastMethod {
    /// Instantiates the method with the given window.
    ///
    /// The window is ignored by [`LinearTrend`], which fits the whole series.
    pub fn forecaster(self, window: usize) -> Box<dyn Forecaster> {
        match self {
            Self::MovingAverage => Box::new(MovingAverage::new(window)),
            Self::WeightedMovingAverage => Box::new(WeightedMovingAverage::new(window)),
            Self::LinearTrend => Box::new(LinearTrend::new(window)),
        }
    }
}

#[inline]
fn non_negative(value: f64) -> f64 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}

// ======================== Moving average ========================

/// Simple Moving Average.
///
/// Mean of the last `min(window, len)` observations. Observations outside
/// the window have no influence.
#[derive(Debug, Clone, Copy)]
pub struct MovingAverage {
    window: usize,
}

impl MovingAverage {
    /// Creates a moving average; a zero window is treated as 1.
    pub fn new(window: usize) -> Self {
        Self {
            window: window.max(1),
        }
    }
}

impl Forecaster for MovingAverage {
    fn name(&self) -> &'static str {
        "MA"
    }

    fn forecast(&self, series: &[f64]) -> f64 {
        if series.is_empty() {
            return 0.0;
        }
        let w = self.window.min(series.len());
        let tail = &series[series.len() - w..];
        non_negative(tail.iter().sum::<f64>() / w as f64)
    }

    fn description(&self) -> &'static str {
        "Simple Moving Average"
    }
}

// ======================== Weighted moving average ========================

/// Weighted Moving Average.
///
/// Weights are listed most-recent-first and sum to 1:
///
/// | Window | Weights |
/// |--------|---------|
/// | 1 | 1.0 |
/// | 2 | 0.6, 0.4 |
/// | 3 | 0.5, 0.3, 0.2 |
/// | 4 | 0.4, 0.3, 0.2, 0.1 |
/// | n > 4 | n, n−1, …, 1 normalized |
///
/// A series shorter than the window uses the leading weights, renormalized.
#[derive(Debug, Clone)]
pub struct WeightedMovingAverage {
    weights: Vec<f64>,
}

impl WeightedMovingAverage {
    /// Creates a weighted moving average; a zero window is treated as 1.
    pub fn new(window: usize) -> Self {
        Self {
            weights: Self::weights_for(window.max(1)),
        }
    }

    /// Most-recent-first weight vector for a window size.
    pub fn weights_for(window: usize) -> Vec<f64> {
        match window {
            0 | 1 => vec![1.0],
            2 => vec![0.6, 0.4],
            3 => vec![0.5, 0.3, 0.2],
            4 => vec![0.4, 0.3, 0.2, 0.1],
            n => {
                let total = (n * (n + 1) / 2) as f64;
                (1..=n).rev().map(|k| k as f64 / total).collect()
            }
        }
    }

    /// Weights in use, most recent first.
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }
}

impl Forecaster for WeightedMovingAverage {
    fn name(&self) -> &'static str {
        "WMA"
    }

    fn forecast(&self, series: &[f64]) -> f64 {
        if series.is_empty() {
            return 0.0;
        }
        let w = self.weights.len().min(series.len());
        let weights = &self.weights[..w];
        let norm: f64 = weights.iter().sum();
        let weighted: f64 = series
            .iter()
            .rev()
            .zip(weights)
            .map(|(v, wt)| v * wt)
            .sum();
        non_negative(weighted / norm)
    }

    fn description(&self) -> &'static str {
        "Weighted Moving Average"
    }
}

// ======================== Linear trend ========================

/// Linear Trend.
///
/// Fits `y = a + b·t` by ordinary least squares over `t = 0..n` and returns
/// the fitted value at `t = n`. With fewer than two observations, falls back
/// to a moving average.
#[derive(Debug, Clone, Copy)]
pub struct LinearTrend {
    fallback: MovingAverage,
}

impl LinearTrend {
    /// Creates a linear trend; `window` configures the short-series fallback.
    pub fn new(window: usize) -> Self {
        Self {
            fallback: MovingAverage::new(window),
        }
    }

    /// Least-squares `(intercept, slope)` for the series against its index.
    ///
    /// Returns `None` with fewer than two observations.
    pub fn fit(series: &[f64]) -> Option<(f64, f64)> {
        let n = series.len();
        if n < 2 {
            return None;
        }
        let nf = n as f64;
        let mean_t = (nf - 1.0) / 2.0;
        let mean_y = series.iter().sum::<f64>() / nf;

        let (mut sxy, mut sxx) = (0.0, 0.0);
        for (t, y) in series.iter().enumerate() {
            let dt = t as f64 - mean_t;
            sxy += dt * (y - mean_y);
            sxx += dt * dt;
        }
        let slope = sxy / sxx;
        Some((mean_y - slope * mean_t, slope))
    }
}

impl Default for LinearTrend {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}

impl Forecaster for LinearTrend {
    fn name(&self) -> &'static str {
        "TREND"
    }

    fn forecast(&self, series: &[f64]) -> f64 {
        match Self::fit(series) {
            Some((intercept, slope)) => non_negative(intercept + slope * series.len() as f64),
            None => self.fallback.forecast(series),
        }
    }

    fn description(&self) -> &'static str {
        "Least-squares Linear Trend"
    }
}
