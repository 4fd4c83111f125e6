//! Outlier detection and cleaning for demand series.
//!
//! # Methods
//!
//! | Method | Rule | Degenerate case |
//! |--------|------|-----------------|
//! | IQR | x < Q1 − k·IQR or x > Q3 + k·IQR | IQR = 0 → nothing flagged |
//! | Z-score | \|x − µ\| / σ > t (population σ) | σ = 0 → nothing flagged, warning |
//!
//! Quartiles use linear interpolation between order statistics
//! (Hyndman & Fan type 7).
//!
//! # Reference
//! Tukey (1977), "Exploratory Data Analysis", Ch. 2

use serde::{Deserialize, Serialize};

/// Default IQR fence multiplier.
pub const DEFAULT_IQR_MULTIPLIER: f64 = 1.5;
/// Default z-score threshold.
pub const DEFAULT_ZSCORE_THRESHOLD: f64 = 3.0;

/// Anomaly detection strategy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum AnomalyMethod {
    /// Interquartile-range fences.
    Iqr {
        /// Fence multiplier `k`.
        multiplier: f64,
    },
    /// Standard-score threshold.
    ZScore {
        /// Flag when |z| exceeds this.
        threshold: f64,
    },
}

/// Non-fatal condition found while scanning a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ForecastWarning {
    /// Zero-variance series; the z-score rule cannot be applied.
    DegenerateInput,
}

/// Result of scanning a series for anomalies.
#[derive(Debug, Clone, PartialEq)]
pub struct AnomalyScan {
    /// One flag per observation, `true` = anomalous.
    pub mask: Vec<bool>,
    /// Set when the method degenerated on this series.
    pub warning: Option<ForecastWarning>,
}

/// A series with flagged observations replaced by the median.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanedSeries {
    /// Cleaned observations (same length and order as the input).
    pub values: Vec<f64>,
    /// Number of replaced observations.
    pub replaced: usize,
    /// Warning carried over from the scan.
    pub warning: Option<ForecastWarning>,
}

impl Default for AnomalyMethod {
    fn default() -> Self {
        Self::iqr()
    }
}

impl AnomalyMethod {
    /// IQR rule with the standard 1.5 multiplier.
    pub fn iqr() -> Self {
        Self::Iqr {
            multiplier: DEFAULT_IQR_MULTIPLIER,
        }
    }

    /// Z-score rule with the standard threshold of 3.
    pub fn zscore() -> Self {
        Self::ZScore {
            threshold: DEFAULT_ZSCORE_THRESHOLD,
        }
    }

    /// Method name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Iqr { .. } => "IQR",
            Self::ZScore { .. } => "Z-score",
        }
    }

    /// Flags anomalous observations. Pure: `series` is not modified.
    pub fn detect(&self, series: &[f64]) -> AnomalyScan {
        match *self {
            Self::Iqr { multiplier } => detect_iqr(series, multiplier),
            Self::ZScore { threshold } => detect_zscore(series, threshold),
        }
    }

    /// Returns a copy of `series` with anomalies replaced by the series median.
    pub fn clean(&self, series: &[f64]) -> CleanedSeries {
        let scan = self.detect(series);
        let replaced = scan.mask.iter().filter(|&&flag| flag).count();
        let values = if replaced == 0 {
            series.to_vec()
        } else {
            let med = median(series).unwrap_or(0.0);
            series
                .iter()
                .zip(&scan.mask)
                .map(|(&v, &flag)| if flag { med } else { v })
                .collect()
        };
        CleanedSeries {
            values,
            replaced,
            warning: scan.warning,
        }
    }
}

fn detect_iqr(series: &[f64], multiplier: f64) -> AnomalyScan {
    let mut mask = vec![false; series.len()];
    let mut sorted = series.to_vec();
    sorted.sort_by(f64::total_cmp);

    if let (Some(q1), Some(q3)) = (quantile(&sorted, 0.25), quantile(&sorted, 0.75)) {
        let iqr = q3 - q1;
        if iqr > 0.0 {
            let lower = q1 - multiplier * iqr;
            let upper = q3 + multiplier * iqr;
            for (flag, &v) in mask.iter_mut().zip(series) {
                *flag = v < lower || v > upper;
            }
        }
    }

    AnomalyScan {
        mask,
        warning: None,
    }
}

fn detect_zscore(series: &[f64], threshold: f64) -> AnomalyScan {
    let mut mask = vec![false; series.len()];
    if series.is_empty() {
        return AnomalyScan {
            mask,
            warning: None,
        };
    }

    let n = series.len() as f64;
    let mean = series.iter().sum::<f64>() / n;
    let variance = series.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let std_dev = variance.sqrt();

    if std_dev <= 0.0 || !std_dev.is_finite() {
        return AnomalyScan {
            mask,
            warning: Some(ForecastWarning::DegenerateInput),
        };
    }

    for (flag, &v) in mask.iter_mut().zip(series) {
        *flag = ((v - mean) / std_dev).abs() > threshold;
    }

    AnomalyScan {
        mask,
        warning: None,
    }
}

/// Quantile of an ascending-sorted slice by linear interpolation.
///
/// Returns `None` for an empty slice.
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Median of an unsorted slice.
pub fn median(series: &[f64]) -> Option<f64> {
    let mut sorted = series.to_vec();
    sorted.sort_by(f64::total_cmp);
    quantile(&sorted, 0.5)
}
