//! Rolling Statistics
//!
//! Pure functions over trailing windows of close prices:
//! - rolling mean and moving-average deviation ratio (rotation scoring)
//! - population z-score of the latest observation (spread gating)
//! - OLS hedge ratio `y = alpha + beta * x` (pairs sizing)
//! - Engle-Granger cointegration p-value (pair selection)
//!
//! Deviation ratio: (rolling_mean - price) / rolling_mean
//! Z-score:         (last - mean) / population_std

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::FaultKind;
use crate::strategy::cointegration;
use crate::strategy::regression::{self, RegressionError};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StatsError {
    #[error("Insufficient history: need {required} observations, have {available}")]
    InsufficientHistory { required: usize, available: usize },
    #[error("Division by zero: {0}")]
    DivisionByZero(&'static str),
    #[error("Series length mismatch: {0} vs {1}")]
    LengthMismatch(usize, usize),
    #[error("Regression failed: {0}")]
    Regression(#[from] RegressionError),
}

impl StatsError {
    /// Fault category reported when a strategy skips on this error
    pub fn fault_kind(&self) -> FaultKind {
        match self {
            StatsError::InsufficientHistory { .. } => FaultKind::InsufficientHistory,
            StatsError::DivisionByZero(_) | StatsError::Regression(RegressionError::Singular) => {
                FaultKind::DivisionByZero
            }
            StatsError::LengthMismatch(..) | StatsError::Regression(_) => FaultKind::Internal,
        }
    }
}

/// OLS snapshot for one estimation window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HedgeRatio {
    /// Slope of y on x
    pub beta: f64,
    /// Fitted intercept; sizing only uses `beta`
    pub intercept: f64,
}

/// Mean of `closes[end_day + 1 - window ..= end_day]`
pub fn rolling_mean(closes: &[f64], end_day: usize, window: usize) -> Result<f64, StatsError> {
    if window == 0 || end_day + 1 < window || end_day >= closes.len() {
        return Err(StatsError::InsufficientHistory {
            required: window.max(1),
            available: (end_day + 1).min(closes.len()),
        });
    }
    let slice = &closes[end_day + 1 - window..=end_day];
    Ok(slice.iter().sum::<f64>() / window as f64)
}

/// Fractional distance of `current_price` below its rolling mean
pub fn deviation_ratio(current_price: f64, rolling_mean: f64) -> Result<f64, StatsError> {
    if rolling_mean == 0.0 {
        return Err(StatsError::DivisionByZero("rolling mean is zero"));
    }
    Ok((rolling_mean - current_price) / rolling_mean)
}

/// Arithmetic mean; `None` on an empty slice
pub fn mean(series: &[f64]) -> Option<f64> {
    if series.is_empty() {
        return None;
    }
    Some(series.iter().sum::<f64>() / series.len() as f64)
}

/// Population standard deviation (divides by n)
pub fn population_std(series: &[f64]) -> Option<f64> {
    let m = mean(series)?;
    let variance = series
        .iter()
        .map(|&v| {
            let diff = v - m;
            diff * diff
        })
        .sum::<f64>()
        / series.len() as f64;
    Some(variance.sqrt())
}

/// Standardized distance of the last observation from the window mean
pub fn z_score(series: &[f64]) -> Result<f64, StatsError> {
    let (Some(m), Some(std_dev), Some(&last)) =
        (mean(series), population_std(series), series.last())
    else {
        return Err(StatsError::InsufficientHistory {
            required: 1,
            available: 0,
        });
    };
    if std_dev == 0.0 {
        return Err(StatsError::DivisionByZero("window has zero variance"));
    }
    Ok((last - m) / std_dev)
}

/// Fit `y = alpha + beta * x` by ordinary least squares
pub fn ols_hedge_ratio(y: &[f64], x: &[f64]) -> Result<HedgeRatio, StatsError> {
    if y.len() != x.len() {
        return Err(StatsError::LengthMismatch(y.len(), x.len()));
    }
    if y.len() < 2 {
        return Err(StatsError::InsufficientHistory {
            required: 2,
            available: y.len(),
        });
    }
    let fit = regression::simple_ols(y, x)?;
    Ok(HedgeRatio {
        beta: fit.slope,
        intercept: fit.intercept,
    })
}

/// Spread `y - beta * x` element-wise
pub fn spread(y: &[f64], x: &[f64], beta: f64) -> Vec<f64> {
    y.iter().zip(x).map(|(&yi, &xi)| yi - beta * xi).collect()
}

/// Engle-Granger cointegration p-value of `series_a` against `series_b`
pub fn cointegration_p_value(series_a: &[f64], series_b: &[f64]) -> Result<f64, StatsError> {
    cointegration::engle_granger(series_a, series_b).map(|test| test.p_value)
}
