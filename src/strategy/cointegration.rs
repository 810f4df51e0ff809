//! Engle-Granger Cointegration Test
//!
//! Two-step augmented Engle-Granger procedure:
//! 1. Cointegrating regression y = alpha + beta * x + e
//! 2. ADF regression on the residuals (no deterministic term), lag length
//!    picked by AIC from 0 up to ceil(12 * (n/100)^(1/4))
//!
//! The ADF t-statistic is mapped to a p-value with MacKinnon's response
//! surface for two variables with a constant. A p-value below 0.05 rejects
//! "no cointegration" at the 5% level.

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};

use crate::strategy::regression::{self, RegressionError};
use crate::strategy::stats::StatsError;

/// Fewest overlapping observations accepted
pub const MIN_OBSERVATIONS: usize = 12;

/// Collinearity cut-off on the cointegrating regression's R^2
const RSQUARED_LIMIT: f64 = 1.0 - 100.0 * 1.490_116_119_384_765_6e-8;

// MacKinnon (2010) surface, N = 2 series, constant term.
const TAU_MAX: f64 = 0.92;
const TAU_MIN: f64 = -18.86;
const TAU_STAR: f64 = -2.62;
const TAU_SMALL_P: [f64; 3] = [2.92, 1.5012, 0.039796];
const TAU_LARGE_P: [f64; 4] = [2.1945, 0.64695, -0.29198, -0.042377];

/// Outcome of one Engle-Granger test
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CointegrationTest {
    /// ADF t-statistic on the residuals (`-inf` for a perfect fit)
    pub adf_statistic: f64,
    pub p_value: f64,
    /// Augmentation lags chosen by AIC
    pub used_lag: usize,
    /// Slope of the cointegrating regression
    pub hedge_ratio: f64,
    pub nobs: usize,
}

impl CointegrationTest {
    pub fn is_cointegrated(&self, max_p_value: f64) -> bool {
        self.p_value < max_p_value
    }
}

/// Test whether `y` and `x` are cointegrated
pub fn engle_granger(y: &[f64], x: &[f64]) -> Result<CointegrationTest, StatsError> {
    if y.len() != x.len() {
        return Err(StatsError::LengthMismatch(y.len(), x.len()));
    }
    if y.len() < MIN_OBSERVATIONS {
        return Err(StatsError::InsufficientHistory {
            required: MIN_OBSERVATIONS,
            available: y.len(),
        });
    }

    let rows: Vec<Vec<f64>> = x.iter().map(|&xi| vec![xi, 1.0]).collect();
    let fit = regression::ols(y, &rows, true)?;
    let hedge_ratio = fit.params[0];

    let (adf_statistic, used_lag) = if fit.rsquared < RSQUARED_LIMIT {
        let adf = adf_no_constant(&fit.residuals)?;
        (adf.statistic, adf.used_lag)
    } else {
        tracing::debug!(rsquared = fit.rsquared, "Series are collinear, residuals are degenerate");
        (f64::NEG_INFINITY, 0)
    };

    Ok(CointegrationTest {
        adf_statistic,
        p_value: mackinnon_p_value(adf_statistic),
        used_lag,
        hedge_ratio,
        nobs: y.len(),
    })
}

/// ADF regression output
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdfResult {
    pub statistic: f64,
    pub used_lag: usize,
    pub nobs: usize,
}

/// Default ADF lag ceiling: ceil(12 * (n/100)^(1/4)), capped at n/2 - 1
pub fn default_max_lag(n: usize) -> Option<usize> {
    let schwert = (12.0 * (n as f64 / 100.0).powf(0.25)).ceil() as usize;
    (n / 2).checked_sub(1).map(|cap| cap.min(schwert))
}

/// Augmented Dickey-Fuller t-statistic without constant or trend.
///
/// Regresses diff(x)[t] on x[t] and diff(x)[t-1..=t-lag]; the lag is chosen by
/// minimum AIC over a common sample, then the regression is refit on the
/// largest sample the chosen lag allows.
pub fn adf_no_constant(series: &[f64]) -> Result<AdfResult, RegressionError> {
    let n = series.len();
    let mut max_lag =
        default_max_lag(n).ok_or(RegressionError::Underdetermined { nobs: n, k: 1 })?;

    let diff: Vec<f64> = series.windows(2).map(|w| w[1] - w[0]).collect();
    // the widest model needs more rows than regressors
    while max_lag > 0 && diff.len() <= 2 * max_lag + 1 {
        max_lag -= 1;
    }
    if diff.len() < 2 {
        return Err(RegressionError::Underdetermined { nobs: diff.len(), k: 1 });
    }

    // Lag search on the sample that supports max_lag
    let mut best: Option<(f64, usize)> = None;
    for lag in 0..=max_lag {
        let (y, rows) = adf_design(series, &diff, max_lag, lag);
        let fit = regression::ols(&y, &rows, false)?;
        let aic = fit.aic();
        let better = match best {
            None => true,
            Some((best_aic, _)) => aic < best_aic,
        };
        if better {
            best = Some((aic, lag));
        }
    }
    let used_lag = best.map(|(_, lag)| lag).unwrap_or(0);

    let (y, rows) = adf_design(series, &diff, used_lag, used_lag);
    let fit = regression::ols(&y, &rows, false)?;

    Ok(AdfResult {
        statistic: fit.tvalues[0],
        used_lag,
        nobs: fit.nobs,
    })
}

/// Rows start at `diff[start]` and carry `lag` lagged differences
fn adf_design(series: &[f64], diff: &[f64], start: usize, lag: usize) -> (Vec<f64>, Vec<Vec<f64>>) {
    let y: Vec<f64> = diff[start..].to_vec();
    let rows = (start..diff.len())
        .map(|t| {
            let mut row = Vec::with_capacity(lag + 1);
            row.push(series[t]);
            row.extend((1..=lag).map(|i| diff[t - i]));
            row
        })
        .collect();
    (y, rows)
}

/// MacKinnon approximate p-value for the Engle-Granger statistic
pub fn mackinnon_p_value(statistic: f64) -> f64 {
    if statistic.is_nan() {
        return 1.0;
    }
    if statistic > TAU_MAX {
        return 1.0;
    }
    if statistic < TAU_MIN {
        return 0.0;
    }

    let polynomial = if statistic <= TAU_STAR {
        evaluate(&TAU_SMALL_P, statistic)
    } else {
        evaluate(&TAU_LARGE_P, statistic)
    };

    // Standard normal parameters are always valid
    match Normal::new(0.0, 1.0) {
        Ok(normal) => normal.cdf(polynomial),
        Err(_) => 1.0,
    }
}

/// c0 + c1*x + c2*x^2 + ...
fn evaluate(coefficients: &[f64], x: f64) -> f64 {
    coefficients.iter().rev().fold(0.0, |acc, &c| acc * x + c)
}
