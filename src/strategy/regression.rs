//! Ordinary Least Squares
//!
//! Dense OLS via the normal equations: beta = (X'X)^(-1) X'y.
//! Reports what the cointegration test needs: coefficients, t-values,
//! residuals, SSR, R^2 and Akaike's information criterion.

use nalgebra::{DMatrix, DVector};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegressionError {
    #[error("Design matrix is singular")]
    Singular,
    #[error("Not enough observations: {nobs} rows for {k} regressors")]
    Underdetermined { nobs: usize, k: usize },
    #[error("Shape mismatch: {rows} rows of regressors for {nobs} observations")]
    Shape { rows: usize, nobs: usize },
}

/// Full OLS fit
#[derive(Debug, Clone)]
pub struct OlsFit {
    pub params: Vec<f64>,
    pub tvalues: Vec<f64>,
    pub residuals: Vec<f64>,
    pub ssr: f64,
    pub rsquared: f64,
    pub nobs: usize,
    pub k: usize,
}

impl OlsFit {
    /// Gaussian log-likelihood at the fitted parameters
    pub fn log_likelihood(&self) -> f64 {
        let n = self.nobs as f64;
        let half = n / 2.0;
        -half * (2.0 * std::f64::consts::PI).ln() - half * (self.ssr / n).ln() - half
    }

    /// Akaike information criterion, counting every regressor as a parameter
    pub fn aic(&self) -> f64 {
        -2.0 * self.log_likelihood() + 2.0 * self.k as f64
    }
}

/// Fit `y` on the regressors in `rows` (one row per observation).
///
/// `has_constant` selects centered (true) or uncentered R^2.
pub fn ols(y: &[f64], rows: &[Vec<f64>], has_constant: bool) -> Result<OlsFit, RegressionError> {
    let nobs = y.len();
    if rows.len() != nobs {
        return Err(RegressionError::Shape {
            rows: rows.len(),
            nobs,
        });
    }
    let k = rows.first().map(Vec::len).unwrap_or(0);
    if k == 0 || nobs <= k {
        return Err(RegressionError::Underdetermined { nobs, k });
    }

    let x = DMatrix::from_fn(nobs, k, |i, j| rows[i][j]);
    let y_vec = DVector::from_column_slice(y);

    let xt = x.transpose();
    let xtx_inv = (&xt * &x).try_inverse().ok_or(RegressionError::Singular)?;
    let beta = &xtx_inv * (&xt * &y_vec);

    let residuals = &y_vec - &x * &beta;
    let ssr = residuals.dot(&residuals);
    let mse = ssr / (nobs - k) as f64;

    let tvalues = (0..k)
        .map(|j| beta[j] / (mse * xtx_inv[(j, j)]).sqrt())
        .collect();

    let tss = if has_constant {
        let m = y.iter().sum::<f64>() / nobs as f64;
        y.iter().map(|v| (v - m) * (v - m)).sum::<f64>()
    } else {
        y.iter().map(|v| v * v).sum::<f64>()
    };
    let rsquared = if tss > 0.0 { 1.0 - ssr / tss } else { 1.0 };

    Ok(OlsFit {
        params: beta.iter().copied().collect(),
        tvalues,
        residuals: residuals.iter().copied().collect(),
        ssr,
        rsquared,
        nobs,
        k,
    })
}

/// Slope and intercept of a single-regressor fit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineFit {
    pub slope: f64,
    pub intercept: f64,
}

/// Closed-form `y = intercept + slope * x`
pub fn simple_ols(y: &[f64], x: &[f64]) -> Result<LineFit, RegressionError> {
    let n = y.len();
    if x.len() != n {
        return Err(RegressionError::Shape { rows: x.len(), nobs: n });
    }
    if n < 2 {
        return Err(RegressionError::Underdetermined { nobs: n, k: 2 });
    }

    let mean_x = x.iter().sum::<f64>() / n as f64;
    let mean_y = y.iter().sum::<f64>() / n as f64;
    let (sxy, sxx) = x
        .iter()
        .zip(y)
        .map(|(&xi, &yi)| ((xi - mean_x) * (yi - mean_y), (xi - mean_x).powi(2)))
        .fold((0.0, 0.0), |(cov, var), (dc, dv)| (cov + dc, var + dv));

    if sxx == 0.0 {
        return Err(RegressionError::Singular);
    }

    let slope = sxy / sxx;
    Ok(LineFit {
        slope,
        intercept: mean_y - slope * mean_x,
    })
}
