//! Strategy Parameters
//!
//! Immutable parameter structs handed to each strategy at construction.
//! Defaults follow the classic setup: monthly rotation into the ten most
//! oversold names, and a 120-day pairs window with 1.0 / 0.1 z thresholds.

use serde::{Deserialize, Serialize};

/// Rotation strategy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RotationParams {
    /// Cash the target allocation is sized against
    pub init_cash: f64,
    /// Trading days between rebalances
    pub rebalance_interval: usize,
    /// Number of names held after each rebalance
    pub top_k: usize,
    /// Moving-average window; falls back to `rebalance_interval`
    #[serde(default)]
    pub ma_window: Option<usize>,
}

impl Default for RotationParams {
    fn default() -> Self {
        Self {
            init_cash: 1_000_000.0,
            rebalance_interval: 30,
            top_k: 10,
            ma_window: None,
        }
    }
}

impl RotationParams {
    pub fn with_init_cash(mut self, cash: f64) -> Self {
        self.init_cash = cash;
        self
    }

    pub fn with_rebalance_interval(mut self, days: usize) -> Self {
        self.rebalance_interval = days;
        self
    }

    pub fn with_top_k(mut self, k: usize) -> Self {
        self.top_k = k;
        self
    }

    pub fn with_ma_window(mut self, window: usize) -> Self {
        self.ma_window = Some(window);
        self
    }

    /// Effective moving-average window
    pub fn ma_window(&self) -> usize {
        self.ma_window.unwrap_or(self.rebalance_interval)
    }

    /// Per-name weight of a full allocation
    pub fn weight(&self) -> f64 {
        1.0 / self.top_k as f64
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), ParamsError> {
        validate_cash(self.init_cash)?;
        if self.rebalance_interval == 0 {
            return Err(ParamsError::InvalidRebalanceInterval);
        }
        if self.top_k == 0 {
            return Err(ParamsError::InvalidTopK);
        }
        if self.ma_window() == 0 {
            return Err(ParamsError::InvalidWindow(0));
        }
        Ok(())
    }
}

/// Which single-leg states get split back to 50/50 inside the exit band
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RebalanceRule {
    /// `|z| <= exit_z` and exactly one leg is flat
    #[default]
    Centered,
    /// `(|z| <= exit_z and qty1 == 0) or qty2 == 0`
    Legacy,
}

impl RebalanceRule {
    /// Whether a split is due for the given z and leg quantities
    pub fn should_split(&self, z: f64, exit_z: f64, qty1: f64, qty2: f64) -> bool {
        let centered = z.abs() <= exit_z;
        match self {
            RebalanceRule::Centered => centered && (qty1 == 0.0 || qty2 == 0.0),
            RebalanceRule::Legacy => (centered && qty1 == 0.0) || qty2 == 0.0,
        }
    }
}

impl std::fmt::Display for RebalanceRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RebalanceRule::Centered => write!(f, "centered"),
            RebalanceRule::Legacy => write!(f, "legacy"),
        }
    }
}

/// Pairs strategy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairsParams {
    pub init_cash: f64,
    /// Trailing window for the hedge ratio and spread z-score
    pub window: usize,
    /// Flip threshold (strict)
    pub entry_z: f64,
    /// Re-centering band
    pub exit_z: f64,
    /// Cointegration p-value a pair must beat to be selected
    pub max_p_value: f64,
    #[serde(default)]
    pub rebalance_rule: RebalanceRule,
}

impl Default for PairsParams {
    fn default() -> Self {
        Self {
            init_cash: 1_000_000.0,
            window: 120,
            entry_z: 1.0,
            exit_z: 0.1,
            max_p_value: 0.05,
            rebalance_rule: RebalanceRule::Centered,
        }
    }
}

impl PairsParams {
    pub fn with_init_cash(mut self, cash: f64) -> Self {
        self.init_cash = cash;
        self
    }

    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }

    pub fn with_thresholds(mut self, entry_z: f64, exit_z: f64) -> Self {
        self.entry_z = entry_z;
        self.exit_z = exit_z;
        self
    }

    pub fn with_max_p_value(mut self, max_p_value: f64) -> Self {
        self.max_p_value = max_p_value;
        self
    }

    pub fn with_rebalance_rule(mut self, rule: RebalanceRule) -> Self {
        self.rebalance_rule = rule;
        self
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), ParamsError> {
        validate_cash(self.init_cash)?;
        if self.window < 2 {
            return Err(ParamsError::InvalidWindow(self.window));
        }
        if !(self.entry_z.is_finite() && self.exit_z.is_finite())
            || self.exit_z < 0.0
            || self.exit_z > self.entry_z
        {
            return Err(ParamsError::InvalidThresholds {
                entry_z: self.entry_z,
                exit_z: self.exit_z,
            });
        }
        if self.max_p_value <= 0.0 || self.max_p_value > 1.0 {
            return Err(ParamsError::InvalidPValue(self.max_p_value));
        }
        Ok(())
    }
}

fn validate_cash(cash: f64) -> Result<(), ParamsError> {
    if cash.is_finite() && cash > 0.0 {
        Ok(())
    } else {
        Err(ParamsError::InvalidInitCash(cash))
    }
}

/// Parameter validation errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParamsError {
    #[error("Invalid initial cash: {0} (must be positive)")]
    InvalidInitCash(f64),
    #[error("Invalid rebalance interval: must be at least 1 day")]
    InvalidRebalanceInterval,
    #[error("Invalid top_k: must select at least 1 asset")]
    InvalidTopK,
    #[error("Invalid window: {0}")]
    InvalidWindow(usize),
    #[error("Invalid thresholds: entry_z {entry_z}, exit_z {exit_z} (need 0 <= exit_z <= entry_z)")]
    InvalidThresholds { entry_z: f64, exit_z: f64 },
    #[error("Invalid max p-value: {0} (must be 0 < p <= 1)")]
    InvalidPValue(f64),
}
