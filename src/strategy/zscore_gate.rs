//! Z-Score Gate
//!
//! Turns a trailing window of two price legs into a spread z-score and
//! classifies it against the entry/exit thresholds.
//!
//! Spread:  s = p2 - beta * p1   (beta from OLS of p2 on p1 over the window)
//! Z-Score: z = (s_last - mean(s)) / population_std(s)
//!
//! Flips are strict: z == entry_z stays inside the band.

use serde::{Deserialize, Serialize};

use crate::strategy::params::PairsParams;
use crate::strategy::stats::{self, HedgeRatio, StatsError};

/// Result of one spread evaluation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpreadSnapshot {
    pub z_score: f64,
    pub hedge: HedgeRatio,
    /// Latest spread value
    pub spread: f64,
}

/// Where a z-score falls relative to the thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GateSignal {
    /// z > entry_z
    AboveEntry,
    /// z < -entry_z
    BelowEntry,
    /// |z| <= exit_z
    Centered,
    /// exit_z < |z| <= entry_z
    Inside,
}

impl GateSignal {
    pub fn is_flip(&self) -> bool {
        matches!(self, GateSignal::AboveEntry | GateSignal::BelowEntry)
    }
}

/// Spread z-score gate for the pairs strategy
#[derive(Debug, Clone)]
pub struct ZScoreGate {
    entry_z: f64,
    exit_z: f64,
    window: usize,
}

impl ZScoreGate {
    pub fn new(entry_z: f64, exit_z: f64, window: usize) -> Self {
        Self {
            entry_z,
            exit_z,
            window,
        }
    }

    pub fn from_params(params: &PairsParams) -> Self {
        Self::new(params.entry_z, params.exit_z, params.window)
    }

    pub fn entry_z(&self) -> f64 {
        self.entry_z
    }

    pub fn exit_z(&self) -> f64 {
        self.exit_z
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Fit the hedge ratio over the window and standardize the latest spread
    pub fn evaluate(&self, leg1: &[f64], leg2: &[f64]) -> Result<SpreadSnapshot, StatsError> {
        let hedge = stats::ols_hedge_ratio(leg2, leg1)?;
        let spread = stats::spread(leg2, leg1, hedge.beta);
        let z_score = stats::z_score(&spread)?;
        let last = spread.last().copied().unwrap_or_default();

        Ok(SpreadSnapshot {
            z_score,
            hedge,
            spread: last,
        })
    }

    /// Classify a z-score against the thresholds
    pub fn classify(&self, z: f64) -> GateSignal {
        if z > self.entry_z {
            GateSignal::AboveEntry
        } else if z < -self.entry_z {
            GateSignal::BelowEntry
        } else if z.abs() <= self.exit_z {
            GateSignal::Centered
        } else {
            GateSignal::Inside
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn create_test_gate() -> ZScoreGate {
        ZScoreGate::from_params(&PairsParams::default())
    }

    #[test]
    fn test_gate_from_params() {
        let gate = create_test_gate();
        assert_eq!(gate.entry_z(), 1.0);
        assert_eq!(gate.exit_z(), 0.1);
        assert_eq!(gate.window(), 120);
    }

    #[test]
    fn test_entry_threshold_is_strict() {
        let gate = create_test_gate();
        assert_eq!(gate.classify(1.0), GateSignal::Inside);
        assert_eq!(gate.classify(1.0000001), GateSignal::AboveEntry);
        assert_eq!(gate.classify(-1.0), GateSignal::Inside);
        assert_eq!(gate.classify(-1.0000001), GateSignal::BelowEntry);
    }

    #[test]
    fn test_exit_band_is_inclusive() {
        let gate = create_test_gate();
        assert_eq!(gate.classify(0.1), GateSignal::Centered);
        assert_eq!(gate.classify(-0.1), GateSignal::Centered);
        assert_eq!(gate.classify(0.0), GateSignal::Centered);
        assert_eq!(gate.classify(0.5), GateSignal::Inside);
        assert!(!gate.classify(0.5).is_flip());
        assert!(gate.classify(2.0).is_flip());
    }

    #[test]
    fn test_evaluate_spread() {
        let gate = ZScoreGate::new(1.0, 0.1, 5);
        let leg1 = [10.0, 11.0, 12.0, 13.0, 14.0];
        // leg2 = 2 * leg1 + residual with a large last deviation
        let residual = [0.0, 0.1, -0.1, 0.0, 0.5];
        let leg2: Vec<f64> = leg1.iter().zip(residual).map(|(p, e)| 2.0 * p + e).collect();

        let snapshot = gate.evaluate(&leg1, &leg2).unwrap();
        assert!(snapshot.z_score > 1.0, "z {}", snapshot.z_score);
        assert_eq!(gate.classify(snapshot.z_score), GateSignal::AboveEntry);
        assert_relative_eq!(
            snapshot.spread,
            leg2[4] - snapshot.hedge.beta * leg1[4],
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_evaluate_constant_leg_is_singular() {
        let gate = ZScoreGate::new(1.0, 0.1, 3);
        let result = gate.evaluate(&[5.0, 5.0, 5.0], &[1.0, 2.0, 3.0]);
        assert!(matches!(result, Err(StatsError::Regression(_))));
    }
}
