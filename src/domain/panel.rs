//! Price Panel
//!
//! Column-addressable close-price matrix indexed by `(asset, day)`.
//! Built once per run and shared read-only by whichever strategy is active.
//!
//! Invariants enforced at construction:
//! - every asset has the same number of days
//! - every close is finite
//! - at least one asset and one day

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Panel construction and lookup errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PanelError {
    #[error("Panel has no assets")]
    NoAssets,
    #[error("Panel has no trading days")]
    NoDays,
    #[error("Ticker count {tickers} does not match series count {series}")]
    TickerMismatch { tickers: usize, series: usize },
    #[error("Asset {asset} has {actual} days, expected {expected}")]
    RaggedSeries { asset: usize, expected: usize, actual: usize },
    #[error("Non-finite close for asset {asset} on day {day}: {value}")]
    NonFinite { asset: usize, day: usize, value: f64 },
    #[error("Asset index {0} out of range")]
    AssetOutOfRange(usize),
    #[error("Day index {0} out of range")]
    DayOutOfRange(usize),
    #[error("Window of {len} days ending at day {end_day} starts before day 0")]
    WindowTooLong { end_day: usize, len: usize },
}

/// Immutable close-price matrix for one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePanel {
    /// Ticker symbol per asset id
    tickers: Vec<String>,
    /// `close[asset][day]`
    close: Vec<Vec<f64>>,
    num_days: usize,
}

impl PricePanel {
    /// Build a panel from per-asset close series
    pub fn new(tickers: Vec<String>, close: Vec<Vec<f64>>) -> Result<Self, PanelError> {
        if close.is_empty() {
            return Err(PanelError::NoAssets);
        }
        if tickers.len() != close.len() {
            return Err(PanelError::TickerMismatch {
                tickers: tickers.len(),
                series: close.len(),
            });
        }

        let num_days = close[0].len();
        if num_days == 0 {
            return Err(PanelError::NoDays);
        }

        for (asset, series) in close.iter().enumerate() {
            if series.len() != num_days {
                return Err(PanelError::RaggedSeries {
                    asset,
                    expected: num_days,
                    actual: series.len(),
                });
            }
            if let Some((day, &value)) = series.iter().enumerate().find(|(_, v)| !v.is_finite()) {
                return Err(PanelError::NonFinite { asset, day, value });
            }
        }

        Ok(Self {
            tickers,
            close,
            num_days,
        })
    }

    /// Build a panel with generated ticker names (`A0`, `A1`, ...)
    pub fn from_series(close: Vec<Vec<f64>>) -> Result<Self, PanelError> {
        let tickers = (0..close.len()).map(|i| format!("A{}", i)).collect();
        Self::new(tickers, close)
    }

    pub fn num_assets(&self) -> usize {
        self.close.len()
    }

    pub fn num_days(&self) -> usize {
        self.num_days
    }

    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    pub fn ticker(&self, asset: usize) -> Option<&str> {
        self.tickers.get(asset).map(String::as_str)
    }

    /// Close price of `asset` on `day`
    pub fn close(&self, asset: usize, day: usize) -> Result<f64, PanelError> {
        let series = self.series(asset)?;
        series.get(day).copied().ok_or(PanelError::DayOutOfRange(day))
    }

    /// Full close history of one asset
    pub fn series(&self, asset: usize) -> Result<&[f64], PanelError> {
        self.close
            .get(asset)
            .map(Vec::as_slice)
            .ok_or(PanelError::AssetOutOfRange(asset))
    }

    /// Trailing window of `len` closes ending at (and including) `end_day`
    pub fn window(&self, asset: usize, end_day: usize, len: usize) -> Result<&[f64], PanelError> {
        let series = self.series(asset)?;
        if end_day >= self.num_days {
            return Err(PanelError::DayOutOfRange(end_day));
        }
        if len == 0 || end_day + 1 < len {
            return Err(PanelError::WindowTooLong { end_day, len });
        }
        Ok(&series[end_day + 1 - len..=end_day])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_panel() -> PricePanel {
        PricePanel::new(
            vec!["AAA".to_string(), "BBB".to_string()],
            vec![vec![1.0, 2.0, 3.0, 4.0], vec![10.0, 20.0, 30.0, 40.0]],
        )
        .unwrap()
    }

    #[test]
    fn test_panel_dimensions() {
        let panel = sample_panel();
        assert_eq!(panel.num_assets(), 2);
        assert_eq!(panel.num_days(), 4);
        assert_eq!(panel.ticker(1), Some("BBB"));
        assert_eq!(panel.ticker(2), None);
    }

    #[test]
    fn test_close_lookup() {
        let panel = sample_panel();
        assert_eq!(panel.close(0, 2).unwrap(), 3.0);
        assert_eq!(panel.close(1, 3).unwrap(), 40.0);
        assert_eq!(panel.close(2, 0), Err(PanelError::AssetOutOfRange(2)));
        assert_eq!(panel.close(0, 4), Err(PanelError::DayOutOfRange(4)));
    }

    #[test]
    fn test_trailing_window() {
        let panel = sample_panel();
        assert_eq!(panel.window(0, 3, 2).unwrap(), &[3.0, 4.0]);
        assert_eq!(panel.window(1, 3, 4).unwrap(), &[10.0, 20.0, 30.0, 40.0]);
        assert!(matches!(
            panel.window(0, 1, 3),
            Err(PanelError::WindowTooLong { end_day: 1, len: 3 })
        ));
    }

    #[test]
    fn test_rejects_ragged_series() {
        let result = PricePanel::from_series(vec![vec![1.0, 2.0], vec![1.0]]);
        assert!(matches!(
            result,
            Err(PanelError::RaggedSeries { asset: 1, expected: 2, actual: 1 })
        ));
    }

    #[test]
    fn test_rejects_non_finite() {
        let result = PricePanel::from_series(vec![vec![1.0, f64::NAN]]);
        assert!(matches!(result, Err(PanelError::NonFinite { asset: 0, day: 1, .. })));
    }

    #[test]
    fn test_rejects_empty() {
        assert_eq!(PricePanel::from_series(vec![]), Err(PanelError::NoAssets));
        assert_eq!(PricePanel::from_series(vec![vec![]]), Err(PanelError::NoDays));
        assert!(matches!(
            PricePanel::new(vec![], vec![vec![1.0]]),
            Err(PanelError::TickerMismatch { tickers: 0, series: 1 })
        ));
    }
}
