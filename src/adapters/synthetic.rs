//! Synthetic price panels
//!
//! Seeded geometric random walks, optionally with one pair tied together by
//! a mean-reverting spread. Same spec and seed always give the same panel.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rand::distributions::Distribution;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use statrs::distribution::Normal;
use thiserror::Error;

use crate::domain::{PanelError, PricePanel};

const PRICE_FLOOR: f64 = 0.01;

#[derive(Debug, Error)]
pub enum SynthError {
    #[error("Invalid synthetic panel spec: {0}")]
    InvalidSpec(String),
    #[error("Invalid panel: {0}")]
    Panel(#[from] PanelError),
}

/// Two assets whose spread `p2 - hedge_ratio * p1` is an AR(1) process
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CointegratedPair {
    pub stock1: usize,
    pub stock2: usize,
    pub hedge_ratio: f64,
    /// AR(1) coefficient of the spread, in [0, 1)
    pub reversion: f64,
}

impl CointegratedPair {
    pub fn new(stock1: usize, stock2: usize) -> Self {
        Self {
            stock1,
            stock2,
            hedge_ratio: 1.0,
            reversion: 0.5,
        }
    }

    pub fn with_hedge_ratio(mut self, hedge_ratio: f64) -> Self {
        self.hedge_ratio = hedge_ratio;
        self
    }

    pub fn with_reversion(mut self, reversion: f64) -> Self {
        self.reversion = reversion;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticSpec {
    pub num_assets: usize,
    pub num_days: usize,
    pub seed: u64,
    pub start_price: f64,
    /// Daily log-return standard deviation
    pub volatility: f64,
    pub pair: Option<CointegratedPair>,
}

impl Default for SyntheticSpec {
    fn default() -> Self {
        Self {
            num_assets: 10,
            num_days: 500,
            seed: 42,
            start_price: 100.0,
            volatility: 0.01,
            pair: None,
        }
    }
}

impl SyntheticSpec {
    pub fn new(num_assets: usize, num_days: usize) -> Self {
        Self {
            num_assets,
            num_days,
            ..Self::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_start_price(mut self, start_price: f64) -> Self {
        self.start_price = start_price;
        self
    }

    pub fn with_volatility(mut self, volatility: f64) -> Self {
        self.volatility = volatility;
        self
    }

    pub fn with_pair(mut self, pair: CointegratedPair) -> Self {
        self.pair = Some(pair);
        self
    }

    pub fn validate(&self) -> Result<(), SynthError> {
        if self.num_assets == 0 || self.num_days == 0 {
            return Err(SynthError::InvalidSpec(
                "need at least one asset and one day".to_string(),
            ));
        }
        if !self.start_price.is_finite() || self.start_price <= 0.0 {
            return Err(SynthError::InvalidSpec(format!(
                "start price must be positive, got {}",
                self.start_price
            )));
        }
        if !self.volatility.is_finite() || self.volatility < 0.0 {
            return Err(SynthError::InvalidSpec(format!(
                "volatility must be non-negative, got {}",
                self.volatility
            )));
        }
        if let Some(pair) = &self.pair {
            if pair.stock1 == pair.stock2
                || pair.stock1 >= self.num_assets
                || pair.stock2 >= self.num_assets
            {
                return Err(SynthError::InvalidSpec(format!(
                    "pair ({}, {}) must name two distinct assets below {}",
                    pair.stock1, pair.stock2, self.num_assets
                )));
            }
            if !(0.0..1.0).contains(&pair.reversion) || !pair.hedge_ratio.is_finite() {
                return Err(SynthError::InvalidSpec(
                    "pair reversion must be in [0, 1) with a finite hedge ratio".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Ticker used for synthetic asset `asset`
pub fn synthetic_ticker(asset: usize) -> String {
    format!("SYN{:03}", asset)
}

/// `count` weekdays starting at `start` (rolled forward if it is a weekend)
pub fn trading_dates(start: NaiveDate, count: usize) -> Vec<NaiveDate> {
    let mut dates = Vec::with_capacity(count);
    let mut date = start;
    while dates.len() < count {
        if !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            dates.push(date);
        }
        date += Duration::days(1);
    }
    dates
}

/// Build a panel from `spec`
pub fn generate_panel(spec: &SyntheticSpec) -> Result<PricePanel, SynthError> {
    spec.validate()?;

    let mut rng = StdRng::seed_from_u64(spec.seed);
    let returns = Normal::new(0.0, spec.volatility.max(f64::MIN_POSITIVE))
        .map_err(|e| SynthError::InvalidSpec(e.to_string()))?;

    let mut close = Vec::with_capacity(spec.num_assets);
    for _ in 0..spec.num_assets {
        let mut price = spec.start_price * rng.gen_range(0.5..1.5);
        let mut series = Vec::with_capacity(spec.num_days);
        for day in 0..spec.num_days {
            if day > 0 {
                price *= returns.sample(&mut rng).exp();
            }
            series.push(price);
        }
        close.push(series);
    }

    if let Some(pair) = spec.pair {
        let noise = Normal::new(0.0, (spec.volatility * spec.start_price * 0.5).max(f64::MIN_POSITIVE))
            .map_err(|e| SynthError::InvalidSpec(e.to_string()))?;
        let offset = 0.25 * spec.start_price;
        let mut spread = 0.0;
        let leg = close[pair.stock1].clone();
        for (day, p1) in leg.iter().enumerate() {
            spread = pair.reversion * spread + noise.sample(&mut rng);
            close[pair.stock2][day] = (pair.hedge_ratio * p1 + offset + spread).max(PRICE_FLOOR);
        }
        tracing::debug!(
            "Synthetic pair ({}, {}) | hedge {:.3} | reversion {:.2}",
            pair.stock1,
            pair.stock2,
            pair.hedge_ratio,
            pair.reversion
        );
    }

    let tickers = (0..spec.num_assets).map(synthetic_ticker).collect();
    Ok(PricePanel::new(tickers, close)?)
}
