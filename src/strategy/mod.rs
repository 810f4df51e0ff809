//! Strategy Layer - Day-stepped rotation and pairs strategies
//!
//! Numerical building blocks:
//! - `stats`: rolling mean, deviation ratio, z-score, hedge ratio
//! - `regression`: dense OLS with t-values and AIC
//! - `cointegration`: Engle-Granger test with MacKinnon p-values
//! - `ranker`: deterministic best-first ordering of asset scores
//! - `zscore_gate`: spread z-score against entry/exit thresholds
//!
//! Strategies:
//! - `RotationStrategy`: periodic top-K rotation into the most oversold names
//! - `PairsStrategy`: cointegrated pair with a z-score flip state machine

pub mod cointegration;
pub mod pairs;
pub mod params;
pub mod ranker;
pub mod regression;
pub mod rotation;
pub mod stats;
pub mod zscore_gate;

pub use cointegration::{engle_granger, CointegrationTest};
pub use pairs::{scan_pairs, select_pair, PairCandidate, PairsPhase, PairsStrategy};
pub use params::{PairsParams, ParamsError, RebalanceRule, RotationParams};
pub use ranker::{rank, select_top_k, RankError};
pub use rotation::{RotationState, RotationStrategy};
pub use stats::{HedgeRatio, StatsError};
pub use zscore_gate::{GateSignal, SpreadSnapshot, ZScoreGate};
