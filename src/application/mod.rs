pub mod backtest;

pub use backtest::{Backtest, BacktestError, BacktestStatus, RunSummary};
