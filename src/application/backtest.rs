//! Backtest Driver
//!
//! Steps a strategy over every day of the panel in order. Each day the
//! strategy emits its orders, then the sink is told the day is closed.
//! A fatal fault stops the loop after that day is closed.

use serde::Serialize;
use thiserror::Error;

use crate::domain::{Fault, PricePanel};
use crate::ports::{DailyStrategy, OrderSink};

#[derive(Debug, Error)]
pub enum BacktestError {
    #[error("Run aborted: {fault}")]
    Aborted {
        fault: Fault,
        summary: RunSummary,
    },
    #[error("Backtest already finished at day {0}")]
    Finished(usize),
}

/// Totals for a completed (or aborted) run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunSummary {
    pub strategy: String,
    pub days_processed: usize,
    pub orders_emitted: usize,
    /// Recovered faults in the order they occurred
    pub faults: Vec<Fault>,
}

/// Snapshot of the driver between days
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestStatus {
    pub next_day: usize,
    pub num_days: usize,
    pub orders_emitted: usize,
    pub fault_count: usize,
}

/// Day loop over one panel
pub struct Backtest<'a> {
    strategy: Box<dyn DailyStrategy + 'a>,
    panel: &'a PricePanel,
    next_day: usize,
    summary: RunSummary,
}

impl<'a> Backtest<'a> {
    pub fn new(strategy: Box<dyn DailyStrategy + 'a>, panel: &'a PricePanel) -> Self {
        let summary = RunSummary {
            strategy: strategy.name().to_string(),
            ..RunSummary::default()
        };
        Self {
            strategy,
            panel,
            next_day: 0,
            summary,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.next_day >= self.panel.num_days()
    }

    pub fn status(&self) -> BacktestStatus {
        BacktestStatus {
            next_day: self.next_day,
            num_days: self.panel.num_days(),
            orders_emitted: self.summary.orders_emitted,
            fault_count: self.summary.faults.len(),
        }
    }

    /// Process one day; returns the day that was closed
    pub fn tick(&mut self, sink: &mut dyn OrderSink) -> Result<usize, BacktestError> {
        if self.is_finished() {
            return Err(BacktestError::Finished(self.next_day));
        }
        let day = self.next_day;
        let outcome = self.strategy.on_day(day, self.panel, sink);
        sink.advance_day(day);
        self.next_day += 1;
        self.summary.days_processed += 1;

        match outcome {
            Ok(report) => {
                self.summary.orders_emitted += report.orders_emitted;
                self.summary.faults.extend(report.faults);
                Ok(day)
            }
            Err(fault) => {
                tracing::error!("Fatal fault: {}", fault);
                Err(BacktestError::Aborted {
                    fault,
                    summary: self.summary.clone(),
                })
            }
        }
    }

    /// Run every remaining day
    pub fn run(mut self, sink: &mut dyn OrderSink) -> Result<RunSummary, BacktestError> {
        tracing::info!(
            "Starting {} backtest - {} assets, {} days",
            self.summary.strategy,
            self.panel.num_assets(),
            self.panel.num_days()
        );

        while !self.is_finished() {
            self.tick(sink)?;
        }

        tracing::info!(
            "Backtest finished - {} orders, {} faults over {} days",
            self.summary.orders_emitted,
            self.summary.faults.len(),
            self.summary.days_processed
        );
        Ok(self.summary)
    }
}
