//! Pairs Strategy
//!
//! Day 0: pick the most cointegrated pair (lowest Engle-Granger p-value below
//! `max_p_value`) and split `init_cash` evenly across both legs.
//!
//! Every later day with a full window:
//! - z > entry_z:  sell all of stock2, buy stock1 with the proceeds
//! - z < -entry_z: sell all of stock1, buy stock2 with the proceeds
//! - otherwise, if the rebalance rule holds: split the held notional 50/50
//!
//! where z is the latest spread `p2 - beta * p1` standardized over the window.

use serde::{Deserialize, Serialize};

use crate::domain::{
    Fault, FaultKind, LegTrade, Order, PairPosition, PanelError, PricePanel, Subject,
};
use crate::ports::{DailyStrategy, DayReport, OrderSink};
use crate::strategy::cointegration;
use crate::strategy::params::PairsParams;
use crate::strategy::zscore_gate::{GateSignal, ZScoreGate};

/// A pair that passed the cointegration screen
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PairCandidate {
    pub stock1: usize,
    pub stock2: usize,
    pub p_value: f64,
    pub adf_statistic: f64,
    /// Engle-Granger slope of stock1 on stock2 over the full panel.
    /// The traded beta is re-fit daily the other way round (stock2 on stock1).
    pub coint_slope: f64,
}

/// Every pair `(i < j)` with p-value below `max_p_value`, lowest first.
///
/// Equal p-values keep `(i, j)` order. Pairs whose test fails are skipped.
pub fn scan_pairs(panel: &PricePanel, max_p_value: f64) -> Vec<PairCandidate> {
    let n = panel.num_assets();
    let mut candidates = Vec::new();

    for i in 0..n {
        for j in (i + 1)..n {
            let (Ok(a), Ok(b)) = (panel.series(i), panel.series(j)) else {
                continue;
            };
            match cointegration::engle_granger(a, b) {
                Ok(test) => {
                    tracing::debug!(
                        "Pair ({}, {}) | ADF {:.4} | p-value {:.6}",
                        i,
                        j,
                        test.adf_statistic,
                        test.p_value
                    );
                    if test.p_value < max_p_value {
                        candidates.push(PairCandidate {
                            stock1: i,
                            stock2: j,
                            p_value: test.p_value,
                            adf_statistic: test.adf_statistic,
                            coint_slope: test.hedge_ratio,
                        });
                    }
                }
                Err(e) => tracing::warn!("Pair ({}, {}) skipped: {}", i, j, e),
            }
        }
    }

    candidates.sort_by(|a, b| a.p_value.total_cmp(&b.p_value));
    candidates
}

/// The single most cointegrated pair, or a fatal `NoCointegratedPair` fault
pub fn select_pair(panel: &PricePanel, max_p_value: f64, day: usize) -> Result<PairCandidate, Fault> {
    scan_pairs(panel, max_p_value).into_iter().next().ok_or_else(|| {
        Fault::new(
            day,
            Subject::Run,
            FaultKind::NoCointegratedPair,
            format!(
                "no pair among {} assets has a cointegration p-value below {}",
                panel.num_assets(),
                max_p_value
            ),
        )
    })
}

/// Selection and position lifecycle
#[derive(Debug, Clone, PartialEq)]
pub enum PairsPhase {
    Unselected,
    /// Pair chosen, legs not yet bought
    Selected(PairCandidate),
    Trading(PairCandidate, PairPosition),
}

#[derive(Debug, Clone)]
pub struct PairsStrategy {
    params: PairsParams,
    gate: ZScoreGate,
    phase: PairsPhase,
}

impl PairsStrategy {
    pub fn new(params: PairsParams) -> Self {
        let gate = ZScoreGate::from_params(&params);
        Self {
            params,
            gate,
            phase: PairsPhase::Unselected,
        }
    }

    /// Skip the screen and trade a fixed pair
    pub fn with_pair(params: PairsParams, stock1: usize, stock2: usize) -> Self {
        let mut strategy = Self::new(params);
        strategy.phase = PairsPhase::Selected(PairCandidate {
            stock1,
            stock2,
            p_value: f64::NAN,
            adf_statistic: f64::NAN,
            coint_slope: f64::NAN,
        });
        strategy
    }

    pub fn params(&self) -> &PairsParams {
        &self.params
    }

    pub fn phase(&self) -> &PairsPhase {
        &self.phase
    }

    pub fn pair(&self) -> Option<&PairCandidate> {
        match &self.phase {
            PairsPhase::Unselected => None,
            PairsPhase::Selected(pair) | PairsPhase::Trading(pair, _) => Some(pair),
        }
    }

    pub fn position(&self) -> Option<&PairPosition> {
        match &self.phase {
            PairsPhase::Trading(_, position) => Some(position),
            _ => None,
        }
    }

    fn open(
        &mut self,
        day: usize,
        pair: PairCandidate,
        panel: &PricePanel,
        sink: &mut dyn OrderSink,
        report: &mut DayReport,
    ) -> Result<(), Fault> {
        let subject = Subject::Pair(pair.stock1, pair.stock2);
        let (p1, p2) = leg_prices(panel, &pair, day)?;
        let (position, trades) =
            PairPosition::open(pair.stock1, pair.stock2, self.params.init_cash, p1, p2)
                .map_err(|e| Fault::new(day, subject, FaultKind::DivisionByZero, e.to_string()))?;

        tracing::info!(
            "Day {} | opened pair ({}, {}) | {:.2} @ {:.2} + {:.2} @ {:.2}",
            day,
            pair.stock1,
            pair.stock2,
            trades[0].quantity,
            p1,
            trades[1].quantity,
            p2
        );
        emit(day, &trades, sink, report);
        self.phase = PairsPhase::Trading(pair, position);
        Ok(())
    }

    fn decide(
        &mut self,
        day: usize,
        panel: &PricePanel,
        sink: &mut dyn OrderSink,
        report: &mut DayReport,
    ) -> Result<(), Fault> {
        let PairsPhase::Trading(pair, position) = &mut self.phase else {
            return Ok(());
        };
        let subject = Subject::Pair(pair.stock1, pair.stock2);
        let window = self.gate.window();

        if day + 1 < window {
            return Err(Fault::new(
                day,
                subject,
                FaultKind::InsufficientHistory,
                format!("{} of {} window days available", day + 1, window),
            ));
        }

        let internal = |e: PanelError| {
            Fault::new(day, subject, FaultKind::Internal, e.to_string())
        };
        let leg1 = panel.window(pair.stock1, day, window).map_err(internal)?;
        let leg2 = panel.window(pair.stock2, day, window).map_err(internal)?;

        let snapshot = self
            .gate
            .evaluate(leg1, leg2)
            .map_err(|e| Fault::new(day, subject, e.fault_kind(), e.to_string()))?;
        let (p1, p2) = leg_prices(panel, pair, day)?;
        let signal = self.gate.classify(snapshot.z_score);

        let trades = match signal {
            GateSignal::AboveEntry => position.rotate_into_stock1(p1, p2),
            GateSignal::BelowEntry => position.rotate_into_stock2(p1, p2),
            GateSignal::Centered | GateSignal::Inside => {
                if self.params.rebalance_rule.should_split(
                    snapshot.z_score,
                    self.gate.exit_z(),
                    position.qty1(),
                    position.qty2(),
                ) {
                    position.split_evenly(p1, p2)
                } else {
                    Ok(None)
                }
            }
        }
        .map_err(|e| Fault::new(day, subject, FaultKind::DivisionByZero, e.to_string()))?;

        match trades {
            Some(trades) => {
                tracing::info!(
                    "Day {} | z {:.3} | beta {:.4} | {:?} | qty1 {:.4} qty2 {:.4}",
                    day,
                    snapshot.z_score,
                    snapshot.hedge.beta,
                    signal,
                    position.qty1(),
                    position.qty2()
                );
                emit(day, &trades, sink, report);
            }
            None => tracing::debug!("Day {} | z {:.3} | HOLD", day, snapshot.z_score),
        }
        Ok(())
    }
}

impl DailyStrategy for PairsStrategy {
    fn name(&self) -> &'static str {
        "pairs"
    }

    fn on_day(
        &mut self,
        day: usize,
        panel: &PricePanel,
        sink: &mut dyn OrderSink,
    ) -> Result<DayReport, Fault> {
        let mut report = DayReport::default();

        if self.phase == PairsPhase::Unselected {
            let pair = select_pair(panel, self.params.max_p_value, day)?;
            tracing::info!(
                "Selected pair ({}, {}) | p-value {:.6} | coint slope {:.4}",
                pair.stock1,
                pair.stock2,
                pair.p_value,
                pair.coint_slope
            );
            self.phase = PairsPhase::Selected(pair);
        }

        let outcome = match self.phase.clone() {
            PairsPhase::Selected(pair) => self.open(day, pair, panel, sink, &mut report),
            _ => self.decide(day, panel, sink, &mut report),
        };

        if let Err(fault) = outcome {
            tracing::warn!("{}", fault);
            report.faults.push(fault);
        }
        Ok(report)
    }
}

fn leg_prices(panel: &PricePanel, pair: &PairCandidate, day: usize) -> Result<(f64, f64), Fault> {
    let subject = Subject::Pair(pair.stock1, pair.stock2);
    let lookup = |asset| {
        panel
            .close(asset, day)
            .map_err(|e| Fault::new(day, subject, FaultKind::Internal, e.to_string()))
    };
    Ok((lookup(pair.stock1)?, lookup(pair.stock2)?))
}

fn emit(day: usize, trades: &[LegTrade], sink: &mut dyn OrderSink, report: &mut DayReport) {
    for trade in trades {
        sink.emit_order(Order::new(day, trade.asset_id, trade.quantity));
        report.orders_emitted += 1;
    }
}
