//! Rotation Strategy
//!
//! Every `rebalance_interval` days (never on day 0) each asset is scored by
//! how far its close sits below its trailing moving average, the scores are
//! ranked, and the top `top_k` names each receive a buy order sized to
//! `init_cash / top_k` at the day's close.
//!
//! Orders are absolute targets: they are not netted against earlier buys.

use crate::domain::{AssetScore, Fault, FaultKind, Order, PricePanel, Subject};
use crate::ports::{DailyStrategy, DayReport, OrderSink};
use crate::strategy::params::RotationParams;
use crate::strategy::ranker::{self, RankError};
use crate::strategy::stats;

/// Whether the current day rebalances
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationState {
    Idle,
    Rebalancing,
}

#[derive(Debug, Clone)]
pub struct RotationStrategy {
    params: RotationParams,
    state: RotationState,
    /// Asset ids bought on the most recent rebalance, in ranked order
    last_selection: Vec<usize>,
    rebalance_count: usize,
}

impl RotationStrategy {
    pub fn new(params: RotationParams) -> Self {
        Self {
            params,
            state: RotationState::Idle,
            last_selection: Vec::new(),
            rebalance_count: 0,
        }
    }

    pub fn params(&self) -> &RotationParams {
        &self.params
    }

    pub fn state(&self) -> RotationState {
        self.state
    }

    pub fn last_selection(&self) -> &[usize] {
        &self.last_selection
    }

    pub fn rebalance_count(&self) -> usize {
        self.rebalance_count
    }

    /// A zero interval never rebalances
    pub fn is_rebalance_day(&self, day: usize) -> bool {
        day != 0 && day.checked_rem(self.params.rebalance_interval) == Some(0)
    }

    /// Deviation ratio per asset, ascending id; failures become faults
    pub fn score_assets(&self, day: usize, panel: &PricePanel, faults: &mut Vec<Fault>) -> Vec<AssetScore> {
        let window = self.params.ma_window();
        let mut scores = Vec::with_capacity(panel.num_assets());

        for asset in 0..panel.num_assets() {
            let series = match panel.series(asset) {
                Ok(series) => series,
                Err(e) => {
                    record(faults, Fault::new(day, Subject::Asset(asset), FaultKind::Internal, e.to_string()));
                    continue;
                }
            };
            let price = match series.get(day) {
                Some(&price) => price,
                None => {
                    record(
                        faults,
                        Fault::new(day, Subject::Asset(asset), FaultKind::Internal, "day out of range"),
                    );
                    continue;
                }
            };
            if price <= 0.0 {
                record(
                    faults,
                    Fault::new(
                        day,
                        Subject::Asset(asset),
                        FaultKind::DivisionByZero,
                        format!("non-positive close {}", price),
                    ),
                );
                continue;
            }

            let score = stats::rolling_mean(series, day, window)
                .and_then(|mean| stats::deviation_ratio(price, mean));
            match score {
                Ok(score) => {
                    tracing::debug!("Day {} | asset {} | deviation {:.6}", day, asset, score);
                    scores.push(AssetScore::new(asset, score));
                }
                Err(e) => record(
                    faults,
                    Fault::new(day, Subject::Asset(asset), e.fault_kind(), e.to_string()),
                ),
            }
        }

        scores
    }

    fn rebalance(&mut self, day: usize, panel: &PricePanel, sink: &mut dyn OrderSink) -> DayReport {
        let mut report = DayReport::default();
        let scores = self.score_assets(day, panel, &mut report.faults);
        let ranked = ranker::rank(scores);

        if ranked.is_empty() {
            record(
                &mut report.faults,
                Fault::new(
                    day,
                    Subject::Run,
                    FaultKind::InsufficientCandidates,
                    "no rankable assets, rebalance skipped",
                ),
            );
            return report;
        }

        let selected = match ranker::select_top_k(&ranked, self.params.top_k) {
            Ok(selected) => selected,
            Err(RankError::InsufficientCandidates { required, available }) => {
                record(
                    &mut report.faults,
                    Fault::new(
                        day,
                        Subject::Run,
                        FaultKind::InsufficientCandidates,
                        format!("{} of {} slots filled, remainder left in cash", available, required),
                    ),
                );
                ranker::take_up_to(&ranked, self.params.top_k)
            }
        };

        let target_value = self.params.weight() * self.params.init_cash;
        self.last_selection.clear();

        for entry in selected {
            // scoring already rejected non-positive closes
            let price = match panel.close(entry.asset_id, day) {
                Ok(price) => price,
                Err(e) => {
                    record(
                        &mut report.faults,
                        Fault::new(day, Subject::Asset(entry.asset_id), FaultKind::Internal, e.to_string()),
                    );
                    continue;
                }
            };
            let order = Order::new(day, entry.asset_id, target_value / price);
            tracing::info!(
                "Rebalance {} | {} | score {:.4} | price {:.2}",
                self.rebalance_count + 1,
                order,
                entry.score,
                price
            );
            sink.emit_order(order);
            report.orders_emitted += 1;
            self.last_selection.push(entry.asset_id);
        }

        self.rebalance_count += 1;
        report
    }
}

impl DailyStrategy for RotationStrategy {
    fn name(&self) -> &'static str {
        "rotation"
    }

    fn on_day(
        &mut self,
        day: usize,
        panel: &PricePanel,
        sink: &mut dyn OrderSink,
    ) -> Result<DayReport, Fault> {
        if !self.is_rebalance_day(day) {
            self.state = RotationState::Idle;
            return Ok(DayReport::default());
        }

        self.state = RotationState::Rebalancing;
        Ok(self.rebalance(day, panel, sink))
    }
}

fn record(faults: &mut Vec<Fault>, fault: Fault) {
    tracing::warn!("{}", fault);
    faults.push(fault);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{MockOrderSink, RecordingSink};
    use approx::assert_relative_eq;

    /// `num_assets` flat series at 100 for `num_days`
    fn flat_panel(num_assets: usize, num_days: usize) -> Vec<Vec<f64>> {
        vec![vec![100.0; num_days]; num_assets]
    }

    fn run(strategy: &mut RotationStrategy, panel: &PricePanel) -> (RecordingSink, Vec<Fault>) {
        let mut sink = RecordingSink::new();
        let mut faults = Vec::new();
        for day in 0..panel.num_days() {
            let report = strategy.on_day(day, panel, &mut sink).unwrap();
            faults.extend(report.faults);
            sink.advance_day(day);
        }
        (sink, faults)
    }

    #[test]
    fn test_rebalance_cadence() {
        let panel = PricePanel::from_series(flat_panel(3, 21)).unwrap();
        let params = RotationParams::default()
            .with_rebalance_interval(5)
            .with_top_k(2);
        let mut strategy = RotationStrategy::new(params);

        let (sink, faults) = run(&mut strategy, &panel);
        assert!(faults.is_empty());

        let days: Vec<usize> = sink.orders().iter().map(|o| o.day).collect();
        assert_eq!(days, vec![5, 5, 10, 10, 15, 15, 20, 20]);
        assert!(sink.orders().iter().all(|o| o.day % 5 == 0 && o.day != 0));
        assert_eq!(strategy.rebalance_count(), 4);
    }

    #[test]
    fn test_zero_interval_never_rebalances() {
        let panel = PricePanel::from_series(flat_panel(3, 12)).unwrap();
        let mut strategy = RotationStrategy::new(RotationParams::default().with_rebalance_interval(0));

        let mut sink = MockOrderSink::new();
        sink.expect_emit_order().times(0);
        sink.expect_advance_day().times(0);

        for day in 0..panel.num_days() {
            assert!(!strategy.is_rebalance_day(day));
            let report = strategy.on_day(day, &panel, &mut sink).unwrap();
            assert_eq!(report.orders_emitted, 0);
            assert!(report.is_clean());
        }
        assert_eq!(strategy.rebalance_count(), 0);
    }

    #[test]
    fn test_drop_ranks_first() {
        let mut closes = flat_panel(12, 31);
        closes[7][30] = 90.0;
        let panel = PricePanel::from_series(closes).unwrap();
        let mut strategy = RotationStrategy::new(RotationParams::default());

        let (sink, _) = run(&mut strategy, &panel);
        let orders = sink.orders_on(30);
        assert_eq!(orders.len(), 10);
        assert_eq!(orders[0].asset_id, 7);
        assert_relative_eq!(orders[0].quantity, (1_000_000.0 / 10.0) / 90.0, epsilon = 1e-9);

        // remaining flat names tie at zero and fill by ascending id
        let rest: Vec<usize> = orders[1..].iter().map(|o| o.asset_id).collect();
        assert_eq!(rest, vec![0, 1, 2, 3, 4, 5, 6, 8, 9]);
        assert_eq!(strategy.last_selection()[0], 7);
    }

    #[test]
    fn test_allocation_sums_to_init_cash() {
        let closes: Vec<Vec<f64>> = (0..6)
            .map(|a| (0..11).map(|d| 50.0 + a as f64 * 7.0 + ((a * d) % 5) as f64).collect())
            .collect();
        let panel = PricePanel::from_series(closes).unwrap();
        let params = RotationParams::default()
            .with_init_cash(250_000.0)
            .with_rebalance_interval(10)
            .with_top_k(4);
        let mut strategy = RotationStrategy::new(params);

        let (sink, _) = run(&mut strategy, &panel);
        let orders = sink.orders_on(10);
        assert_eq!(orders.len(), 4);
        let allocated: f64 = orders
            .iter()
            .map(|o| o.notional(panel.close(o.asset_id, 10).unwrap()))
            .sum();
        assert_relative_eq!(allocated, 250_000.0, epsilon = 1e-6);
    }

    #[test]
    fn test_partial_allocation_when_short_of_candidates() {
        let panel = PricePanel::from_series(flat_panel(3, 6)).unwrap();
        let params = RotationParams::default()
            .with_init_cash(1000.0)
            .with_rebalance_interval(5)
            .with_top_k(5);
        let mut strategy = RotationStrategy::new(params);

        let (sink, faults) = run(&mut strategy, &panel);
        assert_eq!(sink.orders().len(), 3);
        for order in sink.orders() {
            assert_relative_eq!(order.quantity, 200.0 / 100.0);
        }
        assert_eq!(faults.len(), 1);
        assert_eq!(faults[0].kind, FaultKind::InsufficientCandidates);
        assert!(!faults[0].is_fatal());
    }

    #[test]
    fn test_zero_close_skips_asset() {
        let mut closes = flat_panel(3, 6);
        closes[1][5] = 0.0;
        let panel = PricePanel::from_series(closes).unwrap();
        let params = RotationParams::default().with_rebalance_interval(5).with_top_k(2);
        let mut strategy = RotationStrategy::new(params);

        let (sink, faults) = run(&mut strategy, &panel);
        let ids: Vec<usize> = sink.orders().iter().map(|o| o.asset_id).collect();
        assert_eq!(ids, vec![0, 2]);
        assert_eq!(faults.len(), 1);
        assert_eq!(faults[0].subject, Subject::Asset(1));
        assert_eq!(faults[0].kind, FaultKind::DivisionByZero);
        assert_eq!(faults[0].day, 5);
    }

    #[test]
    fn test_short_history_skips_rebalance() {
        let panel = PricePanel::from_series(flat_panel(2, 6)).unwrap();
        let params = RotationParams::default()
            .with_rebalance_interval(5)
            .with_ma_window(10)
            .with_top_k(1);
        let mut strategy = RotationStrategy::new(params);

        let (sink, faults) = run(&mut strategy, &panel);
        assert!(sink.orders().is_empty());
        let kinds: Vec<FaultKind> = faults.iter().map(|f| f.kind).collect();
        assert_eq!(
            kinds,
            vec![
                FaultKind::InsufficientHistory,
                FaultKind::InsufficientHistory,
                FaultKind::InsufficientCandidates,
            ]
        );
    }

    #[test]
    fn test_state_tracks_rebalance_days() {
        let panel = PricePanel::from_series(flat_panel(2, 4)).unwrap();
        let params = RotationParams::default().with_rebalance_interval(2).with_top_k(1);
        let mut strategy = RotationStrategy::new(params);
        let mut sink = RecordingSink::new();

        strategy.on_day(1, &panel, &mut sink).unwrap();
        assert_eq!(strategy.state(), RotationState::Idle);
        strategy.on_day(2, &panel, &mut sink).unwrap();
        assert_eq!(strategy.state(), RotationState::Rebalancing);
    }

    #[test]
    fn test_emits_without_advancing_day() {
        let mut closes = flat_panel(3, 3);
        closes[2][2] = 80.0;
        let panel = PricePanel::from_series(closes).unwrap();
        let params = RotationParams::default()
            .with_init_cash(100.0)
            .with_rebalance_interval(2)
            .with_top_k(1);
        let mut strategy = RotationStrategy::new(params);

        let mut sink = MockOrderSink::new();
        sink.expect_emit_order()
            .withf(|order| order.day == 2 && order.asset_id == 2)
            .times(1)
            .return_const(());
        sink.expect_advance_day().times(0);

        let report = strategy.on_day(2, &panel, &mut sink).unwrap();
        assert_eq!(report.orders_emitted, 1);
        assert!(report.is_clean());
    }
}
