//! Daily strategy port
//!
//! One decision per trading day. A strategy reads the shared panel, writes
//! orders to the sink, and reports what it skipped. Returning `Err` means
//! the fault is fatal and the run stops.

use serde::{Deserialize, Serialize};

use crate::domain::{Fault, PricePanel};
use crate::ports::order_sink::OrderSink;

/// Outcome of one decision day
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DayReport {
    pub orders_emitted: usize,
    /// Recovered faults (skipped assets or a skipped decision)
    pub faults: Vec<Fault>,
}

impl DayReport {
    pub fn is_clean(&self) -> bool {
        self.faults.is_empty()
    }
}

/// Day-stepped strategy driven by the backtest loop
pub trait DailyStrategy {
    /// Short identifier used in logs
    fn name(&self) -> &'static str;

    /// Decide and emit orders for `day`; must not call `advance_day`
    fn on_day(
        &mut self,
        day: usize,
        panel: &PricePanel,
        sink: &mut dyn OrderSink,
    ) -> Result<DayReport, Fault>;
}
