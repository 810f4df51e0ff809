//! Order sink port
//!
//! The engine's only output. Strategies emit zero or more orders for a day;
//! the driver then closes the day with exactly one `advance_day` call.

use crate::domain::Order;

/// Receiver of generated orders (broker simulator, exporter, recorder)
#[cfg_attr(test, mockall::automock)]
pub trait OrderSink {
    /// Accept one order for the current day
    fn emit_order(&mut self, order: Order);

    /// Close `day`; no further orders for it follow
    fn advance_day(&mut self, day: usize);
}

/// In-memory sink that keeps every order and day boundary it sees
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    orders: Vec<Order>,
    days_closed: Vec<usize>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    /// Days passed to `advance_day`, in call order
    pub fn days_closed(&self) -> &[usize] {
        &self.days_closed
    }

    /// Orders emitted for a single day
    pub fn orders_on(&self, day: usize) -> Vec<Order> {
        self.orders.iter().filter(|o| o.day == day).copied().collect()
    }

    /// Cumulative signed quantity emitted for `asset_id`
    pub fn net_quantity(&self, asset_id: usize) -> f64 {
        self.orders
            .iter()
            .filter(|o| o.asset_id == asset_id)
            .map(|o| o.quantity)
            .sum()
    }

    pub fn into_orders(self) -> Vec<Order> {
        self.orders
    }
}

impl OrderSink for RecordingSink {
    fn emit_order(&mut self, order: Order) {
        self.orders.push(order);
    }

    fn advance_day(&mut self, day: usize) {
        self.days_closed.push(day);
    }
}
