//! Ports Layer - Boundaries between the engine and its collaborators
//!
//! - `OrderSink`: where generated orders go
//! - `DailyStrategy`: what the day loop drives

pub mod order_sink;
pub mod strategy;

pub use order_sink::{OrderSink, RecordingSink};
pub use strategy::{DailyStrategy, DayReport};

#[cfg(test)]
pub use order_sink::MockOrderSink;
