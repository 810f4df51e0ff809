use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction implied by the sign of an order quantity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// A trade-at-close instruction: positive quantity buys, negative sells
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub day: usize,
    pub asset_id: usize,
    pub quantity: f64,
}

impl Order {
    pub fn new(day: usize, asset_id: usize, quantity: f64) -> Self {
        Self {
            day,
            asset_id,
            quantity,
        }
    }

    pub fn side(&self) -> Side {
        if self.quantity < 0.0 {
            Side::Sell
        } else {
            Side::Buy
        }
    }

    /// Notional value of the order at `price`
    pub fn notional(&self, price: f64) -> f64 {
        self.quantity.abs() * price
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "day {} | asset {} | {} {:.6}",
            self.day,
            self.asset_id,
            self.side(),
            self.quantity.abs()
        )
    }
}
