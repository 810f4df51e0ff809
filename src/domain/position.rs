//! Pair position state
//!
//! Holds the two legs of the pairs strategy. Quantities only change through
//! the transition functions below, each of which returns the leg trades it
//! applied so the caller can emit exactly what was booked.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Directional tilt implied by which legs are held
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpreadBias {
    /// Both legs held
    Flat,
    /// Only stock2 held (spread expected to widen back up)
    LongSpread,
    /// Only stock1 held (spread expected to fall back)
    ShortSpread,
}

/// One leg of an order pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LegTrade {
    pub asset_id: usize,
    pub quantity: f64,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PositionError {
    #[error("Non-positive price {price} for asset {asset_id}")]
    InvalidPrice { asset_id: usize, price: f64 },
    #[error("Invalid notional: {0}")]
    InvalidNotional(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairPosition {
    pub stock1: usize,
    pub stock2: usize,
    qty1: f64,
    qty2: f64,
}

impl PairPosition {
    /// Split `notional` evenly across both legs at the given prices.
    ///
    /// Returns the new position and the two opening trades (stock1 first).
    pub fn open(
        stock1: usize,
        stock2: usize,
        notional: f64,
        price1: f64,
        price2: f64,
    ) -> Result<(Self, [LegTrade; 2]), PositionError> {
        if notional.is_nan() || notional <= 0.0 {
            return Err(PositionError::InvalidNotional(notional));
        }
        check_price(stock1, price1)?;
        check_price(stock2, price2)?;

        let trades = [
            LegTrade { asset_id: stock1, quantity: notional * 0.5 / price1 },
            LegTrade { asset_id: stock2, quantity: notional * 0.5 / price2 },
        ];
        let mut position = Self {
            stock1,
            stock2,
            qty1: 0.0,
            qty2: 0.0,
        };
        position.apply(&trades);
        Ok((position, trades))
    }

    pub fn qty1(&self) -> f64 {
        self.qty1
    }

    pub fn qty2(&self) -> f64 {
        self.qty2
    }

    pub fn bias(&self) -> SpreadBias {
        if self.qty2 == 0.0 && self.qty1 != 0.0 {
            SpreadBias::ShortSpread
        } else if self.qty1 == 0.0 && self.qty2 != 0.0 {
            SpreadBias::LongSpread
        } else {
            SpreadBias::Flat
        }
    }

    /// Sell all of stock2 and buy stock1 with the proceeds (stock2 trade first).
    ///
    /// `None` when stock2 is already flat.
    pub fn rotate_into_stock1(
        &mut self,
        price1: f64,
        price2: f64,
    ) -> Result<Option<[LegTrade; 2]>, PositionError> {
        check_price(self.stock1, price1)?;
        check_price(self.stock2, price2)?;
        if self.qty2 == 0.0 {
            return Ok(None);
        }

        let proceeds = price2 * self.qty2;
        let trades = [
            LegTrade { asset_id: self.stock2, quantity: -self.qty2 },
            LegTrade { asset_id: self.stock1, quantity: proceeds / price1 },
        ];
        self.apply(&trades);
        Ok(Some(trades))
    }

    /// Sell all of stock1 and buy stock2 with the proceeds (stock1 trade first).
    ///
    /// `None` when stock1 is already flat.
    pub fn rotate_into_stock2(
        &mut self,
        price1: f64,
        price2: f64,
    ) -> Result<Option<[LegTrade; 2]>, PositionError> {
        check_price(self.stock1, price1)?;
        check_price(self.stock2, price2)?;
        if self.qty1 == 0.0 {
            return Ok(None);
        }

        let proceeds = price1 * self.qty1;
        let trades = [
            LegTrade { asset_id: self.stock1, quantity: -self.qty1 },
            LegTrade { asset_id: self.stock2, quantity: proceeds / price2 },
        ];
        self.apply(&trades);
        Ok(Some(trades))
    }

    /// Move a single-leg position back to a 50/50 notional split (stock1 trade first).
    ///
    /// `None` unless exactly one leg is flat.
    pub fn split_evenly(
        &mut self,
        price1: f64,
        price2: f64,
    ) -> Result<Option<[LegTrade; 2]>, PositionError> {
        check_price(self.stock1, price1)?;
        check_price(self.stock2, price2)?;

        let trades = match self.bias() {
            SpreadBias::LongSpread => {
                let held = self.qty2 * price2;
                [
                    LegTrade { asset_id: self.stock1, quantity: held * 0.5 / price1 },
                    LegTrade { asset_id: self.stock2, quantity: -(held * 0.5 / price2) },
                ]
            }
            SpreadBias::ShortSpread => {
                let held = self.qty1 * price1;
                [
                    LegTrade { asset_id: self.stock1, quantity: -(held * 0.5 / price1) },
                    LegTrade { asset_id: self.stock2, quantity: held * 0.5 / price2 },
                ]
            }
            SpreadBias::Flat => return Ok(None),
        };
        self.apply(&trades);
        Ok(Some(trades))
    }

    fn apply(&mut self, trades: &[LegTrade]) {
        for trade in trades {
            if trade.asset_id == self.stock1 {
                self.qty1 += trade.quantity;
            } else if trade.asset_id == self.stock2 {
                self.qty2 += trade.quantity;
            }
        }
    }
}

fn check_price(asset_id: usize, price: f64) -> Result<(), PositionError> {
    if price > 0.0 {
        Ok(())
    } else {
        Err(PositionError::InvalidPrice { asset_id, price })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn opened() -> PairPosition {
        PairPosition::open(0, 1, 1000.0, 10.0, 20.0).unwrap().0
    }

    #[test]
    fn test_open_splits_notional() {
        let (position, trades) = PairPosition::open(0, 1, 1000.0, 10.0, 20.0).unwrap();
        assert_eq!(trades[0], LegTrade { asset_id: 0, quantity: 50.0 });
        assert_eq!(trades[1], LegTrade { asset_id: 1, quantity: 25.0 });
        assert_eq!(position.qty1(), 50.0);
        assert_eq!(position.qty2(), 25.0);
        assert_eq!(position.bias(), SpreadBias::Flat);
    }

    #[test]
    fn test_open_rejects_zero_price() {
        let result = PairPosition::open(0, 1, 1000.0, 0.0, 20.0);
        assert!(matches!(result, Err(PositionError::InvalidPrice { asset_id: 0, .. })));
    }

    #[test]
    fn test_open_rejects_bad_notional() {
        assert!(matches!(
            PairPosition::open(0, 1, 0.0, 10.0, 20.0),
            Err(PositionError::InvalidNotional(_))
        ));
    }

    #[test]
    fn test_rotate_into_stock1() {
        let mut position = opened();
        let trades = position.rotate_into_stock1(10.0, 20.0).unwrap().unwrap();
        assert_eq!(trades[0], LegTrade { asset_id: 1, quantity: -25.0 });
        assert_eq!(trades[1], LegTrade { asset_id: 0, quantity: 50.0 });
        assert_eq!(position.qty1(), 100.0);
        assert_eq!(position.qty2(), 0.0);
        assert_eq!(position.bias(), SpreadBias::ShortSpread);

        // already flat in stock2
        assert_eq!(position.rotate_into_stock1(10.0, 20.0).unwrap(), None);
    }

    #[test]
    fn test_rotate_into_stock2() {
        let mut position = opened();
        let trades = position.rotate_into_stock2(12.0, 20.0).unwrap().unwrap();
        assert_eq!(trades[0], LegTrade { asset_id: 0, quantity: -50.0 });
        assert_relative_eq!(trades[1].quantity, 30.0);
        assert_eq!(position.qty1(), 0.0);
        assert_relative_eq!(position.qty2(), 55.0);
        assert_eq!(position.bias(), SpreadBias::LongSpread);
    }

    #[test]
    fn test_split_evenly_from_stock2() {
        let mut position = opened();
        position.rotate_into_stock2(10.0, 20.0).unwrap();
        // 50 shares of stock2 @ 20 = 1000 notional
        let trades = position.split_evenly(10.0, 20.0).unwrap().unwrap();
        assert_relative_eq!(trades[0].quantity, 50.0);
        assert_relative_eq!(trades[1].quantity, -25.0);
        assert_relative_eq!(position.qty1(), 50.0);
        assert_relative_eq!(position.qty2(), 25.0);
        assert_eq!(position.bias(), SpreadBias::Flat);
    }

    #[test]
    fn test_split_evenly_from_stock1() {
        let mut position = opened();
        position.rotate_into_stock1(10.0, 20.0).unwrap();
        let trades = position.split_evenly(10.0, 40.0).unwrap().unwrap();
        assert_eq!(trades[0].asset_id, 0);
        assert_relative_eq!(trades[0].quantity, -50.0);
        assert_relative_eq!(trades[1].quantity, 12.5);
    }

    #[test]
    fn test_split_evenly_noop_when_flat() {
        let mut position = opened();
        assert_eq!(position.split_evenly(10.0, 20.0).unwrap(), None);
        assert_eq!(position.qty1(), 50.0);
    }
}
