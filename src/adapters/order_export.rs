//! Order export
//!
//! Writes a run's order tape as CSV (`day,asset_id,ticker,quantity`) or as a
//! JSON array of the same records.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::{Order, PricePanel};

/// One exported order row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub day: usize,
    pub asset_id: usize,
    pub ticker: String,
    pub quantity: f64,
}

impl OrderRecord {
    pub fn from_order(order: &Order, panel: &PricePanel) -> Self {
        Self {
            day: order.day,
            asset_id: order.asset_id,
            ticker: panel.ticker(order.asset_id).unwrap_or_default().to_string(),
            quantity: order.quantity,
        }
    }
}

fn records(orders: &[Order], panel: &PricePanel) -> Vec<OrderRecord> {
    orders.iter().map(|o| OrderRecord::from_order(o, panel)).collect()
}

/// Render orders as CSV with a header row
pub fn export_orders_csv(orders: &[Order], panel: &PricePanel) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for record in records(orders, panel) {
        wtr.serialize(record)?;
    }
    // serialize only writes the header alongside the first record
    if orders.is_empty() {
        wtr.write_record(["day", "asset_id", "ticker", "quantity"])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Render orders as pretty JSON
pub fn export_orders_json(orders: &[Order], panel: &PricePanel) -> Result<String> {
    serde_json::to_string_pretty(&records(orders, panel)).context("failed to serialize orders to JSON")
}

/// Write the CSV tape to `path`
pub fn save_orders_csv<P: AsRef<Path>>(path: P, orders: &[Order], panel: &PricePanel) -> Result<()> {
    let path = path.as_ref();
    std::fs::write(path, export_orders_csv(orders, panel)?)
        .with_context(|| format!("failed to write {}", path.display()))?;
    tracing::info!("Wrote {} orders to {}", orders.len(), path.display());
    Ok(())
}

/// Write the JSON tape to `path`
pub fn save_orders_json<P: AsRef<Path>>(path: P, orders: &[Order], panel: &PricePanel) -> Result<()> {
    let path = path.as_ref();
    std::fs::write(path, export_orders_json(orders, panel)?)
        .with_context(|| format!("failed to write {}", path.display()))?;
    tracing::info!("Wrote {} orders to {}", orders.len(), path.display());
    Ok(())
}
