//! Adapters
//!
//! Edges of the engine: CSV panels in, orders out, synthetic data and the CLI.

pub mod cli;
pub mod csv_panel;
pub mod order_export;
pub mod synthetic;

pub use csv_panel::{load_panel, read_panel, write_panel, LoadError, LoadOptions, LoadedPanel};
pub use order_export::{export_orders_csv, export_orders_json, save_orders_csv, save_orders_json, OrderRecord};
pub use synthetic::{generate_panel, synthetic_ticker, trading_dates, CointegratedPair, SynthError, SyntheticSpec};
