//! daystep - Day-Stepped Multi-Asset Trading Signal Engine
//!
//! Walks a panel of daily closes one trading day at a time and emits
//! trade-at-close orders into an `OrderSink`.
//!
//! # Modules
//!
//! - `domain`: Core types (PricePanel, Order, Fault, PairPosition, AssetScore)
//! - `ports`: Trait abstractions (OrderSink, DailyStrategy)
//! - `strategy`: Rolling statistics, ranking, cointegration, Rotation and Pairs
//! - `adapters`: CSV panels, order export, synthetic panels, CLI
//! - `config`: Configuration loading and validation
//! - `application`: Backtest driver

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod strategy;
