//! Configuration Module
//!
//! Loads and validates run configuration from TOML files.

pub mod loader;

pub use loader::{
    Config, ConfigError, DataSection, LoggingSection, PairsSection, RotationSection, RunSection,
    StrategyKind, load_config,
};
