//! Configuration Loader
//!
//! Loads and validates configuration from TOML files matching config.toml structure.

use chrono::NaiveDate;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::strategy::params::{PairsParams, RebalanceRule, RotationParams};

/// Environment override for `data.panel_path`
pub const PANEL_PATH_ENV: &str = "DAYSTEP_PANEL_PATH";

/// Main configuration structure matching config.toml
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub run: RunSection,
    pub data: DataSection,
    #[serde(default)]
    pub rotation: RotationSection,
    #[serde(default)]
    pub pairs: PairsSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

/// Which strategy a run drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    Rotation,
    Pairs,
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StrategyKind::Rotation => write!(f, "rotation"),
            StrategyKind::Pairs => write!(f, "pairs"),
        }
    }
}

impl std::str::FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rotation" => Ok(StrategyKind::Rotation),
            "pairs" => Ok(StrategyKind::Pairs),
            other => Err(format!("unknown strategy '{}' (expected rotation or pairs)", other)),
        }
    }
}

/// Run-wide parameters
#[derive(Debug, Clone, Deserialize)]
pub struct RunSection {
    pub strategy: StrategyKind,
    /// Cash both strategies size their orders against
    pub init_cash: f64,
    /// Panel columns, in asset id order
    pub tickers: Vec<String>,
    /// First calendar date considered (inclusive)
    pub start_date: NaiveDate,
    /// Last calendar date considered (inclusive)
    pub end_date: NaiveDate,
}

/// Price data location
#[derive(Debug, Clone, Deserialize)]
pub struct DataSection {
    /// Wide close-price CSV (`date,<TICKER>...`)
    pub panel_path: String,
}

impl DataSection {
    /// Panel path with env override and `~` expansion.
    /// Checks DAYSTEP_PANEL_PATH first, falls back to config value
    pub fn resolved_panel_path(&self) -> PathBuf {
        let raw = std::env::var(PANEL_PATH_ENV).unwrap_or_else(|_| self.panel_path.clone());
        PathBuf::from(shellexpand::tilde(&raw).to_string())
    }
}

/// Rotation strategy section
#[derive(Debug, Clone, Deserialize)]
pub struct RotationSection {
    /// Trading days between rebalances
    #[serde(default = "default_rebalance_interval")]
    pub rebalance_interval: usize,
    /// Names bought per rebalance
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Moving-average window (defaults to rebalance_interval)
    #[serde(default)]
    pub ma_window: Option<usize>,
}

impl Default for RotationSection {
    fn default() -> Self {
        Self {
            rebalance_interval: default_rebalance_interval(),
            top_k: default_top_k(),
            ma_window: None,
        }
    }
}

/// Pairs strategy section
#[derive(Debug, Clone, Deserialize)]
pub struct PairsSection {
    /// Hedge-ratio / z-score window in trading days
    #[serde(default = "default_window")]
    pub window: usize,
    #[serde(default = "default_entry_z")]
    pub entry_z: f64,
    #[serde(default = "default_exit_z")]
    pub exit_z: f64,
    /// Cointegration p-value a pair must beat
    #[serde(default = "default_max_p_value")]
    pub max_p_value: f64,
    /// "centered" or "legacy"
    #[serde(default)]
    pub rebalance_rule: RebalanceRule,
}

impl Default for PairsSection {
    fn default() -> Self {
        Self {
            window: default_window(),
            entry_z: default_entry_z(),
            exit_z: default_exit_z(),
            max_p_value: default_max_p_value(),
            rebalance_rule: RebalanceRule::default(),
        }
    }
}

/// Logging configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSection {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

fn default_rebalance_interval() -> usize {
    30
}

fn default_top_k() -> usize {
    10
}

fn default_window() -> usize {
    120
}

fn default_entry_z() -> f64 {
    1.0
}

fn default_exit_z() -> f64 {
    0.1
}

fn default_max_p_value() -> f64 {
    0.05
}

fn default_level() -> String {
    "info".to_string()
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

impl Config {
    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.run.tickers.is_empty() {
            return Err(ConfigError::ValidationError(
                "tickers cannot be empty".to_string(),
            ));
        }

        let mut seen = std::collections::HashSet::new();
        if let Some(dup) = self.run.tickers.iter().find(|t| !seen.insert(t.as_str())) {
            return Err(ConfigError::ValidationError(format!(
                "ticker {} listed more than once",
                dup
            )));
        }

        if self.run.start_date > self.run.end_date {
            return Err(ConfigError::ValidationError(format!(
                "start_date {} is after end_date {}",
                self.run.start_date, self.run.end_date
            )));
        }

        if self.data.panel_path.is_empty() {
            return Err(ConfigError::ValidationError(
                "panel_path cannot be empty".to_string(),
            ));
        }

        if self.run.strategy == StrategyKind::Pairs && self.run.tickers.len() < 2 {
            return Err(ConfigError::ValidationError(format!(
                "pairs strategy needs at least 2 tickers, got {}",
                self.run.tickers.len()
            )));
        }

        // Strategy sections share the params validation
        self.rotation_params()
            .validate()
            .map_err(|e| ConfigError::ValidationError(format!("rotation: {}", e)))?;
        self.pairs_params()
            .validate()
            .map_err(|e| ConfigError::ValidationError(format!("pairs: {}", e)))?;

        Ok(())
    }

    pub fn rotation_params(&self) -> RotationParams {
        RotationParams::from(self)
    }

    pub fn pairs_params(&self) -> PairsParams {
        PairsParams::from(self)
    }
}

// Conversion from Config to the strategy parameter structs
impl From<&Config> for RotationParams {
    fn from(config: &Config) -> Self {
        RotationParams {
            init_cash: config.run.init_cash,
            rebalance_interval: config.rotation.rebalance_interval,
            top_k: config.rotation.top_k,
            ma_window: config.rotation.ma_window,
        }
    }
}

impl From<&Config> for PairsParams {
    fn from(config: &Config) -> Self {
        PairsParams {
            init_cash: config.run.init_cash,
            window: config.pairs.window,
            entry_z: config.pairs.entry_z,
            exit_z: config.pairs.exit_z,
            max_p_value: config.pairs.max_p_value,
            rebalance_rule: config.pairs.rebalance_rule,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_valid_config() -> String {
        r#"
[run]
strategy = "pairs"
init_cash = 1000000.0
tickers = ["AAPL", "GOOGL", "MSFT"]
start_date = "2012-06-24"
end_date = "2013-05-30"

[data]
panel_path = "~/data/closes.csv"

[rotation]
rebalance_interval = 20
top_k = 2

[pairs]
window = 60
entry_z = 1.5
exit_z = 0.2
max_p_value = 0.01
rebalance_rule = "legacy"

[logging]
level = "debug"
"#
        .to_string()
    }

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let file = write_config(&create_valid_config());
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.run.strategy, StrategyKind::Pairs);
        assert_eq!(config.run.tickers.len(), 3);
        assert_eq!(config.run.start_date, NaiveDate::from_ymd_opt(2012, 6, 24).unwrap());
        assert_eq!(config.rotation.top_k, 2);
        assert_eq!(config.pairs.rebalance_rule, RebalanceRule::Legacy);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_config("/nonexistent/path/config.toml");
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), ConfigError::IoError(_)));
    }

    #[test]
    fn test_optional_sections_use_defaults() {
        let minimal = r#"
[run]
strategy = "rotation"
init_cash = 500.0
tickers = ["A"]
start_date = "2020-01-01"
end_date = "2020-12-31"

[data]
panel_path = "closes.csv"
"#;
        let file = write_config(minimal);
        let config = load_config(file.path()).unwrap();

        let rotation = config.rotation_params();
        assert_eq!(rotation.init_cash, 500.0);
        assert_eq!(rotation.rebalance_interval, 30);
        assert_eq!(rotation.top_k, 10);
        assert_eq!(rotation.ma_window(), 30);

        let pairs = config.pairs_params();
        assert_eq!(pairs.window, 120);
        assert_eq!(pairs.entry_z, 1.0);
        assert_eq!(pairs.exit_z, 0.1);
        assert_eq!(pairs.rebalance_rule, RebalanceRule::Centered);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_invalid_date_range() {
        let invalid = create_valid_config().replace("2013-05-30", "2011-01-01");
        let file = write_config(&invalid);
        assert!(matches!(
            load_config(file.path()).unwrap_err(),
            ConfigError::ValidationError(_)
        ));
    }

    #[test]
    fn test_duplicate_ticker() {
        let invalid = create_valid_config().replace("\"MSFT\"", "\"AAPL\"");
        let file = write_config(&invalid);
        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("AAPL"));
    }

    #[test]
    fn test_invalid_thresholds() {
        let invalid = create_valid_config().replace("exit_z = 0.2", "exit_z = 2.0");
        let file = write_config(&invalid);
        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(ref msg) if msg.starts_with("pairs")));
    }

    #[test]
    fn test_pairs_needs_two_tickers() {
        let invalid = create_valid_config().replace(
            "tickers = [\"AAPL\", \"GOOGL\", \"MSFT\"]",
            "tickers = [\"AAPL\"]",
        );
        let file = write_config(&invalid);
        assert!(matches!(
            load_config(file.path()).unwrap_err(),
            ConfigError::ValidationError(_)
        ));
    }

    #[test]
    fn test_unknown_strategy_is_parse_error() {
        let invalid = create_valid_config().replace("\"pairs\"", "\"momentum\"");
        let file = write_config(&invalid);
        assert!(matches!(
            load_config(file.path()).unwrap_err(),
            ConfigError::ParseError(_)
        ));
    }

    #[test]
    fn test_strategy_kind_from_str() {
        assert_eq!("Rotation".parse::<StrategyKind>(), Ok(StrategyKind::Rotation));
        assert_eq!("pairs".parse::<StrategyKind>(), Ok(StrategyKind::Pairs));
        assert!("momentum".parse::<StrategyKind>().is_err());
    }

    #[test]
    fn test_config_to_params() {
        let file = write_config(&create_valid_config());
        let config = load_config(file.path()).unwrap();

        let pairs = PairsParams::from(&config);
        assert_eq!(pairs.init_cash, 1_000_000.0);
        assert_eq!(pairs.window, 60);
        assert_eq!(pairs.entry_z, 1.5);
        assert_eq!(pairs.max_p_value, 0.01);

        let rotation = RotationParams::from(&config);
        assert_eq!(rotation.rebalance_interval, 20);
        assert_eq!(rotation.ma_window, None);
    }

    #[test]
    fn test_panel_path_tilde_expansion() {
        let file = write_config(&create_valid_config());
        let config = load_config(file.path()).unwrap();
        if std::env::var(PANEL_PATH_ENV).is_err() && std::env::var("HOME").is_ok() {
            let path = config.data.resolved_panel_path();
            assert!(!path.to_string_lossy().starts_with('~'));
            assert!(path.ends_with("data/closes.csv"));
        }
    }
}
