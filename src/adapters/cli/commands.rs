//! CLI Command Handlers
//!
//! Implementation of all CLI commands for the daystep engine.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::adapters::csv_panel::{load_panel, write_panel, LoadOptions, LoadedPanel};
use crate::adapters::order_export::{save_orders_csv, save_orders_json};
use crate::adapters::synthetic::{generate_panel, trading_dates, CointegratedPair, SyntheticSpec};
use crate::application::{Backtest, BacktestError, RunSummary};
use crate::config::{load_config, Config, StrategyKind};
use crate::domain::{FaultKind, PricePanel};
use crate::ports::{DailyStrategy, RecordingSink};
use crate::strategy::{scan_pairs, PairsStrategy, RotationStrategy};

/// daystep - day-stepped multi-asset trading signals
#[derive(Parser, Debug)]
#[command(
    name = "daystep",
    version = env!("CARGO_PKG_VERSION"),
    about = "Day-stepped rotation and pairs trading signals over a close-price panel",
    long_about = "daystep walks a panel of daily closes one trading day at a time and emits \
                  trade-at-close orders from either a moving-average rotation or a \
                  cointegrated pairs strategy."
)]
pub struct CliApp {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a strategy over the configured panel
    Run(RunCmd),

    /// List cointegrated pairs in the configured panel
    Scan(ScanCmd),

    /// Write a synthetic close-price panel
    Synth(SynthCmd),
}

impl Command {
    /// Config file the command reads, if any
    pub fn config_path(&self) -> Option<&Path> {
        match self {
            Command::Run(cmd) => Some(&cmd.config),
            Command::Scan(cmd) => Some(&cmd.config),
            Command::Synth(_) => None,
        }
    }
}

/// Run a strategy
#[derive(Parser, Debug)]
pub struct RunCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/daystep.toml")]
    pub config: PathBuf,

    /// Override the panel CSV path
    #[arg(long, value_name = "FILE")]
    pub panel: Option<PathBuf>,

    /// Override the strategy (rotation, pairs)
    #[arg(short, long, value_name = "STRATEGY")]
    pub strategy: Option<StrategyKind>,

    /// Override starting cash
    #[arg(long, value_name = "AMOUNT")]
    pub init_cash: Option<f64>,

    /// Override rotation top-K
    #[arg(long, value_name = "K")]
    pub top_k: Option<usize>,

    /// Override rotation rebalance interval
    #[arg(long, value_name = "DAYS")]
    pub rebalance_interval: Option<usize>,

    /// Override pairs window
    #[arg(long, value_name = "DAYS")]
    pub window: Option<usize>,

    /// Override pairs entry threshold
    #[arg(long, value_name = "Z")]
    pub entry_z: Option<f64>,

    /// Override pairs exit threshold
    #[arg(long, value_name = "Z")]
    pub exit_z: Option<f64>,

    /// Export orders to CSV
    #[arg(long, value_name = "FILE")]
    pub export_csv: Option<PathBuf>,

    /// Export orders to JSON
    #[arg(long, value_name = "FILE")]
    pub export_json: Option<PathBuf>,
}

/// Scan for cointegrated pairs
#[derive(Parser, Debug)]
pub struct ScanCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/daystep.toml")]
    pub config: PathBuf,

    /// Override the panel CSV path
    #[arg(long, value_name = "FILE")]
    pub panel: Option<PathBuf>,

    /// Override the p-value cutoff
    #[arg(long, value_name = "P")]
    pub max_p: Option<f64>,

    /// Number of pairs to show
    #[arg(short, long, value_name = "N", default_value = "10")]
    pub limit: usize,
}

/// Generate a synthetic panel
#[derive(Parser, Debug)]
pub struct SynthCmd {
    /// Output CSV path
    #[arg(short, long, value_name = "FILE")]
    pub output: PathBuf,

    /// Number of assets
    #[arg(long, value_name = "N", default_value = "10")]
    pub assets: usize,

    /// Number of trading days
    #[arg(long, value_name = "N", default_value = "500")]
    pub days: usize,

    /// RNG seed
    #[arg(long, default_value = "42")]
    pub seed: u64,

    /// First trading date (YYYY-MM-DD)
    #[arg(long, value_name = "DATE", default_value = "2015-01-01")]
    pub start_date: NaiveDate,

    /// Daily log-return volatility
    #[arg(long, value_name = "SIGMA", default_value = "0.01")]
    pub volatility: f64,

    /// Plant a cointegrated pair between assets A and B
    #[arg(long, num_args = 2, value_names = ["A", "B"])]
    pub pair: Option<Vec<usize>>,

    /// Hedge ratio of the planted pair
    #[arg(long, value_name = "BETA", default_value = "1.0")]
    pub hedge_ratio: f64,
}

/// Execute the CLI command
pub fn execute(app: CliApp) -> Result<()> {
    match app.command {
        Command::Run(cmd) => run_command(cmd),
        Command::Scan(cmd) => scan_command(cmd),
        Command::Synth(cmd) => synth_command(cmd),
    }
}

fn load_run_panel(config: &Config, panel: Option<&Path>) -> Result<LoadedPanel> {
    let path = match panel {
        Some(p) => PathBuf::from(shellexpand::tilde(&p.to_string_lossy()).to_string()),
        None => config.data.resolved_panel_path(),
    };
    load_panel(&path, &LoadOptions::from(config))
        .with_context(|| format!("Failed to load panel {}", path.display()))
}

fn apply_overrides(config: &mut Config, cmd: &RunCmd) -> Result<()> {
    if let Some(strategy) = cmd.strategy {
        config.run.strategy = strategy;
    }
    if let Some(cash) = cmd.init_cash {
        config.run.init_cash = cash;
    }
    if let Some(k) = cmd.top_k {
        config.rotation.top_k = k;
    }
    if let Some(interval) = cmd.rebalance_interval {
        config.rotation.rebalance_interval = interval;
    }
    if let Some(window) = cmd.window {
        config.pairs.window = window;
    }
    if let Some(z) = cmd.entry_z {
        config.pairs.entry_z = z;
    }
    if let Some(z) = cmd.exit_z {
        config.pairs.exit_z = z;
    }
    config.validate().context("Invalid command-line overrides")?;
    Ok(())
}

/// Strategy named by the config
pub fn build_strategy(config: &Config) -> Box<dyn DailyStrategy> {
    match config.run.strategy {
        StrategyKind::Rotation => Box::new(RotationStrategy::new(config.rotation_params())),
        StrategyKind::Pairs => Box::new(PairsStrategy::new(config.pairs_params())),
    }
}

/// Handle run command
fn run_command(cmd: RunCmd) -> Result<()> {
    let mut config = load_config(&cmd.config).context("Failed to load configuration")?;
    apply_overrides(&mut config, &cmd)?;
    tracing::info!("Config: {} | strategy {}", cmd.config.display(), config.run.strategy);

    let loaded = load_run_panel(&config, cmd.panel.as_deref())?;
    let mut sink = RecordingSink::new();
    let backtest = Backtest::new(build_strategy(&config), &loaded.panel);

    let summary = match backtest.run(&mut sink) {
        Ok(summary) => summary,
        Err(BacktestError::Aborted { fault, summary }) => {
            print_summary(&summary, &loaded, &sink);
            bail!("Run aborted on day {}: {}", fault.day, fault.message);
        }
        Err(e) => return Err(e.into()),
    };

    print_summary(&summary, &loaded, &sink);

    if let Some(ref path) = cmd.export_csv {
        save_orders_csv(path, sink.orders(), &loaded.panel)?;
        println!("  Orders CSV: {}", path.display());
    }
    if let Some(ref path) = cmd.export_json {
        save_orders_json(path, sink.orders(), &loaded.panel)?;
        println!("  Orders JSON: {}", path.display());
    }

    Ok(())
}

fn print_summary(summary: &RunSummary, loaded: &LoadedPanel, sink: &RecordingSink) {
    let panel = &loaded.panel;
    println!("Run Summary ({})", summary.strategy);
    if let (Some(first), Some(last)) = (loaded.dates.first(), loaded.dates.last()) {
        println!("  Period: {} to {}", first, last);
    }
    println!("  Days processed: {} / {}", summary.days_processed, panel.num_days());
    println!("  Orders emitted: {}", summary.orders_emitted);

    let mut by_kind: BTreeMap<String, usize> = BTreeMap::new();
    for fault in &summary.faults {
        *by_kind.entry(fault.kind.to_string()).or_default() += 1;
    }
    println!("  Faults: {}", summary.faults.len());
    for (kind, count) in &by_kind {
        println!("    {}: {}", kind, count);
    }
    if summary
        .faults
        .iter()
        .any(|f| f.kind == FaultKind::InsufficientCandidates)
    {
        println!("  Note: some rebalances had fewer than top_k candidates");
    }

    println!("  Net positions:");
    print_positions(panel, sink);
}

fn print_positions(panel: &PricePanel, sink: &RecordingSink) {
    for (asset, ticker) in panel.tickers().iter().enumerate() {
        let qty = sink.net_quantity(asset);
        if qty.abs() > 1e-9 {
            println!("    {:<8} {:>16.4}", ticker, qty);
        }
    }
}

/// Handle scan command
fn scan_command(cmd: ScanCmd) -> Result<()> {
    let config = load_config(&cmd.config).context("Failed to load configuration")?;
    let loaded = load_run_panel(&config, cmd.panel.as_deref())?;
    let max_p = cmd.max_p.unwrap_or(config.pairs.max_p_value);

    let candidates = scan_pairs(&loaded.panel, max_p);
    let tickers = loaded.panel.tickers();

    println!(
        "Cointegrated pairs (p < {}) over {} assets x {} days: {}",
        max_p,
        loaded.panel.num_assets(),
        loaded.panel.num_days(),
        candidates.len()
    );
    for c in candidates.iter().take(cmd.limit) {
        println!(
            "  {:<8} {:<8} p={:.6} adf={:.4} slope={:.4}",
            tickers[c.stock1], tickers[c.stock2], c.p_value, c.adf_statistic, c.coint_slope
        );
    }

    Ok(())
}

/// Handle synth command
fn synth_command(cmd: SynthCmd) -> Result<()> {
    let mut spec = SyntheticSpec::new(cmd.assets, cmd.days)
        .with_seed(cmd.seed)
        .with_volatility(cmd.volatility);
    if let Some(ref legs) = cmd.pair {
        if let [a, b] = legs.as_slice() {
            spec = spec.with_pair(CointegratedPair::new(*a, *b).with_hedge_ratio(cmd.hedge_ratio));
        }
    }

    let panel = generate_panel(&spec).context("Failed to generate panel")?;
    let dates = trading_dates(cmd.start_date, panel.num_days());

    let file = std::fs::File::create(&cmd.output)
        .with_context(|| format!("Failed to create {}", cmd.output.display()))?;
    write_panel(file, &panel, &dates)?;

    println!(
        "Wrote {} assets x {} days to {}",
        panel.num_assets(),
        panel.num_days(),
        cmd.output.display()
    );
    if let Some(pair) = spec.pair {
        println!(
            "  Cointegrated pair: {} / {}",
            panel.tickers()[pair.stock1],
            panel.tickers()[pair.stock2]
        );
    }
    Ok(())
}
