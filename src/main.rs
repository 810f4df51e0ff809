//! daystep - day-stepped rotation and pairs trading signals

use anyhow::Result;
use tracing_subscriber::{fmt, EnvFilter};

use daystep::adapters::cli::{self, CliApp};
use daystep::config::load_config;

fn main() -> Result<()> {
    // Load .env file if it exists (DAYSTEP_PANEL_PATH, RUST_LOG)
    dotenvy::dotenv().ok();

    let app = cli::init();
    init_logging(&app)?;

    cli::execute(app)
}

/// Flags win, then RUST_LOG, then the config's logging.level
fn init_logging(app: &CliApp) -> Result<()> {
    let filter = if app.debug {
        EnvFilter::new("debug")
    } else if app.verbose {
        EnvFilter::new("info")
    } else if let Ok(filter) = EnvFilter::try_from_default_env() {
        filter
    } else {
        let level = app
            .command
            .config_path()
            .and_then(|path| load_config(path).ok())
            .map(|config| config.logging.level)
            .unwrap_or_else(|| "warn".to_string());
        EnvFilter::new(level)
    };

    fmt().with_env_filter(filter).with_target(false).init();
    Ok(())
}
