//! CSV Panel Adapter
//!
//! Reads and writes wide close-price files:
//!
//! ```text
//! date,AAPL,GOOGL,MSFT
//! 2012-06-25,80.12,280.55,29.10
//! ```
//!
//! Loading restricts rows to the date range and columns to the requested
//! tickers (in request order). Leading rows with a blank cell are dropped so
//! day 0 is the first complete day; a blank cell after that is an error.

use chrono::NaiveDate;
use std::io;
use std::path::Path;
use thiserror::Error;

use crate::config::Config;
use crate::domain::{PanelError, PricePanel};

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to read panel file: {0}")]
    Io(#[from] io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Panel file has no columns")]
    EmptyHeader,
    #[error("Ticker {0} not found in panel header")]
    MissingTicker(String),
    #[error("Line {line}: invalid date {value:?}")]
    BadDate { line: u64, value: String },
    #[error("Line {line}: dates must be strictly ascending ({date} follows {previous})")]
    Unsorted {
        line: u64,
        date: NaiveDate,
        previous: NaiveDate,
    },
    #[error("Line {line}: invalid close {value:?} for {ticker}")]
    BadPrice {
        line: u64,
        ticker: String,
        value: String,
    },
    #[error("Missing close for {ticker} on {date} after the first complete day")]
    Gap { date: NaiveDate, ticker: String },
    #[error("No complete trading day in the selected range")]
    NoCompleteDays,
    #[error("Invalid panel: {0}")]
    Panel(#[from] PanelError),
}

/// Which slice of the file to load
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadOptions {
    /// Columns to keep, in asset id order; empty keeps every column
    pub tickers: Vec<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl LoadOptions {
    pub fn with_tickers(mut self, tickers: Vec<String>) -> Self {
        self.tickers = tickers;
        self
    }

    pub fn with_range(mut self, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        self.start_date = Some(start_date);
        self.end_date = Some(end_date);
        self
    }

    fn contains(&self, date: NaiveDate) -> bool {
        self.start_date.map_or(true, |start| date >= start)
            && self.end_date.map_or(true, |end| date <= end)
    }
}

impl From<&Config> for LoadOptions {
    fn from(config: &Config) -> Self {
        LoadOptions::default()
            .with_tickers(config.run.tickers.clone())
            .with_range(config.run.start_date, config.run.end_date)
    }
}

/// Panel plus the calendar date of each day index
#[derive(Debug, Clone)]
pub struct LoadedPanel {
    pub panel: PricePanel,
    pub dates: Vec<NaiveDate>,
    /// Rows dropped before the first complete day
    pub skipped_leading: usize,
}

/// Load a panel from a CSV file on disk
pub fn load_panel<P: AsRef<Path>>(path: P, options: &LoadOptions) -> Result<LoadedPanel, LoadError> {
    let path = path.as_ref();
    tracing::info!("Loading price panel from {}", path.display());
    let file = std::fs::File::open(path)?;
    read_panel(file, options)
}

/// Load a panel from any CSV source
pub fn read_panel<R: io::Read>(source: R, options: &LoadOptions) -> Result<LoadedPanel, LoadError> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(source);

    let headers: Vec<String> = reader.headers()?.iter().map(String::from).collect();
    if headers.len() < 2 {
        return Err(LoadError::EmptyHeader);
    }

    let tickers: Vec<String> = if options.tickers.is_empty() {
        headers[1..].to_vec()
    } else {
        options.tickers.clone()
    };
    let columns = tickers
        .iter()
        .map(|ticker| {
            headers[1..]
                .iter()
                .position(|h| h == ticker)
                .map(|i| i + 1)
                .ok_or_else(|| LoadError::MissingTicker(ticker.clone()))
        })
        .collect::<Result<Vec<usize>, LoadError>>()?;

    let mut close: Vec<Vec<f64>> = vec![Vec::new(); tickers.len()];
    let mut dates = Vec::new();
    let mut previous: Option<NaiveDate> = None;
    let mut skipped_leading = 0;

    for result in reader.records() {
        let record = result?;
        let line = record.position().map_or(0, |p| p.line());

        let raw_date = record.get(0).unwrap_or_default();
        let date = NaiveDate::parse_from_str(raw_date, DATE_FORMAT).map_err(|_| LoadError::BadDate {
            line,
            value: raw_date.to_string(),
        })?;
        if let Some(previous) = previous {
            if date <= previous {
                return Err(LoadError::Unsorted { line, date, previous });
            }
        }
        previous = Some(date);

        if !options.contains(date) {
            continue;
        }

        let mut row = Vec::with_capacity(columns.len());
        let mut missing = None;
        for (ticker, &column) in tickers.iter().zip(&columns) {
            let raw = record.get(column).unwrap_or_default();
            if raw.is_empty() {
                missing.get_or_insert_with(|| ticker.clone());
                row.push(f64::NAN);
                continue;
            }
            let value: f64 = raw.parse().map_err(|_| LoadError::BadPrice {
                line,
                ticker: ticker.clone(),
                value: raw.to_string(),
            })?;
            row.push(value);
        }

        match missing {
            Some(_) if dates.is_empty() => {
                skipped_leading += 1;
            }
            Some(ticker) => return Err(LoadError::Gap { date, ticker }),
            None => {
                for (series, value) in close.iter_mut().zip(row) {
                    series.push(value);
                }
                dates.push(date);
            }
        }
    }

    if dates.is_empty() {
        return Err(LoadError::NoCompleteDays);
    }
    if skipped_leading > 0 {
        tracing::warn!(
            "Dropped {} leading rows with missing closes, day 0 is {}",
            skipped_leading,
            dates[0]
        );
    }

    let panel = PricePanel::new(tickers, close)?;
    tracing::info!(
        "Loaded {} assets x {} days ({} to {})",
        panel.num_assets(),
        panel.num_days(),
        dates[0],
        dates[dates.len() - 1]
    );

    Ok(LoadedPanel {
        panel,
        dates,
        skipped_leading,
    })
}

/// Write a panel in the same wide layout `read_panel` accepts
pub fn write_panel<W: io::Write>(
    sink: W,
    panel: &PricePanel,
    dates: &[NaiveDate],
) -> Result<(), LoadError> {
    let mut writer = csv::Writer::from_writer(sink);

    let mut header = vec!["date".to_string()];
    header.extend(panel.tickers().iter().cloned());
    writer.write_record(&header)?;

    for (day, date) in dates.iter().enumerate().take(panel.num_days()) {
        let mut row = vec![date.format(DATE_FORMAT).to_string()];
        for asset in 0..panel.num_assets() {
            row.push(format!("{:.6}", panel.close(asset, day)?));
        }
        writer.write_record(&row)?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = "\
date,AAA,BBB,CCC
2020-01-01,,20.0,30.0
2020-01-02,1.5,21.0,31.0
2020-01-03,1.6,22.0,32.0
2020-01-06,1.7,23.0,33.0
2020-01-07,1.8,24.0,34.0
";

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_read_all_columns_drops_incomplete_lead() {
        let loaded = read_panel(SAMPLE.as_bytes(), &LoadOptions::default()).unwrap();
        assert_eq!(loaded.skipped_leading, 1);
        assert_eq!(loaded.dates[0], date(2020, 1, 2));
        assert_eq!(loaded.panel.num_assets(), 3);
        assert_eq!(loaded.panel.num_days(), 4);
        assert_eq!(loaded.panel.close(0, 0).unwrap(), 1.5);
    }

    #[test]
    fn test_ticker_selection_and_order() {
        let options = LoadOptions::default().with_tickers(vec!["CCC".into(), "BBB".into()]);
        let loaded = read_panel(SAMPLE.as_bytes(), &options).unwrap();
        assert_eq!(loaded.panel.tickers(), &["CCC".to_string(), "BBB".to_string()]);
        // AAA's blank is ignored when AAA is not requested
        assert_eq!(loaded.skipped_leading, 0);
        assert_eq!(loaded.panel.close(0, 0).unwrap(), 30.0);
        assert_eq!(loaded.panel.close(1, 0).unwrap(), 20.0);
    }

    #[test]
    fn test_date_range_is_inclusive() {
        let options = LoadOptions::default().with_range(date(2020, 1, 3), date(2020, 1, 6));
        let loaded = read_panel(SAMPLE.as_bytes(), &options).unwrap();
        assert_eq!(loaded.dates, vec![date(2020, 1, 3), date(2020, 1, 6)]);
        assert_eq!(loaded.panel.close(2, 1).unwrap(), 33.0);
    }

    #[test]
    fn test_missing_ticker() {
        let options = LoadOptions::default().with_tickers(vec!["ZZZ".into()]);
        assert!(matches!(
            read_panel(SAMPLE.as_bytes(), &options),
            Err(LoadError::MissingTicker(t)) if t == "ZZZ"
        ));
    }

    #[test]
    fn test_gap_after_first_day_is_error() {
        let data = "date,AAA,BBB\n2020-01-01,1.0,2.0\n2020-01-02,,2.1\n";
        assert!(matches!(
            read_panel(data.as_bytes(), &LoadOptions::default()),
            Err(LoadError::Gap { ticker, .. }) if ticker == "AAA"
        ));
    }

    #[test]
    fn test_unsorted_dates() {
        let data = "date,AAA\n2020-01-02,1.0\n2020-01-01,2.0\n";
        assert!(matches!(
            read_panel(data.as_bytes(), &LoadOptions::default()),
            Err(LoadError::Unsorted { .. })
        ));
    }

    #[test]
    fn test_bad_values() {
        let data = "date,AAA\n2020-01-01,abc\n";
        assert!(matches!(
            read_panel(data.as_bytes(), &LoadOptions::default()),
            Err(LoadError::BadPrice { .. })
        ));

        let data = "date,AAA\n01/02/2020,1.0\n";
        assert!(matches!(
            read_panel(data.as_bytes(), &LoadOptions::default()),
            Err(LoadError::BadDate { .. })
        ));
    }

    #[test]
    fn test_empty_range() {
        let options = LoadOptions::default().with_range(date(2021, 1, 1), date(2021, 2, 1));
        assert!(matches!(
            read_panel(SAMPLE.as_bytes(), &options),
            Err(LoadError::NoCompleteDays)
        ));
    }

    #[test]
    fn test_write_then_load_file() {
        let panel = PricePanel::new(
            vec!["X".into(), "Y".into()],
            vec![vec![10.0, 10.5], vec![3.25, 3.5]],
        )
        .unwrap();
        let dates = vec![date(2021, 3, 1), date(2021, 3, 2)];

        let mut buffer = Vec::new();
        write_panel(&mut buffer, &panel, &dates).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.starts_with("date,X,Y\n2021-03-01,10.000000,3.250000\n"));

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(text.as_bytes()).unwrap();
        let loaded = load_panel(file.path(), &LoadOptions::default()).unwrap();
        assert_eq!(loaded.panel, panel);
        assert_eq!(loaded.dates, dates);
    }
}
