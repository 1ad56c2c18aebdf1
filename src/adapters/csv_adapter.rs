//! CSV price-history adapter.
//!
//! Reads `<base>/history_stock_<TICKER>.csv`. Columns are matched by header
//! name; `time`, `code`, `amount` and `adjust_flag` are optional. Rows must
//! already be in strictly increasing time order.

use crate::domain::error::TesterError;
use crate::domain::ohlcv::{validate_bars, PriceBar};
use crate::ports::data_port::DataPort;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

const FILE_PREFIX: &str = "history_stock_";
const FILE_SUFFIX: &str = ".csv";

#[derive(Debug, Deserialize)]
struct HistoryRecord {
    date: String,
    #[serde(default)]
    time: Option<String>,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    #[serde(default)]
    volume: Option<f64>,
}

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, ticker: &str) -> PathBuf {
        self.base_path
            .join(format!("{FILE_PREFIX}{ticker}{FILE_SUFFIX}"))
    }
}

/// Ticker encoded in a history file name, if the name follows the pattern.
pub fn ticker_from_file_name(name: &str) -> Option<&str> {
    name.strip_prefix(FILE_PREFIX)?
        .strip_suffix(FILE_SUFFIX)
        .filter(|t| !t.is_empty())
}

/// `time` (YYYYMMDDHHMMSS with optional milliseconds) wins over `date`.
fn parse_timestamp(date: &str, time: Option<&str>) -> Result<NaiveDateTime, String> {
    if let Some(time) = time.map(str::trim).filter(|t| !t.is_empty()) {
        let head = time.get(..14).ok_or_else(|| format!("invalid time '{time}'"))?;
        return NaiveDateTime::parse_from_str(head, "%Y%m%d%H%M%S")
            .map_err(|e| format!("invalid time '{time}': {e}"));
    }
    let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .map_err(|e| format!("invalid date '{date}': {e}"))?;
    Ok(date.and_time(chrono::NaiveTime::MIN))
}

impl DataPort for CsvAdapter {
    fn fetch_bars(&self, ticker: &str) -> Result<Vec<PriceBar>, TesterError> {
        let path = self.csv_path(ticker);
        let content = fs::read_to_string(&path).map_err(|e| TesterError::DataSource {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for (line, result) in rdr.deserialize::<HistoryRecord>().enumerate() {
            let record = result.map_err(|e| TesterError::InvalidData {
                ticker: ticker.to_string(),
                reason: format!("CSV parse error: {}", e),
            })?;
            let timestamp = parse_timestamp(&record.date, record.time.as_deref()).map_err(
                |reason| TesterError::InvalidData {
                    ticker: ticker.to_string(),
                    reason: format!("row {}: {}", line + 1, reason),
                },
            )?;

            bars.push(PriceBar {
                timestamp,
                open: record.open,
                high: record.high,
                low: record.low,
                close: record.close,
                volume: record.volume.unwrap_or(0.0),
            });
        }

        // rows keep file order; out-of-order or duplicate timestamps are rejected
        if !bars.is_empty() {
            validate_bars(ticker, &bars)?;
        }
        Ok(bars)
    }

    fn list_tickers(&self) -> Result<Vec<String>, TesterError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| TesterError::DataSource {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut tickers = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| TesterError::DataSource {
                reason: format!("directory entry error: {}", e),
            })?;
            let name = entry.file_name();
            if let Some(ticker) = ticker_from_file_name(&name.to_string_lossy()) {
                tickers.push(ticker.to_string());
            }
        }

        tickers.sort();
        Ok(tickers)
    }
}
