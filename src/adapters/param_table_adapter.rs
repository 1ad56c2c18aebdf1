//! Optimized-parameter table loader.
//!
//! A CSV with a `ticker` column followed by any subset of the strategy
//! parameter columns. Empty cells keep the default value.

use std::fs;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::domain::error::TesterError;
use crate::domain::indicator::Smoothing;
use crate::domain::param_table::{ParamOverrides, ParameterTable};
use crate::domain::strategy::StrategyParameters;

/// Window columns are read as floats because tables written by dataframe
/// tools often store them as `14.0`.
#[derive(Debug, Deserialize)]
struct ParamRow {
    ticker: String,
    #[serde(default)]
    bb_window: Option<f64>,
    #[serde(default)]
    rsi_window: Option<f64>,
    #[serde(default)]
    rsi_smooth_window: Option<f64>,
    #[serde(default)]
    rsi_upper_thres: Option<f64>,
    #[serde(default)]
    rsi_lower_thres: Option<f64>,
    #[serde(default, alias = "macd_fast_ma_length")]
    macd_fast: Option<f64>,
    #[serde(default, alias = "macd_slow_ma_length")]
    macd_slow: Option<f64>,
    #[serde(default, alias = "macd_signal_ma_length")]
    macd_signal: Option<f64>,
    #[serde(default)]
    macd_source_smoothing: Option<String>,
    #[serde(default)]
    macd_signal_smoothing: Option<String>,
    #[serde(default)]
    rsi_signal_smoothing: Option<String>,
    #[serde(default)]
    position_size: Option<f64>,
    #[serde(default)]
    stop_loss_pct: Option<f64>,
}

impl ParamRow {
    fn overrides(&self, row: usize) -> Result<ParamOverrides, TesterError> {
        Ok(ParamOverrides {
            bb_window: window(self.bb_window, "bb_window", row)?,
            rsi_window: window(self.rsi_window, "rsi_window", row)?,
            rsi_smooth_window: window(self.rsi_smooth_window, "rsi_smooth_window", row)?,
            rsi_upper_thres: self.rsi_upper_thres,
            rsi_lower_thres: self.rsi_lower_thres,
            macd_fast: window(self.macd_fast, "macd_fast", row)?,
            macd_slow: window(self.macd_slow, "macd_slow", row)?,
            macd_signal: window(self.macd_signal, "macd_signal", row)?,
            macd_source_smoothing: smoothing(&self.macd_source_smoothing, row)?,
            macd_signal_smoothing: smoothing(&self.macd_signal_smoothing, row)?,
            rsi_signal_smoothing: smoothing(&self.rsi_signal_smoothing, row)?,
            position_size: self.position_size,
            stop_loss_pct: self.stop_loss_pct,
        })
    }
}

fn window(value: Option<f64>, key: &str, row: usize) -> Result<Option<usize>, TesterError> {
    match value {
        None => Ok(None),
        Some(v) if v.is_finite() && v >= 0.0 && v.fract() == 0.0 => Ok(Some(v as usize)),
        Some(v) => Err(TesterError::ParamTable {
            row,
            reason: format!("{key} must be a whole number, got {v}"),
        }),
    }
}

fn smoothing(value: &Option<String>, row: usize) -> Result<Option<Smoothing>, TesterError> {
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s
            .parse::<Smoothing>()
            .map(Some)
            .map_err(|reason| TesterError::ParamTable { row, reason }),
    }
}

/// Parse a parameter table. Rows are numbered from 1, excluding the header.
pub fn parse_parameter_table<R: Read>(
    reader: R,
    defaults: &StrategyParameters,
) -> Result<ParameterTable, TesterError> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut table = ParameterTable::new();

    for (i, result) in rdr.deserialize::<ParamRow>().enumerate() {
        let row = i + 1;
        let record = result.map_err(|e| TesterError::ParamTable {
            row,
            reason: e.to_string(),
        })?;
        let ticker = record.ticker.trim();
        if ticker.is_empty() {
            return Err(TesterError::ParamTable {
                row,
                reason: "empty ticker".to_string(),
            });
        }
        if table.get(ticker).is_some() {
            return Err(TesterError::ParamTable {
                row,
                reason: format!("duplicate ticker {ticker}"),
            });
        }
        let params = record.overrides(row)?.apply(defaults);
        table.insert(ticker, params);
    }

    Ok(table)
}

/// Load the table at `path`. A missing file yields an empty table.
pub fn load_parameter_table(
    path: &Path,
    defaults: &StrategyParameters,
) -> Result<ParameterTable, TesterError> {
    if !path.exists() {
        info!(
            path = %path.display(),
            "optimized parameters not found, using default parameter values"
        );
        return Ok(ParameterTable::new());
    }
    let file = fs::File::open(path)?;
    let table = parse_parameter_table(file, defaults)?;
    info!(path = %path.display(), tickers = table.len(), "using optimized parameters");
    Ok(table)
}
