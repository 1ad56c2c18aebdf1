#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use strategy_tester::domain::error::TesterError;
pub use strategy_tester::domain::ohlcv::PriceBar;
use strategy_tester::ports::data_port::DataPort;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<PriceBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, ticker: &str, bars: Vec<PriceBar>) -> Self {
        self.data.insert(ticker.to_string(), bars);
        self
    }

    pub fn with_error(mut self, ticker: &str, reason: &str) -> Self {
        self.errors.insert(ticker.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_bars(&self, ticker: &str) -> Result<Vec<PriceBar>, TesterError> {
        if let Some(reason) = self.errors.get(ticker) {
            return Err(TesterError::DataSource {
                reason: reason.clone(),
            });
        }
        Ok(self.data.get(ticker).cloned().unwrap_or_default())
    }

    fn list_tickers(&self) -> Result<Vec<String>, TesterError> {
        let mut tickers: Vec<String> = self.data.keys().cloned().collect();
        tickers.sort();
        Ok(tickers)
    }
}

pub fn day(i: usize) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        + chrono::Duration::days(i as i64)
}

/// Bars with open = high = low = close.
pub fn make_bars(closes: &[f64]) -> Vec<PriceBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| PriceBar {
            timestamp: day(i),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1_000.0,
        })
        .collect()
}

/// `n` closes moving linearly from `start` to `end` inclusive.
pub fn linear_closes(start: f64, end: f64, n: usize) -> Vec<f64> {
    if n < 2 {
        return vec![start; n];
    }
    (0..n)
        .map(|i| start + (end - start) * i as f64 / (n - 1) as f64)
        .collect()
}

/// A wavy series that dips through its lower band and rallies through its
/// upper band a few times.
pub fn oscillating_closes(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| {
            let t = i as f64;
            50.0 + 8.0 * (t / 6.0).sin() + 3.0 * (t / 2.5).cos()
        })
        .collect()
}

/// Write `history_stock_<ticker>.csv` with a daily `date` column.
pub fn write_history_csv(dir: &Path, ticker: &str, closes: &[f64]) {
    let mut content = String::from("date,code,open,high,low,close,volume,amount,adjust_flag\n");
    for (i, close) in closes.iter().enumerate() {
        content.push_str(&format!(
            "{},{},{c},{c},{c},{c},1000,{},3\n",
            day(i).format("%Y-%m-%d"),
            ticker,
            close * 1000.0,
            c = close,
        ));
    }
    fs::write(dir.join(format!("history_stock_{ticker}.csv")), content).unwrap();
}
