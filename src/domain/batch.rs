//! Multi-ticker batch runs.
//!
//! Tickers are independent, so each one is loaded, backtested and reduced to
//! a [`TickerRow`] on a worker of a dedicated rayon pool. Results are
//! collected in input order. A ticker whose data cannot be used is recorded
//! as a [`SkippedTicker`] and the batch continues.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use super::backtest::{run_backtest, BacktestConfig, BacktestResult};
use super::error::TesterError;
use super::metrics::{total_return_pct, PerformanceStats};
use super::ohlcv::PriceBar;
use super::param_table::ParameterTable;
use super::strategy::{StrategyKind, StrategyParameters};
use crate::ports::data_port::DataPort;

#[derive(Debug, Clone, Default)]
pub struct BatchConfig {
    pub backtest: BacktestConfig,
    /// Worker threads. `None` uses the available parallelism.
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TickerRow {
    pub ticker: String,
    pub stats: PerformanceStats,
    pub result: BacktestResult,
    pub buy_and_hold: BacktestResult,
    /// Location of the plotting artifacts, once written.
    pub plot_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedTicker {
    pub ticker: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    NoData,
    InvalidData(String),
    LoadFailed(String),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::NoData => write!(f, "no data"),
            SkipReason::InvalidData(reason) => write!(f, "invalid data: {reason}"),
            SkipReason::LoadFailed(reason) => write!(f, "load failed: {reason}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport {
    pub strategy: StrategyKind,
    pub rows: Vec<TickerRow>,
    pub skipped: Vec<SkippedTicker>,
    pub total_strategy_profit: f64,
    pub total_buy_and_hold_profit: f64,
}

impl BatchReport {
    pub fn from_outcomes(
        strategy: StrategyKind,
        outcomes: Vec<Result<TickerRow, SkippedTicker>>,
    ) -> Self {
        let mut rows = Vec::new();
        let mut skipped = Vec::new();
        for outcome in outcomes {
            match outcome {
                Ok(row) => rows.push(row),
                Err(skip) => skipped.push(skip),
            }
        }
        let total_strategy_profit = rows.iter().map(|r| r.result.profit()).sum();
        let total_buy_and_hold_profit = rows.iter().map(|r| r.buy_and_hold.profit()).sum();
        BatchReport {
            strategy,
            rows,
            skipped,
            total_strategy_profit,
            total_buy_and_hold_profit,
        }
    }
}

/// Pick `count` tickers at random. The same `seed` always picks the same
/// tickers; without one the pick is seeded from entropy. Asking for at least
/// as many tickers as exist returns all of them. The result is sorted.
pub fn sample_tickers(tickers: &[String], count: usize, seed: Option<u64>) -> Vec<String> {
    let mut picked: Vec<String> = if count >= tickers.len() {
        tickers.to_vec()
    } else {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        tickers.choose_multiple(&mut rng, count).cloned().collect()
    };
    picked.sort();
    picked
}

/// Backtest one ticker's bars with `kind` and with the BuyAndHold baseline.
pub fn evaluate_ticker(
    ticker: &str,
    bars: &[PriceBar],
    kind: StrategyKind,
    params: &StrategyParameters,
    config: &BacktestConfig,
) -> Result<TickerRow, TesterError> {
    let result = run_backtest(ticker, bars, kind, params, config)?;
    let buy_and_hold = run_backtest(ticker, bars, StrategyKind::BuyAndHold, params, config)?;
    let stats = PerformanceStats::compute(&result, total_return_pct(&buy_and_hold));
    Ok(TickerRow {
        ticker: ticker.to_string(),
        stats,
        result,
        buy_and_hold,
        plot_path: None,
    })
}

/// Load and evaluate one ticker, turning data problems into a skip.
pub fn run_ticker(
    data_port: &dyn DataPort,
    ticker: &str,
    kind: StrategyKind,
    params: &StrategyParameters,
    config: &BacktestConfig,
) -> Result<TickerRow, SkippedTicker> {
    let skip = |reason: SkipReason| {
        warn!(ticker, %reason, "skipping ticker");
        SkippedTicker {
            ticker: ticker.to_string(),
            reason,
        }
    };

    let bars = data_port.fetch_bars(ticker).map_err(|e| match e {
        TesterError::EmptyData { .. } => skip(SkipReason::NoData),
        TesterError::InvalidData { reason, .. } => skip(SkipReason::InvalidData(reason)),
        other => skip(SkipReason::LoadFailed(other.to_string())),
    })?;

    evaluate_ticker(ticker, &bars, kind, params, config).map_err(|e| match e {
        TesterError::EmptyData { .. } => skip(SkipReason::NoData),
        other => skip(SkipReason::InvalidData(other.to_string())),
    })
}

/// Run `kind` over every ticker. Per-ticker parameters come from `table`,
/// falling back to `defaults`.
pub fn run_batch(
    data_port: &dyn DataPort,
    tickers: &[String],
    kind: StrategyKind,
    table: &ParameterTable,
    defaults: &StrategyParameters,
    config: &BatchConfig,
) -> Result<BatchReport, TesterError> {
    let workers = config.workers.unwrap_or_else(|| {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    });
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("tester-batch-{i}"))
        .build()
        .map_err(|e| TesterError::ConfigInvalid {
            section: "batch".to_string(),
            key: "workers".to_string(),
            reason: e.to_string(),
        })?;

    info!(tickers = tickers.len(), workers, strategy = %kind, "starting batch");

    let outcomes: Vec<Result<TickerRow, SkippedTicker>> = pool.install(|| {
        tickers
            .par_iter()
            .map(|ticker| {
                let params = table.resolve(ticker, defaults);
                let outcome = run_ticker(data_port, ticker, kind, params, &config.backtest);
                if let Ok(row) = &outcome {
                    debug!(
                        ticker = ticker.as_str(),
                        return_pct = row.stats.return_pct,
                        trades = row.stats.trade_count,
                        "ticker done"
                    );
                }
                outcome
            })
            .collect()
    });

    let report = BatchReport::from_outcomes(kind, outcomes);
    info!(
        evaluated = report.rows.len(),
        skipped = report.skipped.len(),
        "batch finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::collections::HashMap;

    struct MapDataPort {
        data: HashMap<String, Vec<PriceBar>>,
    }

    impl DataPort for MapDataPort {
        fn fetch_bars(&self, ticker: &str) -> Result<Vec<PriceBar>, TesterError> {
            self.data
                .get(ticker)
                .cloned()
                .ok_or_else(|| TesterError::DataSource {
                    reason: format!("no file for {ticker}"),
                })
        }

        fn list_tickers(&self) -> Result<Vec<String>, TesterError> {
            let mut tickers: Vec<String> = self.data.keys().cloned().collect();
            tickers.sort();
            Ok(tickers)
        }
    }

    fn make_bars(prices: &[f64]) -> Vec<PriceBar> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        prices
            .iter()
            .enumerate()
            .map(|(i, &close)| PriceBar {
                timestamp: start + chrono::Duration::days(i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1000.0,
            })
            .collect()
    }

    fn port() -> MapDataPort {
        let mut data = HashMap::new();
        data.insert("UP".to_string(), make_bars(&[10.0, 11.0, 12.0, 13.0]));
        data.insert("FLAT".to_string(), make_bars(&[20.0; 4]));
        data.insert("EMPTY".to_string(), Vec::new());
        MapDataPort { data }
    }

    #[test]
    fn evaluate_ticker_includes_buy_and_hold() {
        let bars = make_bars(&[10.0, 11.0, 12.0]);
        let row = evaluate_ticker(
            "UP",
            &bars,
            StrategyKind::SimpleMovingAverage,
            &StrategyParameters::default(),
            &BacktestConfig::default(),
        )
        .unwrap();
        assert_eq!(row.stats.trade_count, 0);
        assert!((row.stats.return_pct - 0.0).abs() < f64::EPSILON);
        assert!((row.stats.buy_and_hold_return_pct - 20.0).abs() < 1e-9);
        assert!(row.plot_path.is_none());
    }

    #[test]
    fn batch_skips_empty_and_missing() {
        let tickers: Vec<String> = ["UP", "EMPTY", "FLAT", "MISSING"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let report = run_batch(
            &port(),
            &tickers,
            StrategyKind::BuyAndHold,
            &ParameterTable::default(),
            &StrategyParameters::default(),
            &BatchConfig {
                workers: Some(2),
                ..Default::default()
            },
        )
        .unwrap();

        let evaluated: Vec<&str> = report.rows.iter().map(|r| r.ticker.as_str()).collect();
        assert_eq!(evaluated, vec!["UP", "FLAT"]);
        assert_eq!(report.skipped.len(), 2);
        assert_eq!(report.skipped[0].ticker, "EMPTY");
        assert_eq!(report.skipped[0].reason, SkipReason::NoData);
        assert_eq!(report.skipped[1].ticker, "MISSING");
        assert!(matches!(report.skipped[1].reason, SkipReason::LoadFailed(_)));
    }

    #[test]
    fn batch_totals_profit() {
        let tickers = vec!["UP".to_string(), "FLAT".to_string()];
        let report = run_batch(
            &port(),
            &tickers,
            StrategyKind::BuyAndHold,
            &ParameterTable::default(),
            &StrategyParameters::default(),
            &BatchConfig::default(),
        )
        .unwrap();
        // UP: 1000 units from 10 to 13; FLAT: unchanged
        assert!((report.total_strategy_profit - 3_000.0).abs() < 1e-9);
        assert!((report.total_buy_and_hold_profit - 3_000.0).abs() < 1e-9);
    }

    #[test]
    fn sample_is_seeded_and_sorted() {
        let tickers: Vec<String> = (0..50).map(|i| format!("T{i:02}")).collect();
        let a = sample_tickers(&tickers, 10, Some(42));
        let b = sample_tickers(&tickers, 10, Some(42));
        assert_eq!(a, b);
        assert_eq!(a.len(), 10);
        assert!(a.windows(2).all(|w| w[0] < w[1]));
        assert!(a.iter().all(|t| tickers.contains(t)));
    }

    #[test]
    fn sample_larger_than_universe_returns_all() {
        let tickers = vec!["B".to_string(), "A".to_string()];
        assert_eq!(sample_tickers(&tickers, 500, None), vec!["A", "B"]);
    }

    #[test]
    fn skip_reason_display() {
        assert_eq!(SkipReason::NoData.to_string(), "no data");
        assert_eq!(
            SkipReason::InvalidData("bad".into()).to_string(),
            "invalid data: bad"
        );
    }
}
