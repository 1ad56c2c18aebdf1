//! CSV report adapter.
//!
//! Writes `results_<strategy>.csv` into the output directory, and on request
//! `plots/<ticker>_trades.csv` plus `plots/<ticker>_equity.csv` for an
//! external plotting tool.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::domain::batch::{BatchReport, TickerRow};
use crate::domain::error::TesterError;
use crate::domain::strategy::StrategyKind;
use crate::ports::report_port::ReportPort;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Serialize)]
struct ResultRecord<'a> {
    ticker: &'a str,
    #[serde(rename = "return")]
    return_pct: f64,
    #[serde(rename = "buy and hold return")]
    buy_and_hold_return_pct: f64,
    #[serde(rename = "Max. Drawdown [%]")]
    max_drawdown_pct: f64,
    #[serde(rename = "Avg. Drawdown [%]")]
    avg_drawdown_pct: f64,
    #[serde(rename = "Max. Drawdown Duration")]
    max_drawdown_duration: usize,
    #[serde(rename = "Avg. Drawdown Duration")]
    avg_drawdown_duration: f64,
    #[serde(rename = "Num Trades")]
    trade_count: usize,
    #[serde(rename = "Win Rate [%]")]
    win_rate_pct: f64,
    #[serde(rename = "Best Trade [%]")]
    best_trade_pct: f64,
    #[serde(rename = "Worst Trade [%]")]
    worst_trade_pct: f64,
    #[serde(rename = "Avg. Trade [%]")]
    avg_trade_pct: f64,
    #[serde(rename = "Max. Trade Duration")]
    max_trade_duration: usize,
    #[serde(rename = "Avg. Trade Duration")]
    avg_trade_duration: f64,
    plot_path: &'a str,
}

impl<'a> From<&'a TickerRow> for ResultRecord<'a> {
    fn from(row: &'a TickerRow) -> Self {
        let s = &row.stats;
        ResultRecord {
            ticker: &row.ticker,
            return_pct: s.return_pct,
            buy_and_hold_return_pct: s.buy_and_hold_return_pct,
            max_drawdown_pct: s.max_drawdown_pct,
            avg_drawdown_pct: s.avg_drawdown_pct,
            max_drawdown_duration: s.max_drawdown_duration,
            avg_drawdown_duration: s.avg_drawdown_duration,
            trade_count: s.trade_count,
            win_rate_pct: s.win_rate_pct,
            best_trade_pct: s.best_trade_pct,
            worst_trade_pct: s.worst_trade_pct,
            avg_trade_pct: s.avg_trade_pct,
            max_trade_duration: s.max_trade_duration,
            avg_trade_duration: s.avg_trade_duration,
            plot_path: row.plot_path.as_deref().unwrap_or(""),
        }
    }
}

#[derive(Debug, Serialize)]
struct TradeRecord {
    entry_bar: usize,
    exit_bar: usize,
    entry_time: String,
    exit_time: String,
    entry_price: f64,
    exit_price: f64,
    size: f64,
    pnl: f64,
    pnl_pct: f64,
    duration_bars: usize,
    exit_reason: String,
}

#[derive(Debug, Serialize)]
struct EquityRecord {
    timestamp: String,
    equity: f64,
    buy_and_hold_equity: Option<f64>,
}

pub struct CsvReportAdapter {
    output_dir: PathBuf,
}

impl CsvReportAdapter {
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }

    pub fn results_path(&self, strategy: StrategyKind) -> PathBuf {
        self.output_dir.join(format!("results_{}.csv", strategy.id()))
    }

    fn plots_dir(&self) -> PathBuf {
        self.output_dir.join("plots")
    }
}

fn write_records<T: Serialize>(
    path: &Path,
    records: impl IntoIterator<Item = T>,
) -> Result<(), TesterError> {
    let mut writer = csv::Writer::from_path(path).map_err(io::Error::from)?;
    for record in records {
        writer.serialize(record).map_err(io::Error::from)?;
    }
    writer.flush()?;
    Ok(())
}

impl ReportPort for CsvReportAdapter {
    fn write_results(
        &self,
        report: &BatchReport,
        strategy: StrategyKind,
    ) -> Result<String, TesterError> {
        fs::create_dir_all(&self.output_dir)?;
        let path = self.results_path(strategy);
        write_records(&path, report.rows.iter().map(ResultRecord::from))?;
        Ok(path.display().to_string())
    }

    fn write_artifacts(&self, row: &TickerRow) -> Result<String, TesterError> {
        let dir = self.plots_dir();
        fs::create_dir_all(&dir)?;

        let trades_path = dir.join(format!("{}_trades.csv", row.ticker));
        write_records(
            &trades_path,
            row.result.trades.iter().map(|t| TradeRecord {
                entry_bar: t.entry_bar_index,
                exit_bar: t.exit_bar_index,
                entry_time: t.entry_time.format(TIMESTAMP_FORMAT).to_string(),
                exit_time: t.exit_time.format(TIMESTAMP_FORMAT).to_string(),
                entry_price: t.entry_price,
                exit_price: t.exit_price,
                size: t.size,
                pnl: t.pnl,
                pnl_pct: t.pnl_pct,
                duration_bars: t.duration_bars,
                exit_reason: t.exit_reason.to_string(),
            }),
        )?;

        let equity_path = dir.join(format!("{}_equity.csv", row.ticker));
        let baseline = &row.buy_and_hold.equity_curve;
        write_records(
            &equity_path,
            row.result
                .equity_curve
                .iter()
                .enumerate()
                .map(|(i, p)| EquityRecord {
                    timestamp: p.timestamp.format(TIMESTAMP_FORMAT).to_string(),
                    equity: p.equity,
                    buy_and_hold_equity: baseline.get(i).map(|b| b.equity),
                }),
        )?;

        Ok(trades_path.display().to_string())
    }
}
