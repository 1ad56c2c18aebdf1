//! Performance statistics for a single backtest run.
//!
//! Percentages are expressed as 0..100 values (`12.5` means 12.5%), and
//! durations are counted in bars.

use super::backtest::BacktestResult;
use super::position::Trade;

#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceStats {
    pub return_pct: f64,
    pub buy_and_hold_return_pct: f64,
    pub max_drawdown_pct: f64,
    pub avg_drawdown_pct: f64,
    pub max_drawdown_duration: usize,
    pub avg_drawdown_duration: f64,
    pub trade_count: usize,
    pub win_rate_pct: f64,
    pub best_trade_pct: f64,
    pub worst_trade_pct: f64,
    pub avg_trade_pct: f64,
    pub max_trade_duration: usize,
    pub avg_trade_duration: f64,
    pub equity_final: f64,
    pub equity_peak: f64,
    pub exposure_pct: f64,
    pub profit_factor: f64,
}

/// A peak-to-recovery stretch of the equity curve.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawdownPeriod {
    pub peak_index: usize,
    /// Bar where equity got back to the peak, or the last bar.
    pub end_index: usize,
    /// Deepest drawdown reached within the period, ≤ 0.
    pub depth_pct: f64,
}

impl DrawdownPeriod {
    pub fn duration(&self) -> usize {
        self.end_index - self.peak_index
    }
}

impl PerformanceStats {
    /// Reduce a run to summary statistics. `buy_and_hold_return_pct` comes
    /// from a BuyAndHold run over the same bars and cash.
    pub fn compute(result: &BacktestResult, buy_and_hold_return_pct: f64) -> Self {
        let equity: Vec<f64> = result.equity_curve.iter().map(|p| p.equity).collect();
        let equity_final = result.final_equity();
        let equity_peak = equity.iter().copied().fold(result.initial_cash, f64::max);

        let dd = drawdown_series(&equity);
        let max_drawdown_pct = dd.iter().copied().fold(0.0, f64::min);
        let periods = drawdown_periods(&equity);
        let avg_drawdown_pct = mean(periods.iter().map(|p| p.depth_pct));
        let max_drawdown_duration = periods.iter().map(DrawdownPeriod::duration).max().unwrap_or(0);
        let avg_drawdown_duration = mean(periods.iter().map(|p| p.duration() as f64));

        let trades = &result.trades;
        let trade_count = trades.len();
        let (win_rate_pct, best_trade_pct, worst_trade_pct, avg_trade_pct) = if trades.is_empty() {
            (0.0, 0.0, 0.0, 0.0)
        } else {
            let wins = trades.iter().filter(|t| t.pnl_pct > 0.0).count();
            (
                wins as f64 / trade_count as f64 * 100.0,
                trades.iter().map(|t| t.pnl_pct).fold(f64::NEG_INFINITY, f64::max),
                trades.iter().map(|t| t.pnl_pct).fold(f64::INFINITY, f64::min),
                mean(trades.iter().map(|t| t.pnl_pct)),
            )
        };
        let max_trade_duration = trades.iter().map(|t| t.duration_bars).max().unwrap_or(0);
        let avg_trade_duration = mean(trades.iter().map(|t| t.duration_bars as f64));

        PerformanceStats {
            return_pct: total_return_pct(result),
            buy_and_hold_return_pct,
            max_drawdown_pct,
            avg_drawdown_pct,
            max_drawdown_duration,
            avg_drawdown_duration,
            trade_count,
            win_rate_pct,
            best_trade_pct,
            worst_trade_pct,
            avg_trade_pct,
            max_trade_duration,
            avg_trade_duration,
            equity_final,
            equity_peak,
            exposure_pct: exposure_pct(trades, equity.len()),
            profit_factor: profit_factor(trades),
        }
    }
}

pub fn total_return_pct(result: &BacktestResult) -> f64 {
    if result.initial_cash > 0.0 {
        (result.final_equity() / result.initial_cash - 1.0) * 100.0
    } else {
        0.0
    }
}

/// Percentage distance of each equity value below its running maximum.
/// Every entry is ≤ 0.
pub fn drawdown_series(equity: &[f64]) -> Vec<f64> {
    let mut running_max = f64::NEG_INFINITY;
    equity
        .iter()
        .map(|&e| {
            running_max = running_max.max(e);
            if running_max > 0.0 {
                ((e - running_max) / running_max * 100.0).min(0.0)
            } else {
                0.0
            }
        })
        .collect()
}

pub fn drawdown_periods(equity: &[f64]) -> Vec<DrawdownPeriod> {
    let dd = drawdown_series(equity);
    let mut periods = Vec::new();
    let mut peak_index = 0;
    let mut peak = f64::NEG_INFINITY;
    let mut open: Option<DrawdownPeriod> = None;

    for (i, (&e, &d)) in equity.iter().zip(&dd).enumerate() {
        if e >= peak {
            if let Some(mut period) = open.take() {
                period.end_index = i;
                periods.push(period);
            }
            peak = e;
            peak_index = i;
            continue;
        }
        match open.as_mut() {
            Some(period) => period.depth_pct = period.depth_pct.min(d),
            None => {
                open = Some(DrawdownPeriod {
                    peak_index,
                    end_index: i,
                    depth_pct: d,
                })
            }
        }
    }

    if let Some(mut period) = open {
        period.end_index = equity.len() - 1;
        periods.push(period);
    }
    periods
}

/// Share of bars during which a position was held.
fn exposure_pct(trades: &[Trade], bar_count: usize) -> f64 {
    if bar_count == 0 {
        return 0.0;
    }
    let held: usize = trades
        .iter()
        .map(|t| t.exit_bar_index.saturating_sub(t.entry_bar_index) + 1)
        .sum();
    (held.min(bar_count) as f64 / bar_count as f64) * 100.0
}

fn profit_factor(trades: &[Trade]) -> f64 {
    let gross_win: f64 = trades.iter().filter(|t| t.pnl > 0.0).map(|t| t.pnl).sum();
    let gross_loss: f64 = trades.iter().filter(|t| t.pnl < 0.0).map(|t| -t.pnl).sum();
    if gross_loss > 0.0 {
        gross_win / gross_loss
    } else if gross_win > 0.0 {
        f64::INFINITY
    } else {
        0.0
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 { 0.0 } else { sum / n as f64 }
}
