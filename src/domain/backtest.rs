//! Backtest engine and bar loop.
//!
//! Per bar, in order:
//! 1. stop-loss check (fills at the stop, skips the strategy for that bar)
//! 2. strategy signal: exit at close, or enter at close
//! 3. equity = cash + position marked at close
//!
//! A position still open after the last bar is closed at the final close
//! and recorded with `ExitReason::EndOfData`.

use tracing::debug;

use super::error::TesterError;
use super::execution::{check_stop_loss, enter_long, exit_position, EntryResult};
use super::ohlcv::{validate_bars, PriceBar};
use super::position::{ExitReason, Trade};
use super::state::{EquityPoint, SimulationState};
use super::strategy::{IndicatorSet, Signal, StrategyKind, StrategyParameters};

pub const DEFAULT_INITIAL_CASH: f64 = 10_000.0;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub initial_cash: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            initial_cash: DEFAULT_INITIAL_CASH,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub strategy: StrategyKind,
    pub initial_cash: f64,
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<EquityPoint>,
    pub final_state: SimulationState,
}

impl BacktestResult {
    pub fn final_equity(&self) -> f64 {
        self.equity_curve
            .last()
            .map(|p| p.equity)
            .unwrap_or(self.initial_cash)
    }

    pub fn profit(&self) -> f64 {
        self.final_equity() - self.initial_cash
    }
}

/// Validate `bars`, compute the indicators `kind` needs and simulate.
pub fn run_backtest(
    ticker: &str,
    bars: &[PriceBar],
    kind: StrategyKind,
    params: &StrategyParameters,
    config: &BacktestConfig,
) -> Result<BacktestResult, TesterError> {
    validate_bars(ticker, bars)?;
    let indicators = IndicatorSet::compute(kind, bars, params);
    let result = simulate(bars, kind, &indicators, params, config);
    debug!(
        ticker,
        strategy = %kind,
        trades = result.trades.len(),
        final_equity = result.final_equity(),
        "backtest finished"
    );
    Ok(result)
}

/// Run the bar loop over pre-computed indicators. `bars` must be non-empty.
pub fn simulate(
    bars: &[PriceBar],
    kind: StrategyKind,
    indicators: &IndicatorSet,
    params: &StrategyParameters,
    config: &BacktestConfig,
) -> BacktestResult {
    let mut state = SimulationState::new(config.initial_cash);
    let mut trades = Vec::new();
    let mut equity_curve = Vec::with_capacity(bars.len());

    for (i, bar) in bars.iter().enumerate() {
        let (next, closed) = step(&state.at_bar(i), bars, kind, indicators, params);
        if let Some(trade) = closed {
            trades.push(trade);
        }
        equity_curve.push(EquityPoint {
            timestamp: bar.timestamp,
            equity: next.equity(bar.close),
        });
        state = next;
    }

    if let Some(last) = bars.last() {
        let last_index = bars.len() - 1;
        if let Some((closed, trade)) =
            exit_position(&state, last, last_index, last.close, ExitReason::EndOfData)
        {
            trades.push(trade);
            state = closed;
        }
    }

    BacktestResult {
        strategy: kind,
        initial_cash: config.initial_cash,
        trades,
        equity_curve,
        final_state: state,
    }
}

/// Advance one bar. Returns the next state and the trade closed on this
/// bar, if any.
pub fn step(
    state: &SimulationState,
    bars: &[PriceBar],
    kind: StrategyKind,
    indicators: &IndicatorSet,
    params: &StrategyParameters,
) -> (SimulationState, Option<Trade>) {
    let i = state.bar_index;
    let bar = &bars[i];

    if let Some((next, trade)) = check_stop_loss(state, bar, i) {
        return (next, Some(trade));
    }

    match kind.evaluate(i, bars, indicators, params) {
        Signal::Hold => (state.clone(), None),
        Signal::Exit => match exit_position(state, bar, i, bar.close, ExitReason::Signal) {
            Some((next, trade)) => (next, Some(trade)),
            None => (state.clone(), None),
        },
        Signal::EnterLong { sizing, stop_loss } => {
            match enter_long(state, bar, i, sizing, stop_loss) {
                EntryResult::Entered { state: next, .. } => (next, None),
                EntryResult::AlreadyOpen => (state.clone(), None),
                rejected => {
                    debug!(bar = i, ?rejected, "entry rejected");
                    (state.clone(), None)
                }
            }
        }
    }
}
