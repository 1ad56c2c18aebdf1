//! Strategy variants, parameters and per-bar signal evaluation.
//!
//! Each variant is a two-state machine (flat / long). `evaluate` only says
//! what the strategy would like to do on a bar; the simulator decides whether
//! the request is honoured.

use std::fmt;
use std::str::FromStr;

use crate::domain::error::TesterError;
use crate::domain::indicator::{
    calculate_bollinger, calculate_macd, calculate_rsi, BollingerBands, IndicatorSeries, Macd,
    Rsi, Smoothing,
};
use crate::domain::indicator::bollinger::DEFAULT_MULT_X100;
use crate::domain::ohlcv::PriceBar;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    BuyAndHold,
    MacdCross,
    BollingerRsi,
    SimpleMovingAverage,
}

impl StrategyKind {
    /// Short identifier used on the command line and in output file names.
    pub fn id(&self) -> &'static str {
        match self {
            StrategyKind::BuyAndHold => "bnh",
            StrategyKind::MacdCross => "macd",
            StrategyKind::BollingerRsi => "bb",
            StrategyKind::SimpleMovingAverage => "sma",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            StrategyKind::BuyAndHold => "Buy And Hold",
            StrategyKind::MacdCross => "MACD Cross",
            StrategyKind::BollingerRsi => "Bollinger Bands + RSI",
            StrategyKind::SimpleMovingAverage => "Simple Moving Average",
        }
    }

    /// Decide what to do on `bar_index`.
    pub fn evaluate(
        &self,
        bar_index: usize,
        bars: &[PriceBar],
        indicators: &IndicatorSet,
        params: &StrategyParameters,
    ) -> Signal {
        match self {
            StrategyKind::BuyAndHold => {
                if bar_index == 0 {
                    Signal::EnterLong {
                        sizing: Sizing::AllCash,
                        stop_loss: None,
                    }
                } else {
                    Signal::Hold
                }
            }
            StrategyKind::MacdCross => {
                let Some(macd) = &indicators.macd else {
                    return Signal::Hold;
                };
                let Some(line) = macd.line.get(bar_index) else {
                    return Signal::Hold;
                };
                if crossover(&macd.line, &macd.signal, bar_index) && line <= 0.0 {
                    Signal::EnterLong {
                        sizing: Sizing::Units(params.position_size),
                        stop_loss: None,
                    }
                } else if crossover(&macd.signal, &macd.line, bar_index) && line > 0.0 {
                    Signal::Exit
                } else {
                    Signal::Hold
                }
            }
            StrategyKind::BollingerRsi => {
                let (Some(bands), Some(rsi)) = (&indicators.bollinger, &indicators.rsi) else {
                    return Signal::Hold;
                };
                let close = bars[bar_index].close;
                let (Some(lower), Some(upper), Some(rsi_signal)) = (
                    bands.lower.get(bar_index),
                    bands.upper.get(bar_index),
                    rsi.signal.get(bar_index),
                ) else {
                    return Signal::Hold;
                };

                if close < lower && rsi_signal < params.rsi_lower_thres {
                    Signal::EnterLong {
                        sizing: Sizing::Units(params.position_size),
                        stop_loss: Some(close * (1.0 - params.stop_loss_pct / 100.0)),
                    }
                } else if close > upper && rsi_signal > params.rsi_upper_thres {
                    Signal::Exit
                } else {
                    Signal::Hold
                }
            }
            StrategyKind::SimpleMovingAverage => Signal::Hold,
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl FromStr for StrategyKind {
    type Err = TesterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bnh" | "buy_and_hold" | "buyandhold" => Ok(StrategyKind::BuyAndHold),
            "macd" | "macd_cross" | "macdcross" => Ok(StrategyKind::MacdCross),
            "bb" | "bollinger_rsi" | "bollingerrsi" => Ok(StrategyKind::BollingerRsi),
            "sma" | "simple_moving_average" | "simplemovingaverage" => {
                Ok(StrategyKind::SimpleMovingAverage)
            }
            _ => Err(TesterError::UnknownStrategy(s.to_string())),
        }
    }
}

/// Tunable numbers for every variant. Each variant reads only its own fields.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyParameters {
    pub bb_window: usize,
    pub rsi_window: usize,
    pub rsi_smooth_window: usize,
    pub rsi_upper_thres: f64,
    pub rsi_lower_thres: f64,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub macd_source_smoothing: Smoothing,
    pub macd_signal_smoothing: Smoothing,
    pub rsi_signal_smoothing: Smoothing,
    /// Fixed order size in units for MACD and Bollinger entries.
    pub position_size: f64,
    /// Stop distance below entry for Bollinger entries, in percent.
    pub stop_loss_pct: f64,
}

impl Default for StrategyParameters {
    fn default() -> Self {
        StrategyParameters {
            bb_window: 30,
            rsi_window: 14,
            rsi_smooth_window: 3,
            rsi_upper_thres: 70.0,
            rsi_lower_thres: 30.0,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            macd_source_smoothing: Smoothing::Ema,
            macd_signal_smoothing: Smoothing::Ema,
            rsi_signal_smoothing: Smoothing::Ema,
            position_size: 100.0,
            stop_loss_pct: 2.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sizing {
    Units(f64),
    /// As many whole units as the available cash buys.
    AllCash,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Signal {
    Hold,
    EnterLong {
        sizing: Sizing,
        stop_loss: Option<f64>,
    },
    Exit,
}

/// Indicator series a single run needs. Variants that don't use an
/// indicator leave it as `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndicatorSet {
    pub macd: Option<Macd>,
    pub bollinger: Option<BollingerBands>,
    pub rsi: Option<Rsi>,
}

impl IndicatorSet {
    pub fn compute(kind: StrategyKind, bars: &[PriceBar], params: &StrategyParameters) -> Self {
        match kind {
            StrategyKind::MacdCross => IndicatorSet {
                macd: Some(calculate_macd(
                    bars,
                    params.macd_fast,
                    params.macd_slow,
                    params.macd_signal,
                    params.macd_source_smoothing,
                    params.macd_signal_smoothing,
                )),
                ..Default::default()
            },
            StrategyKind::BollingerRsi => IndicatorSet {
                bollinger: Some(calculate_bollinger(bars, params.bb_window, DEFAULT_MULT_X100)),
                rsi: Some(calculate_rsi(
                    bars,
                    params.rsi_window,
                    params.rsi_smooth_window,
                    params.rsi_signal_smoothing,
                )),
                ..Default::default()
            },
            StrategyKind::BuyAndHold | StrategyKind::SimpleMovingAverage => IndicatorSet::default(),
        }
    }
}

/// True when `a` crosses strictly above `b` at `index`:
/// a[i-1] <= b[i-1] and a[i] > b[i]. Any undefined value gives false.
pub fn crossover(a: &IndicatorSeries, b: &IndicatorSeries, index: usize) -> bool {
    if index == 0 {
        return false;
    }
    match (a.get(index - 1), b.get(index - 1), a.get(index), b.get(index)) {
        (Some(a_prev), Some(b_prev), Some(a_curr), Some(b_curr)) => {
            a_prev <= b_prev && a_curr > b_curr
        }
        _ => false,
    }
}
