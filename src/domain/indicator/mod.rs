//! Technical indicator implementations.
//!
//! Every indicator returns one or more [`IndicatorSeries`] aligned 1:1 with the
//! input bars. Warm-up entries are `None` so callers can tell "not yet
//! available" apart from a computed zero.
//!
//! - `IndicatorType`: indicator identity + parameters (Display for labels)
//! - `IndicatorSeries`: an aligned sequence of optional values
//! - `Smoothing`: EMA / SMA selector shared by MACD and RSI

pub mod atr;
pub mod bollinger;
pub mod macd;
pub mod rsi;
pub mod smoothing;
pub mod stochastic;

pub use atr::calculate_atr;
pub use bollinger::{calculate_bollinger, BollingerBands};
pub use macd::{calculate_macd, Macd};
pub use rsi::{calculate_rsi, Rsi};
pub use stochastic::{calculate_stochastic, Stochastic};

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Smoothing {
    #[default]
    Ema,
    Sma,
}

impl fmt::Display for Smoothing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Smoothing::Ema => write!(f, "EMA"),
            Smoothing::Sma => write!(f, "SMA"),
        }
    }
}

impl FromStr for Smoothing {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "EMA" => Ok(Smoothing::Ema),
            "SMA" => Ok(Smoothing::Sma),
            other => Err(format!("unknown smoothing mode '{}' (expected EMA or SMA)", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MacdComponent {
    Line,
    Signal,
    Histogram,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BandComponent {
    Basis,
    Upper,
    Lower,
    Deviation,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
        component: MacdComponent,
    },
    Bollinger {
        period: usize,
        stddev_mult_x100: u32,
        component: BandComponent,
    },
    Rsi(usize),
    RsiSignal {
        period: usize,
        smoothing_window: usize,
        smoothing: Smoothing,
    },
    StochasticK(usize),
    StochasticD {
        k_period: usize,
        d_period: usize,
    },
    Atr(usize),
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Macd {
                fast,
                slow,
                signal,
                component,
            } => {
                let name = match component {
                    MacdComponent::Line => "MACD",
                    MacdComponent::Signal => "MACD_SIGNAL",
                    MacdComponent::Histogram => "MACD_HIST",
                };
                write!(f, "{}({},{},{})", name, fast, slow, signal)
            }
            IndicatorType::Bollinger {
                period,
                stddev_mult_x100,
                component,
            } => {
                let name = match component {
                    BandComponent::Basis => "BB_BASIS",
                    BandComponent::Upper => "BB_UPPER",
                    BandComponent::Lower => "BB_LOWER",
                    BandComponent::Deviation => "BB_DEV",
                };
                let mult = *stddev_mult_x100 as f64 / 100.0;
                write!(f, "{}({},{})", name, period, mult)
            }
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::RsiSignal {
                period,
                smoothing_window,
                smoothing,
            } => write!(f, "RSI_SIGNAL({},{},{})", period, smoothing_window, smoothing),
            IndicatorType::StochasticK(k) => write!(f, "STOCH_K({})", k),
            IndicatorType::StochasticD { k_period, d_period } => {
                write!(f, "STOCH_D({},{})", k_period, d_period)
            }
            IndicatorType::Atr(period) => write!(f, "ATR({})", period),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<Option<f64>>,
}

impl IndicatorSeries {
    pub fn new(indicator_type: IndicatorType, values: Vec<Option<f64>>) -> Self {
        Self {
            indicator_type,
            values,
        }
    }

    /// Value at `index`, or `None` while warming up or out of range.
    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied().flatten()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of leading undefined entries.
    pub fn warmup(&self) -> usize {
        self.values.iter().take_while(|v| v.is_none()).count()
    }
}
