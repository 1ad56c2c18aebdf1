//! MACD (Moving Average Convergence Divergence) indicator.
//!
//! MACD Line = smooth(close, fast) - smooth(close, slow)
//! Signal Line = smooth(MACD Line, signal)
//! Histogram = MACD Line - Signal Line
//!
//! With EMA smoothing the lines are defined from the first bar (seeded from
//! the first close). With SMA smoothing the line is undefined until the slow
//! window fills, and the signal a further `signal - 1` bars after that.

use crate::domain::indicator::smoothing::smooth;
use crate::domain::indicator::{IndicatorSeries, IndicatorType, MacdComponent, Smoothing};
use crate::domain::ohlcv::{closes, PriceBar};

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

#[derive(Debug, Clone, PartialEq)]
pub struct Macd {
    pub line: IndicatorSeries,
    pub signal: IndicatorSeries,
    pub histogram: IndicatorSeries,
}

pub fn calculate_macd(
    bars: &[PriceBar],
    fast: usize,
    slow: usize,
    signal_period: usize,
    smooth_source: Smoothing,
    smooth_signal: Smoothing,
) -> Macd {
    let close = closes(bars);
    let fast_line = smooth(&close, fast, smooth_source);
    let slow_line = smooth(&close, slow, smooth_source);

    let line: Vec<Option<f64>> = fast_line
        .iter()
        .zip(&slow_line)
        .map(|(f, s)| Some((*f)? - (*s)?))
        .collect();

    let signal = smooth(&line, signal_period, smooth_signal);

    let histogram: Vec<Option<f64>> = line
        .iter()
        .zip(&signal)
        .map(|(m, s)| Some((*m)? - (*s)?))
        .collect();

    let kind = |component| IndicatorType::Macd {
        fast,
        slow,
        signal: signal_period,
        component,
    };

    Macd {
        line: IndicatorSeries::new(kind(MacdComponent::Line), line),
        signal: IndicatorSeries::new(kind(MacdComponent::Signal), signal),
        histogram: IndicatorSeries::new(kind(MacdComponent::Histogram), histogram),
    }
}

pub fn calculate_macd_default(bars: &[PriceBar]) -> Macd {
    calculate_macd(
        bars,
        DEFAULT_FAST,
        DEFAULT_SLOW,
        DEFAULT_SIGNAL,
        Smoothing::Ema,
        Smoothing::Ema,
    )
}
