//! RSI (Relative Strength Index) indicator.
//!
//! delta[i] = close[i] - close[i-1], undefined at bar 0.
//! avg_gain / avg_loss: bias-adjusted exponential mean with span = period.
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! avg_loss == 0 && avg_gain > 0: RSI = 100
//! avg_loss == 0 && avg_gain == 0: RSI = 50
//!
//! The signal line smooths RSI over `smoothing_window`; EMA mode uses the same
//! adjusted exponential mean, SMA mode a trailing mean.

use crate::domain::indicator::smoothing::{ema_adjusted, sma};
use crate::domain::indicator::{IndicatorSeries, IndicatorType, Smoothing};
use crate::domain::ohlcv::PriceBar;

#[derive(Debug, Clone, PartialEq)]
pub struct Rsi {
    pub rsi: IndicatorSeries,
    pub signal: IndicatorSeries,
}

pub fn calculate_rsi(
    bars: &[PriceBar],
    period: usize,
    smoothing_window: usize,
    smoothing: Smoothing,
) -> Rsi {
    let mut gains: Vec<Option<f64>> = Vec::with_capacity(bars.len());
    let mut losses: Vec<Option<f64>> = Vec::with_capacity(bars.len());

    for i in 0..bars.len() {
        if i == 0 {
            gains.push(None);
            losses.push(None);
            continue;
        }
        let change = bars[i].close - bars[i - 1].close;
        gains.push(Some(change.max(0.0)));
        losses.push(Some((-change).max(0.0)));
    }

    let avg_gain = ema_adjusted(&gains, period);
    let avg_loss = ema_adjusted(&losses, period);

    let rsi: Vec<Option<f64>> = avg_gain
        .iter()
        .zip(&avg_loss)
        .map(|(g, l)| Some(rsi_from_averages((*g)?, (*l)?)))
        .collect();

    let signal = match smoothing {
        Smoothing::Ema => ema_adjusted(&rsi, smoothing_window),
        Smoothing::Sma => sma(&rsi, smoothing_window),
    };

    Rsi {
        rsi: IndicatorSeries::new(IndicatorType::Rsi(period), rsi),
        signal: IndicatorSeries::new(
            IndicatorType::RsiSignal {
                period,
                smoothing_window,
                smoothing,
            },
            signal,
        ),
    }
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        if avg_gain > 0.0 { 100.0 } else { 50.0 }
    } else {
        100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
    }
}
