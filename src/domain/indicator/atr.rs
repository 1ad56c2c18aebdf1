//! Average True Range indicator.
//!
//! TR[i] = max(|high - low|, |high - prev_close|, |low - prev_close|), with
//! TR[0] undefined. ATR is Wilder smoothing of TR (alpha = 1/period), seeded
//! from the first defined TR.

use crate::domain::indicator::smoothing::wilder;
use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::PriceBar;

pub const DEFAULT_PERIOD: usize = 14;

pub fn true_ranges(bars: &[PriceBar]) -> Vec<Option<f64>> {
    bars.iter()
        .enumerate()
        .map(|(i, bar)| {
            if i == 0 {
                None
            } else {
                Some(bar.true_range(bars[i - 1].close))
            }
        })
        .collect()
}

pub fn calculate_atr(bars: &[PriceBar], period: usize) -> IndicatorSeries {
    let atr = wilder(&true_ranges(bars), period);
    IndicatorSeries::new(IndicatorType::Atr(period), atr)
}
