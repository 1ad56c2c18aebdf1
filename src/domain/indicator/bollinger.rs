//! Bollinger Bands indicator.
//!
//! - Basis: SMA(close, n)
//! - Upper: Basis + (multiplier × StdDev)
//! - Lower: Basis - (multiplier × StdDev)
//!
//! StdDev is the sample standard deviation (divides by n - 1).
//! Warmup: first (n-1) bars are undefined; n < 2 leaves every bar undefined.

use crate::domain::indicator::smoothing::{sample_stddev, sma};
use crate::domain::indicator::{BandComponent, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::{closes, PriceBar};

pub const DEFAULT_MULT_X100: u32 = 200;

#[derive(Debug, Clone, PartialEq)]
pub struct BollingerBands {
    pub basis: IndicatorSeries,
    pub upper: IndicatorSeries,
    pub lower: IndicatorSeries,
    pub deviation: IndicatorSeries,
}

pub fn calculate_bollinger(
    bars: &[PriceBar],
    period: usize,
    stddev_mult_x100: u32,
) -> BollingerBands {
    let close = closes(bars);
    let mult = stddev_mult_x100 as f64 / 100.0;

    let deviation = sample_stddev(&close, period);
    let basis: Vec<Option<f64>> = sma(&close, period)
        .into_iter()
        .zip(&deviation)
        .map(|(b, d)| (*d).and(b))
        .collect();

    let band = |sign: f64| -> Vec<Option<f64>> {
        basis
            .iter()
            .zip(&deviation)
            .map(|(b, d)| Some((*b)? + sign * mult * (*d)?))
            .collect()
    };
    let upper = band(1.0);
    let lower = band(-1.0);

    let kind = |component| IndicatorType::Bollinger {
        period,
        stddev_mult_x100,
        component,
    };

    BollingerBands {
        upper: IndicatorSeries::new(kind(BandComponent::Upper), upper),
        lower: IndicatorSeries::new(kind(BandComponent::Lower), lower),
        basis: IndicatorSeries::new(kind(BandComponent::Basis), basis),
        deviation: IndicatorSeries::new(kind(BandComponent::Deviation), deviation),
    }
}
