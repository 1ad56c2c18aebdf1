//! Stochastic Oscillator indicator.
//!
//! %K = 100 * (close - lowest_low(k)) / (highest_high(k) - lowest_low(k))
//! %D = SMA(%K, d)
//!
//! A flat range (highest_high == lowest_low) gives %K = 50.
//! Warmup: %K undefined for the first (k-1) bars, %D for (k-1) + (d-1).

use crate::domain::indicator::smoothing::{rolling_max, rolling_min, sma};
use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::PriceBar;

pub const DEFAULT_K_PERIOD: usize = 14;
pub const DEFAULT_D_PERIOD: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct Stochastic {
    pub k: IndicatorSeries,
    pub d: IndicatorSeries,
}

pub fn calculate_stochastic(bars: &[PriceBar], k_period: usize, d_period: usize) -> Stochastic {
    let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
    let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();
    let highest = rolling_max(&highs, k_period);
    let lowest = rolling_min(&lows, k_period);

    let k: Vec<Option<f64>> = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            let hh = highest[i]?;
            let ll = lowest[i]?;
            let range = hh - ll;
            if range == 0.0 {
                Some(50.0)
            } else {
                Some(100.0 * (bar.close - ll) / range)
            }
        })
        .collect();

    let d = sma(&k, d_period);

    Stochastic {
        k: IndicatorSeries::new(IndicatorType::StochasticK(k_period), k),
        d: IndicatorSeries::new(IndicatorType::StochasticD { k_period, d_period }, d),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use chrono::NaiveDate;

    fn make_bar(day: i64, high: f64, low: f64, close: f64) -> PriceBar {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        PriceBar {
            timestamp: start + chrono::Duration::days(day),
            open: close,
            high,
            low,
            close,
            volume: 1000.0,
        }
    }

    #[test]
    fn stochastic_known_value() {
        let bars = vec![
            make_bar(0, 12.0, 8.0, 10.0),
            make_bar(1, 14.0, 9.0, 13.0),
            make_bar(2, 13.0, 10.0, 11.0),
        ];
        let out = calculate_stochastic(&bars, 3, 1);
        // hh=14, ll=8 → 100*(11-8)/6 = 50
        assert_eq!(out.k.get(0), None);
        assert_eq!(out.k.get(1), None);
        assert_abs_diff_eq!(out.k.get(2).unwrap(), 50.0, epsilon = 1e-12);
        assert_eq!(out.d.get(2), out.k.get(2));
    }

    #[test]
    fn stochastic_flat_range_is_fifty() {
        let bars: Vec<PriceBar> = (0..10).map(|i| make_bar(i, 5.0, 5.0, 5.0)).collect();
        let out = calculate_stochastic(&bars, DEFAULT_K_PERIOD.min(4), DEFAULT_D_PERIOD);
        for i in 3..10 {
            assert_eq!(out.k.get(i), Some(50.0));
        }
        assert_eq!(out.d.get(9), Some(50.0));
    }

    #[test]
    fn stochastic_close_at_high_is_hundred() {
        let bars: Vec<PriceBar> = (0..5)
            .map(|i| make_bar(i, 10.0 + i as f64, 5.0, 10.0 + i as f64))
            .collect();
        let out = calculate_stochastic(&bars, 3, 3);
        assert_abs_diff_eq!(out.k.get(4).unwrap(), 100.0, epsilon = 1e-12);
    }

    #[test]
    fn stochastic_warmup() {
        let bars: Vec<PriceBar> = (0..20)
            .map(|i| make_bar(i, 11.0 + (i % 4) as f64, 9.0, 10.0))
            .collect();
        let out = calculate_stochastic(&bars, DEFAULT_K_PERIOD, DEFAULT_D_PERIOD);
        assert_eq!(out.k.warmup(), 13);
        assert_eq!(out.d.warmup(), 15);
        assert_eq!(out.k.len(), 20);
    }

    #[test]
    fn stochastic_empty_bars() {
        let out = calculate_stochastic(&[], 14, 3);
        assert!(out.k.is_empty());
        assert!(out.d.is_empty());
    }
}
