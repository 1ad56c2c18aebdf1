//! Moving-average and rolling-window primitives over optional series.
//!
//! EMA: k = 2/(span+1), seeded with the first defined value (no bias
//! adjustment), then EMA[i] = EMA[i-1] + k*(x[i] - EMA[i-1]).
//! Adjusted EMA: sum((1-k)^j * x[i-j]) / sum((1-k)^j), the bias-corrected form.
//! SMA: trailing mean, undefined until `window` defined inputs are available.
//! A window of identical values gives that value back, with a deviation of
//! exactly zero.
//! Wilder: EMA with k = 1/period.

use super::Smoothing;

/// Dispatches to [`ema`] or [`sma`].
pub fn smooth(values: &[Option<f64>], window: usize, mode: Smoothing) -> Vec<Option<f64>> {
    match mode {
        Smoothing::Ema => ema(values, window),
        Smoothing::Sma => sma(values, window),
    }
}

pub fn ema(values: &[Option<f64>], span: usize) -> Vec<Option<f64>> {
    if span == 0 {
        return vec![None; values.len()];
    }
    let k = 2.0 / (span as f64 + 1.0);
    recursive(values, k)
}

pub fn wilder(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; values.len()];
    }
    recursive(values, 1.0 / period as f64)
}

fn recursive(values: &[Option<f64>], k: f64) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(values.len());
    let mut prev: Option<f64> = None;

    for value in values {
        match (*value, prev) {
            (Some(x), None) => {
                prev = Some(x);
                out.push(Some(x));
            }
            (Some(x), Some(p)) => {
                // written as a delta so a flat input stays exactly flat
                let next = p + k * (x - p);
                prev = Some(next);
                out.push(Some(next));
            }
            (None, _) => out.push(None),
        }
    }

    out
}

pub fn ema_adjusted(values: &[Option<f64>], span: usize) -> Vec<Option<f64>> {
    if span == 0 {
        return vec![None; values.len()];
    }
    let decay = 1.0 - 2.0 / (span as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());
    let mut numerator = 0.0;
    let mut denominator = 0.0;

    for value in values {
        match value {
            Some(x) => {
                numerator = x + decay * numerator;
                denominator = 1.0 + decay * denominator;
                out.push(Some(numerator / denominator));
            }
            None => out.push(None),
        }
    }

    out
}

pub fn sma(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    rolling(values, window, |w| {
        if is_flat(w) {
            w[0]
        } else {
            w.iter().sum::<f64>() / w.len() as f64
        }
    })
}

/// Rolling sample standard deviation (divides by n - 1).
pub fn sample_stddev(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    if window < 2 {
        return vec![None; values.len()];
    }
    rolling(values, window, |w| {
        if is_flat(w) {
            return 0.0;
        }
        // offsets from the first value keep the sums small
        let origin = w[0];
        let n = w.len() as f64;
        let mean = w.iter().map(|x| x - origin).sum::<f64>() / n;
        let variance = w
            .iter()
            .map(|x| (x - origin - mean) * (x - origin - mean))
            .sum::<f64>()
            / (n - 1.0);
        variance.sqrt()
    })
}

/// Every value in the window equals the first.
fn is_flat(w: &[f64]) -> bool {
    w.iter().all(|x| *x == w[0])
}

pub fn rolling_max(values: &[f64], window: usize) -> Vec<Option<f64>> {
    let wrapped: Vec<Option<f64>> = values.iter().map(|v| Some(*v)).collect();
    rolling(&wrapped, window, |w| {
        w.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    })
}

pub fn rolling_min(values: &[f64], window: usize) -> Vec<Option<f64>> {
    let wrapped: Vec<Option<f64>> = values.iter().map(|v| Some(*v)).collect();
    rolling(&wrapped, window, |w| w.iter().copied().fold(f64::INFINITY, f64::min))
}

fn rolling<F>(values: &[Option<f64>], window: usize, reduce: F) -> Vec<Option<f64>>
where
    F: Fn(&[f64]) -> f64,
{
    if window == 0 {
        return vec![None; values.len()];
    }

    let mut out = Vec::with_capacity(values.len());
    let mut buf: Vec<f64> = Vec::with_capacity(window);

    for i in 0..values.len() {
        if i + 1 < window {
            out.push(None);
            continue;
        }
        buf.clear();
        for v in &values[i + 1 - window..=i] {
            match v {
                Some(x) => buf.push(*x),
                None => break,
            }
        }
        if buf.len() == window {
            out.push(Some(reduce(&buf)));
        } else {
            out.push(None);
        }
    }

    out
}
