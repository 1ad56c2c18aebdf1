//! Price bar representation and sequence validation.

use chrono::NaiveDateTime;

use crate::domain::error::TesterError;

#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl PriceBar {
    /// max(|high - low|, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = (self.high - self.low).abs();
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }
}

/// Checks that a bar sequence can be simulated.
///
/// Rejects empty sequences, non-finite or non-positive prices, and
/// timestamps that do not strictly increase.
pub fn validate_bars(ticker: &str, bars: &[PriceBar]) -> Result<(), TesterError> {
    if bars.is_empty() {
        return Err(TesterError::EmptyData {
            ticker: ticker.to_string(),
        });
    }

    for (i, bar) in bars.iter().enumerate() {
        let prices = [bar.open, bar.high, bar.low, bar.close];
        if prices.iter().any(|p| !p.is_finite() || *p <= 0.0) {
            return Err(TesterError::InvalidData {
                ticker: ticker.to_string(),
                reason: format!("bar {} has a non-positive or non-finite price", i),
            });
        }
        if i > 0 && bar.timestamp <= bars[i - 1].timestamp {
            return Err(TesterError::InvalidData {
                ticker: ticker.to_string(),
                reason: format!(
                    "timestamps not strictly increasing at bar {} ({} after {})",
                    i,
                    bar.timestamp,
                    bars[i - 1].timestamp
                ),
            });
        }
    }

    Ok(())
}

pub fn closes(bars: &[PriceBar]) -> Vec<Option<f64>> {
    bars.iter().map(|b| Some(b.close)).collect()
}
