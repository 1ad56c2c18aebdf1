//! Per-ticker parameter overrides.

use std::collections::HashMap;

use super::indicator::Smoothing;
use super::strategy::StrategyParameters;

/// Optional values for each [`StrategyParameters`] field. Unset fields keep
/// the base value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamOverrides {
    pub bb_window: Option<usize>,
    pub rsi_window: Option<usize>,
    pub rsi_smooth_window: Option<usize>,
    pub rsi_upper_thres: Option<f64>,
    pub rsi_lower_thres: Option<f64>,
    pub macd_fast: Option<usize>,
    pub macd_slow: Option<usize>,
    pub macd_signal: Option<usize>,
    pub macd_source_smoothing: Option<Smoothing>,
    pub macd_signal_smoothing: Option<Smoothing>,
    pub rsi_signal_smoothing: Option<Smoothing>,
    pub position_size: Option<f64>,
    pub stop_loss_pct: Option<f64>,
}

impl ParamOverrides {
    pub fn apply(&self, base: &StrategyParameters) -> StrategyParameters {
        StrategyParameters {
            bb_window: self.bb_window.unwrap_or(base.bb_window),
            rsi_window: self.rsi_window.unwrap_or(base.rsi_window),
            rsi_smooth_window: self.rsi_smooth_window.unwrap_or(base.rsi_smooth_window),
            rsi_upper_thres: self.rsi_upper_thres.unwrap_or(base.rsi_upper_thres),
            rsi_lower_thres: self.rsi_lower_thres.unwrap_or(base.rsi_lower_thres),
            macd_fast: self.macd_fast.unwrap_or(base.macd_fast),
            macd_slow: self.macd_slow.unwrap_or(base.macd_slow),
            macd_signal: self.macd_signal.unwrap_or(base.macd_signal),
            macd_source_smoothing: self
                .macd_source_smoothing
                .unwrap_or(base.macd_source_smoothing),
            macd_signal_smoothing: self
                .macd_signal_smoothing
                .unwrap_or(base.macd_signal_smoothing),
            rsi_signal_smoothing: self
                .rsi_signal_smoothing
                .unwrap_or(base.rsi_signal_smoothing),
            position_size: self.position_size.unwrap_or(base.position_size),
            stop_loss_pct: self.stop_loss_pct.unwrap_or(base.stop_loss_pct),
        }
    }
}

/// Ticker-keyed strategy parameters. Tickers without an entry use the
/// caller's defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterTable {
    entries: HashMap<String, StrategyParameters>,
}

impl ParameterTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, ticker: impl Into<String>, params: StrategyParameters) {
        self.entries.insert(ticker.into(), params);
    }

    pub fn get(&self, ticker: &str) -> Option<&StrategyParameters> {
        self.entries.get(ticker)
    }

    pub fn resolve<'a>(
        &'a self,
        ticker: &str,
        defaults: &'a StrategyParameters,
    ) -> &'a StrategyParameters {
        self.entries.get(ticker).unwrap_or(defaults)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &StrategyParameters)> {
        self.entries.iter()
    }
}
