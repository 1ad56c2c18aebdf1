//! Configuration validation.
//!
//! Validates backtest settings and strategy parameters once, before any
//! ticker is run.

use crate::domain::backtest::BacktestConfig;
use crate::domain::error::TesterError;
use crate::domain::param_table::ParameterTable;
use crate::domain::strategy::StrategyParameters;

pub fn validate_backtest_config(config: &BacktestConfig) -> Result<(), TesterError> {
    if !(config.initial_cash.is_finite() && config.initial_cash > 0.0) {
        return Err(invalid(
            "backtest",
            "initial_cash",
            "initial_cash must be positive",
        ));
    }
    Ok(())
}

/// Check one parameter set. `section` names where the values came from and
/// is used in the error.
pub fn validate_strategy_parameters(
    params: &StrategyParameters,
    section: &str,
) -> Result<(), TesterError> {
    for (key, value) in [
        ("rsi_window", params.rsi_window),
        ("rsi_smooth_window", params.rsi_smooth_window),
        ("macd_fast", params.macd_fast),
        ("macd_slow", params.macd_slow),
        ("macd_signal", params.macd_signal),
    ] {
        if value < 1 {
            return Err(invalid(section, key, &format!("{key} must be at least 1")));
        }
    }

    if params.bb_window < 2 {
        return Err(invalid(section, "bb_window", "bb_window must be at least 2"));
    }

    for (key, value) in [
        ("rsi_upper_thres", params.rsi_upper_thres),
        ("rsi_lower_thres", params.rsi_lower_thres),
    ] {
        if !(0.0..=100.0).contains(&value) {
            return Err(invalid(section, key, &format!("{key} must be between 0 and 100")));
        }
    }

    if params.rsi_lower_thres >= params.rsi_upper_thres {
        return Err(invalid(
            section,
            "rsi_lower_thres",
            "rsi_lower_thres must be below rsi_upper_thres",
        ));
    }

    if !(params.position_size.is_finite() && params.position_size > 0.0) {
        return Err(invalid(
            section,
            "position_size",
            "position_size must be positive",
        ));
    }

    if !(params.stop_loss_pct > 0.0 && params.stop_loss_pct < 100.0) {
        return Err(invalid(
            section,
            "stop_loss_pct",
            "stop_loss_pct must be between 0 and 100",
        ));
    }

    Ok(())
}

/// Check every row of a parameter table.
pub fn validate_parameter_table(table: &ParameterTable) -> Result<(), TesterError> {
    let mut tickers: Vec<&String> = table.iter().map(|(ticker, _)| ticker).collect();
    tickers.sort();
    for ticker in tickers {
        if let Some(params) = table.get(ticker) {
            validate_strategy_parameters(params, &format!("params:{ticker}"))?;
        }
    }
    Ok(())
}

fn invalid(section: &str, key: &str, reason: &str) -> TesterError {
    TesterError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}
