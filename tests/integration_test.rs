//! Integration tests for the backtest pipeline.
//!
//! Tests cover:
//! - Strategy runs over synthetic price paths with known outcomes
//! - Stop-loss exits taking priority over signals
//! - Batch runs with a mock data port, including skipped tickers
//! - Per-ticker parameter overrides
//! - Indicator behaviour on constant prices

mod common;

use approx::assert_abs_diff_eq;
use common::*;
use strategy_tester::domain::backtest::{run_backtest, BacktestConfig};
use strategy_tester::domain::batch::{run_batch, BatchConfig, SkipReason};
use strategy_tester::domain::indicator::{
    calculate_bollinger, calculate_macd, calculate_rsi, Macd, Smoothing,
};
use strategy_tester::domain::indicator::bollinger::DEFAULT_MULT_X100;
use strategy_tester::domain::metrics::{total_return_pct, PerformanceStats};
use strategy_tester::domain::param_table::ParameterTable;
use strategy_tester::domain::position::ExitReason;
use strategy_tester::domain::strategy::{StrategyKind, StrategyParameters};

/// 30 bars at 100 then `tail` bars: the drop to 80 on bar 30 pierces the
/// lower band while the RSI signal falls to about 25.
fn dip_closes(tail: &[f64]) -> Vec<f64> {
    let mut closes = vec![100.0; 30];
    closes.extend_from_slice(tail);
    closes
}

fn default_macd(bars: &[PriceBar]) -> Macd {
    calculate_macd(bars, 12, 26, 9, Smoothing::Ema, Smoothing::Ema)
}

fn tickers(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

mod strategy_runs {
    use super::*;

    #[test]
    fn flat_prices_never_trade() {
        let bars = make_bars(&[100.0; 40]);
        let result = run_backtest(
            "FLAT",
            &bars,
            StrategyKind::BollingerRsi,
            &StrategyParameters::default(),
            &BacktestConfig::default(),
        )
        .unwrap();

        assert!(result.trades.is_empty());
        assert_abs_diff_eq!(total_return_pct(&result), 0.0, epsilon = 1e-12);
        assert_eq!(result.equity_curve.len(), 40);

        let bnh = run_backtest(
            "FLAT",
            &bars,
            StrategyKind::BuyAndHold,
            &StrategyParameters::default(),
            &BacktestConfig::default(),
        )
        .unwrap();
        assert_abs_diff_eq!(total_return_pct(&bnh), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn macd_on_steady_rise_never_enters() {
        let bars = make_bars(&linear_closes(100.0, 140.0, 30));
        let result = run_backtest(
            "RISE",
            &bars,
            StrategyKind::MacdCross,
            &StrategyParameters::default(),
            &BacktestConfig::default(),
        )
        .unwrap();

        // the only upward cross is on bar 1, where the line is already positive
        let macd = default_macd(&bars);
        assert!(macd.line.get(1).unwrap() > 0.0);
        assert!(macd.line.get(1).unwrap() > macd.signal.get(1).unwrap());
        assert!(result.trades.is_empty());
        assert_abs_diff_eq!(result.final_equity(), 10_000.0, epsilon = 1e-12);
    }

    #[test]
    fn buy_and_hold_equity_follows_rising_prices() {
        let bars = make_bars(&linear_closes(10.0, 20.0, 25));
        let result = run_backtest(
            "UP",
            &bars,
            StrategyKind::BuyAndHold,
            &StrategyParameters::default(),
            &BacktestConfig::default(),
        )
        .unwrap();

        assert_eq!(result.trades.len(), 1);
        assert_eq!(result.trades[0].entry_bar_index, 0);
        assert_eq!(result.trades[0].size, 1_000.0);
        assert!(result
            .equity_curve
            .windows(2)
            .all(|w| w[1].equity >= w[0].equity));
        assert_abs_diff_eq!(result.final_equity(), 20_000.0, epsilon = 1e-6);
    }

    #[test]
    fn bollinger_entry_on_band_break() {
        let bars = make_bars(&dip_closes(&[80.0, 80.0, 80.0, 80.0]));
        let result = run_backtest(
            "DIP",
            &bars,
            StrategyKind::BollingerRsi,
            &StrategyParameters::default(),
            &BacktestConfig::default(),
        )
        .unwrap();

        assert_eq!(result.trades.len(), 1);
        let trade = &result.trades[0];
        assert_eq!(trade.entry_bar_index, 30);
        assert_eq!(trade.entry_price, 80.0);
        assert_eq!(trade.size, 100.0);
        assert_eq!(trade.exit_reason, ExitReason::EndOfData);
        assert_eq!(trade.exit_bar_index, 33);
        assert!(result.final_state.position.is_none());
    }

    #[test]
    fn stop_loss_fills_at_stop_price() {
        let bars = make_bars(&dip_closes(&[80.0, 70.0]));
        let result = run_backtest(
            "STOP",
            &bars,
            StrategyKind::BollingerRsi,
            &StrategyParameters::default(),
            &BacktestConfig::default(),
        )
        .unwrap();

        let trade = &result.trades[0];
        assert_eq!(trade.exit_reason, ExitReason::StopLoss);
        assert_eq!(trade.exit_bar_index, 31);
        assert_abs_diff_eq!(trade.exit_price, 78.0, epsilon = 1e-9);
        assert_abs_diff_eq!(trade.pnl, -200.0, epsilon = 1e-6);
        // the stop bar never opens a new position
        assert!(result.final_state.position.is_none());
        assert_eq!(result.trades.len(), 1);
    }

    #[test]
    fn repeated_runs_are_identical() {
        let bars = make_bars(&oscillating_closes(200));
        let params = StrategyParameters {
            bb_window: 20,
            ..Default::default()
        };
        for kind in [StrategyKind::BollingerRsi, StrategyKind::MacdCross] {
            let a = run_backtest("OSC", &bars, kind, &params, &BacktestConfig::default()).unwrap();
            let b = run_backtest("OSC", &bars, kind, &params, &BacktestConfig::default()).unwrap();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn stats_are_consistent_with_trades() {
        let bars = make_bars(&oscillating_closes(200));
        let result = run_backtest(
            "OSC",
            &bars,
            StrategyKind::MacdCross,
            &StrategyParameters::default(),
            &BacktestConfig::default(),
        )
        .unwrap();
        let stats = PerformanceStats::compute(&result, 0.0);

        assert_eq!(stats.trade_count, result.trades.len());
        assert!(stats.max_drawdown_pct <= 0.0);
        assert!(stats.avg_drawdown_pct <= 0.0);
        assert!(stats.win_rate_pct >= 0.0 && stats.win_rate_pct <= 100.0);
        assert_abs_diff_eq!(stats.equity_final, result.final_equity(), epsilon = 1e-9);
        assert!(stats.equity_peak >= stats.equity_final);
    }
}

mod batch_runs {
    use super::*;

    #[test]
    fn empty_ticker_is_skipped_and_batch_continues() {
        let port = MockDataPort::new()
            .with_bars("AAA", make_bars(&oscillating_closes(120)))
            .with_bars("BBB", make_bars(&linear_closes(50.0, 60.0, 60)))
            .with_bars("CCC", Vec::new());

        let report = run_batch(
            &port,
            &tickers(&["AAA", "BBB", "CCC"]),
            StrategyKind::MacdCross,
            &ParameterTable::new(),
            &StrategyParameters::default(),
            &BatchConfig {
                workers: Some(3),
                ..Default::default()
            },
        )
        .unwrap();

        let evaluated: Vec<&str> = report.rows.iter().map(|r| r.ticker.as_str()).collect();
        assert_eq!(evaluated, vec!["AAA", "BBB"]);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].ticker, "CCC");
        assert_eq!(report.skipped[0].reason, SkipReason::NoData);
    }

    #[test]
    fn load_failure_is_skipped() {
        let port = MockDataPort::new()
            .with_bars("AAA", make_bars(&[10.0, 11.0, 12.0]))
            .with_error("BAD", "disk on fire");

        let report = run_batch(
            &port,
            &tickers(&["AAA", "BAD"]),
            StrategyKind::BuyAndHold,
            &ParameterTable::new(),
            &StrategyParameters::default(),
            &BatchConfig::default(),
        )
        .unwrap();

        assert_eq!(report.rows.len(), 1);
        assert!(matches!(
            &report.skipped[0].reason,
            SkipReason::LoadFailed(reason) if reason.contains("disk on fire")
        ));
    }

    #[test]
    fn totals_sum_over_evaluated_tickers() {
        let port = MockDataPort::new()
            .with_bars("UP", make_bars(&[10.0, 15.0]))
            .with_bars("DOWN", make_bars(&[20.0, 18.0]));

        let report = run_batch(
            &port,
            &tickers(&["UP", "DOWN"]),
            StrategyKind::BuyAndHold,
            &ParameterTable::new(),
            &StrategyParameters::default(),
            &BatchConfig::default(),
        )
        .unwrap();

        // 1000 units * +5, then 500 units * -2
        assert_abs_diff_eq!(report.total_strategy_profit, 4_000.0, epsilon = 1e-6);
        assert_abs_diff_eq!(report.total_buy_and_hold_profit, 4_000.0, epsilon = 1e-6);
    }

    #[test]
    fn ticker_overrides_are_applied() {
        let bars = make_bars(&dip_closes(&[80.0, 80.0]));
        let port = MockDataPort::new()
            .with_bars("DEF", bars.clone())
            .with_bars("OVR", bars);

        let mut table = ParameterTable::new();
        table.insert(
            "OVR",
            StrategyParameters {
                position_size: 50.0,
                ..Default::default()
            },
        );

        let report = run_batch(
            &port,
            &tickers(&["DEF", "OVR"]),
            StrategyKind::BollingerRsi,
            &table,
            &StrategyParameters::default(),
            &BatchConfig::default(),
        )
        .unwrap();

        assert_eq!(report.rows[0].result.trades[0].size, 100.0);
        assert_eq!(report.rows[1].result.trades[0].size, 50.0);
    }

    #[test]
    fn worker_count_does_not_change_results() {
        let port = MockDataPort::new()
            .with_bars("A", make_bars(&oscillating_closes(150)))
            .with_bars("B", make_bars(&linear_closes(30.0, 45.0, 150)))
            .with_bars("C", make_bars(&dip_closes(&[80.0, 70.0, 72.0])));
        let names = tickers(&["A", "B", "C"]);

        let run = |workers| {
            run_batch(
                &port,
                &names,
                StrategyKind::BollingerRsi,
                &ParameterTable::new(),
                &StrategyParameters::default(),
                &BatchConfig {
                    workers: Some(workers),
                    ..Default::default()
                },
            )
            .unwrap()
        };

        assert_eq!(run(1), run(4));
    }
}

mod indicators_on_constant_prices {
    use super::*;

    #[test]
    fn macd_is_zero() {
        let bars = make_bars(&[42.0; 60]);
        let macd = calculate_macd(&bars, 12, 26, 9, Smoothing::Ema, Smoothing::Ema);
        for value in macd.line.values.iter().flatten() {
            assert_abs_diff_eq!(*value, 0.0, epsilon = 1e-12);
        }
        for value in macd.histogram.values.iter().flatten() {
            assert_abs_diff_eq!(*value, 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn rsi_is_fifty() {
        let bars = make_bars(&[42.0; 30]);
        let rsi = calculate_rsi(&bars, 14, 3, Smoothing::Ema);
        assert_eq!(rsi.rsi.get(0), None);
        for value in rsi.rsi.values.iter().flatten() {
            assert_abs_diff_eq!(*value, 50.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn bands_collapse_onto_price() {
        let bars = make_bars(&[42.1; 40]);
        let bands = calculate_bollinger(&bars, 30, DEFAULT_MULT_X100);
        assert_eq!(bands.lower.get(28), None);
        assert_eq!(bands.deviation.get(39), Some(0.0));
        assert_eq!(bands.lower.get(39), Some(42.1));
        assert_eq!(bands.upper.get(39), Some(42.1));
    }
}
