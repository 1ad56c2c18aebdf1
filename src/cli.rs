//! CLI definition and dispatch.

use clap::{Args, Parser, Subcommand};
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;
use tracing::{info, warn};

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::param_table_adapter::load_parameter_table;
use crate::domain::backtest::{BacktestConfig, DEFAULT_INITIAL_CASH};
use crate::domain::batch::{evaluate_ticker, run_batch, sample_tickers, BatchConfig, BatchReport};
use crate::domain::config_validation::{
    validate_backtest_config, validate_parameter_table, validate_strategy_parameters,
};
use crate::domain::error::TesterError;
use crate::domain::param_table::{ParamOverrides, ParameterTable};
use crate::domain::strategy::{StrategyKind, StrategyParameters};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(
    name = "strategy-tester",
    about = "Backtest indicator strategies against a buy-and-hold baseline"
)]
pub struct Cli {
    /// Log filter used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a strategy over a folder of price histories
    Run(RunArgs),
    /// Check configuration and the parameter table without running
    Validate {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        opt_params: Option<PathBuf>,
    },
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// bb, macd, sma or bnh
    #[arg(short, long, default_value = "bb")]
    pub strategy: String,
    #[arg(long, default_value = "./data/raw/outsample")]
    pub data_folder: PathBuf,
    #[arg(long, default_value = "./data/opt_params.csv")]
    pub opt_params: PathBuf,
    #[arg(long, default_value_t = 500)]
    pub num_stocks: usize,
    #[arg(long)]
    pub random_seed: Option<u64>,
    /// Run a single ticker; its data errors are fatal
    #[arg(long)]
    pub ticker: Option<String>,
    /// Also write per-ticker trade and equity files
    #[arg(long)]
    pub plots: bool,
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    #[arg(short, long, default_value = "./results")]
    pub output: PathBuf,
}

pub fn run(cli: Cli) -> ExitCode {
    let outcome = match cli.command {
        Command::Run(args) => run_strategy(&args).map(|report| print_summary(&report)),
        Command::Validate { config, opt_params } => {
            run_validate(config.as_deref(), opt_params.as_deref())
        }
    };
    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: Option<&Path>) -> Result<FileConfigAdapter, TesterError> {
    match path {
        Some(path) => {
            info!(path = %path.display(), "loading config");
            FileConfigAdapter::from_file(path)
        }
        None => Ok(FileConfigAdapter::empty()),
    }
}

/// Everything a run needs, built and validated from the config file and
/// the parameter table.
pub struct RunSettings {
    pub batch: BatchConfig,
    pub defaults: StrategyParameters,
    pub table: ParameterTable,
}

pub fn load_settings(
    config_path: Option<&Path>,
    opt_params: &Path,
) -> Result<RunSettings, TesterError> {
    let adapter = load_config(config_path)?;

    let batch = build_batch_config(&adapter)?;
    validate_backtest_config(&batch.backtest)?;

    let defaults = build_strategy_parameters(&adapter)?;
    validate_strategy_parameters(&defaults, "strategy")?;

    let table = load_parameter_table(opt_params, &defaults)?;
    validate_parameter_table(&table)?;

    Ok(RunSettings {
        batch,
        defaults,
        table,
    })
}

/// Read `[section] key` as `T`. Absent keys are `None`; unparsable values
/// are a config error.
fn parse_key<T>(adapter: &dyn ConfigPort, section: &str, key: &str) -> Result<Option<T>, TesterError>
where
    T: FromStr,
    T::Err: Display,
{
    match adapter.get_string(section, key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| TesterError::ConfigInvalid {
                section: section.to_string(),
                key: key.to_string(),
                reason: format!("'{}': {}", raw.trim(), e),
            }),
    }
}

pub fn build_backtest_config(adapter: &dyn ConfigPort) -> Result<BacktestConfig, TesterError> {
    Ok(BacktestConfig {
        initial_cash: parse_key(adapter, "backtest", "initial_cash")?
            .unwrap_or(DEFAULT_INITIAL_CASH),
    })
}

pub fn build_batch_config(adapter: &dyn ConfigPort) -> Result<BatchConfig, TesterError> {
    let workers: Option<usize> = parse_key(adapter, "batch", "workers")?;
    if workers == Some(0) {
        return Err(TesterError::ConfigInvalid {
            section: "batch".to_string(),
            key: "workers".to_string(),
            reason: "workers must be at least 1".to_string(),
        });
    }
    Ok(BatchConfig {
        backtest: build_backtest_config(adapter)?,
        workers,
    })
}

/// Defaults overlaid with `[backtest] position_size` and any `[strategy]`
/// parameter keys.
pub fn build_strategy_parameters(
    adapter: &dyn ConfigPort,
) -> Result<StrategyParameters, TesterError> {
    let s = "strategy";
    let position_size = match parse_key(adapter, s, "position_size")? {
        Some(size) => Some(size),
        None => parse_key(adapter, "backtest", "position_size")?,
    };
    let overrides = ParamOverrides {
        bb_window: parse_key(adapter, s, "bb_window")?,
        rsi_window: parse_key(adapter, s, "rsi_window")?,
        rsi_smooth_window: parse_key(adapter, s, "rsi_smooth_window")?,
        rsi_upper_thres: parse_key(adapter, s, "rsi_upper_thres")?,
        rsi_lower_thres: parse_key(adapter, s, "rsi_lower_thres")?,
        macd_fast: parse_key(adapter, s, "macd_fast")?,
        macd_slow: parse_key(adapter, s, "macd_slow")?,
        macd_signal: parse_key(adapter, s, "macd_signal")?,
        macd_source_smoothing: parse_key(adapter, s, "macd_source_smoothing")?,
        macd_signal_smoothing: parse_key(adapter, s, "macd_signal_smoothing")?,
        rsi_signal_smoothing: parse_key(adapter, s, "rsi_signal_smoothing")?,
        position_size,
        stop_loss_pct: parse_key(adapter, s, "stop_loss_pct")?,
    };
    Ok(overrides.apply(&StrategyParameters::default()))
}

/// Full run: settings, tickers, batch, artifacts, results table.
pub fn run_strategy(args: &RunArgs) -> Result<BatchReport, TesterError> {
    let kind: StrategyKind = args.strategy.parse()?;
    let settings = load_settings(args.config.as_deref(), &args.opt_params)?;

    if !args.data_folder.is_dir() {
        return Err(TesterError::DataSource {
            reason: format!(
                "data folder {} not found; download the price histories first",
                args.data_folder.display()
            ),
        });
    }
    let data_port = CsvAdapter::new(args.data_folder.clone());

    let mut report = match &args.ticker {
        Some(ticker) => {
            info!(ticker = ticker.as_str(), strategy = %kind, "running single ticker");
            let bars = data_port.fetch_bars(ticker)?;
            let params = settings.table.resolve(ticker, &settings.defaults);
            let row = evaluate_ticker(ticker, &bars, kind, params, &settings.batch.backtest)?;
            BatchReport::from_outcomes(kind, vec![Ok(row)])
        }
        None => {
            let available = data_port.list_tickers()?;
            let tickers = sample_tickers(&available, args.num_stocks, args.random_seed);
            info!(
                available = available.len(),
                selected = tickers.len(),
                "tickers selected"
            );
            run_batch(
                &data_port,
                &tickers,
                kind,
                &settings.table,
                &settings.defaults,
                &settings.batch,
            )?
        }
    };

    let reporter = CsvReportAdapter::new(args.output.clone());
    if args.plots {
        for row in &mut report.rows {
            match reporter.write_artifacts(row) {
                Ok(path) => row.plot_path = Some(path),
                Err(e) => {
                    warn!(ticker = row.ticker.as_str(), error = %e, "artifacts not written")
                }
            }
        }
    }
    let path = reporter.write_results(&report, kind)?;
    info!(path = path.as_str(), "results written");

    Ok(report)
}

fn print_summary(report: &BatchReport) {
    println!(
        "Profit from Simple Buy and Hold Strategy: {:.2}",
        report.total_buy_and_hold_profit
    );
    println!(
        "Profit from {} strategy: {:.2}",
        report.strategy, report.total_strategy_profit
    );
    println!(
        "Evaluated {} tickers, skipped {}",
        report.rows.len(),
        report.skipped.len()
    );
    for skip in &report.skipped {
        println!("  skipped {}: {}", skip.ticker, skip.reason);
    }
}

fn run_validate(config: Option<&Path>, opt_params: Option<&Path>) -> Result<(), TesterError> {
    let adapter = load_config(config)?;
    let batch = build_batch_config(&adapter)?;
    validate_backtest_config(&batch.backtest)?;
    let defaults = build_strategy_parameters(&adapter)?;
    validate_strategy_parameters(&defaults, "strategy")?;

    println!("initial cash: {}", batch.backtest.initial_cash);
    println!(
        "workers: {}",
        batch
            .workers
            .map(|w| w.to_string())
            .unwrap_or_else(|| "auto".to_string())
    );
    println!("strategy parameters: {:?}", defaults);

    if let Some(path) = opt_params {
        let table = load_parameter_table(path, &defaults)?;
        validate_parameter_table(&table)?;
        println!("parameter table: {} tickers", table.len());
    }

    println!("Configuration is valid.");
    Ok(())
}
