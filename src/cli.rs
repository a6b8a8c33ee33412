//! CLI definition and dispatch.

use chrono::{Local, NaiveDate, Weekday};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::text_report_adapter::TextReportAdapter;
use crate::domain::backtest::{self as backtest_engine, BacktestConfig, DataWindow};
use crate::domain::config_validation::{
    validate_backtest, validate_data_window, validate_strategy,
};
use crate::domain::error::TitanError;
use crate::domain::execution::CommissionModel;
use crate::domain::metrics::PerformanceReport;
use crate::domain::strategy::StrategyConfig;
use crate::domain::universe::{fetch_universe_prices, Universe};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

const DEFAULT_HORIZON_YEARS: i64 = 3;

#[derive(Parser, Debug)]
#[command(name = "titan", about = "Momentum/volatility rotation backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Directory of per-ticker CSV files (overrides [backtest] data_dir)
        #[arg(long)]
        data_dir: Option<PathBuf>,
        /// Last date of the run, YYYY-MM-DD (overrides [backtest] end_date)
        #[arg(long)]
        end_date: Option<String>,
        /// Write the report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        dry_run: bool,
    },
    /// List universe categories and their tickers
    Universe {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Show data range for ticker(s)
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        ticker: Option<String>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            data_dir,
            end_date,
            output,
            dry_run,
        } => {
            if dry_run {
                run_dry_run(
                    &config,
                    data_dir.as_deref(),
                    end_date.as_deref(),
                    output.as_deref(),
                )
            } else {
                run_backtest(
                    &config,
                    data_dir.as_deref(),
                    end_date.as_deref(),
                    output.as_deref(),
                )
            }
        }
        Command::Universe { config } => run_universe(config.as_deref()),
        Command::Info { config, ticker } => run_info(&config, ticker.as_deref()),
    }
}

fn fail(err: &TitanError) -> ExitCode {
    eprintln!("error: {err}");
    err.into()
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, TitanError> {
    FileConfigAdapter::from_file(path).map_err(|e| TitanError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

fn parse_date(section: &str, key: &str, value: &str) -> Result<NaiveDate, TitanError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        TitanError::invalid(section, key, "invalid date format (expected YYYY-MM-DD)")
    })
}

fn get_count(
    adapter: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: usize,
) -> Result<usize, TitanError> {
    let value = adapter.get_int(section, key, default as i64);
    usize::try_from(value)
        .map_err(|_| TitanError::invalid(section, key, format!("{key} must not be negative")))
}

pub fn build_strategy_config(adapter: &dyn ConfigPort) -> Result<StrategyConfig, TitanError> {
    let defaults = StrategyConfig::default();

    let rebalance_weekday = match adapter.get_string("strategy", "rebalance_weekday") {
        Some(day) => day.trim().parse::<Weekday>().map_err(|_| {
            TitanError::invalid(
                "strategy",
                "rebalance_weekday",
                format!("unknown weekday {day:?}"),
            )
        })?,
        None => defaults.rebalance_weekday,
    };

    Ok(StrategyConfig {
        lookback_momentum: get_count(
            adapter,
            "strategy",
            "lookback_momentum",
            defaults.lookback_momentum,
        )?,
        lookback_volatility: get_count(
            adapter,
            "strategy",
            "lookback_volatility",
            defaults.lookback_volatility,
        )?,
        top_n: get_count(adapter, "strategy", "top_n", defaults.top_n)?,
        max_sector_weight: adapter.get_double(
            "strategy",
            "max_sector_weight",
            defaults.max_sector_weight,
        ),
        stop_loss_pct: adapter.get_double("strategy", "stop_loss_pct", defaults.stop_loss_pct),
        rebalance_weekday,
    })
}

pub fn build_commission(adapter: &dyn ConfigPort) -> CommissionModel {
    let defaults = CommissionModel::default();
    CommissionModel {
        rate: adapter.get_double("commission", "rate", defaults.rate),
        min_commission: adapter.get_double("commission", "min_commission", defaults.min_commission),
        max_pct: adapter.get_double("commission", "max_pct", defaults.max_pct),
    }
}

pub fn build_backtest_config(adapter: &dyn ConfigPort) -> BacktestConfig {
    BacktestConfig {
        initial_capital: adapter.get_double(
            "backtest",
            "initial_capital",
            BacktestConfig::default().initial_capital,
        ),
        commission: build_commission(adapter),
    }
}

/// `end_override` wins over `[backtest] end_date`; with neither, the run
/// ends today.
pub fn build_data_window(
    adapter: &dyn ConfigPort,
    end_override: Option<&str>,
) -> Result<DataWindow, TitanError> {
    let end_date = match end_override {
        Some(value) => parse_date("backtest", "end_date", value)?,
        None => match adapter.get_string("backtest", "end_date") {
            Some(value) => parse_date("backtest", "end_date", &value)?,
            None => Local::now().date_naive(),
        },
    };
    let start_date = adapter
        .get_string("backtest", "start_date")
        .map(|value| parse_date("backtest", "start_date", &value))
        .transpose()?;

    let horizon = adapter.get_int("backtest", "horizon_years", DEFAULT_HORIZON_YEARS);
    let horizon_years = u32::try_from(horizon).map_err(|_| {
        TitanError::invalid("backtest", "horizon_years", "horizon_years must not be negative")
    })?;

    Ok(DataWindow {
        end_date,
        start_date,
        horizon_years,
    })
}

pub fn resolve_data_dir(
    adapter: &dyn ConfigPort,
    data_dir_override: Option<&Path>,
) -> Result<PathBuf, TitanError> {
    match data_dir_override {
        Some(dir) => Ok(dir.to_path_buf()),
        None => adapter
            .get_string("backtest", "data_dir")
            .map(PathBuf::from)
            .ok_or_else(|| TitanError::ConfigMissing {
                section: "backtest".into(),
                key: "data_dir".into(),
            }),
    }
}

/// Every typed setting a run needs, validated.
pub struct RunSettings {
    pub strategy: StrategyConfig,
    pub backtest: BacktestConfig,
    pub window: DataWindow,
    pub universe: Universe,
}

pub fn build_run_settings(
    adapter: &dyn ConfigPort,
    end_override: Option<&str>,
) -> Result<RunSettings, TitanError> {
    let strategy = build_strategy_config(adapter)?;
    validate_strategy(&strategy)?;
    let backtest = build_backtest_config(adapter);
    validate_backtest(&backtest)?;
    let window = build_data_window(adapter, end_override)?;
    validate_data_window(&window)?;
    let universe = Universe::from_config(adapter)?;

    Ok(RunSettings {
        strategy,
        backtest,
        window,
        universe,
    })
}

/// Load prices, simulate and summarise.
pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    settings: &RunSettings,
) -> Result<PerformanceReport, TitanError> {
    let tickers = settings.universe.all_tickers();
    let start = settings.window.start(settings.strategy.lookback_momentum);
    let end = settings.window.end_date;

    eprintln!("Loading prices for {} tickers, {} to {}", tickers.len(), start, end);
    let prices = fetch_universe_prices(data_port, &tickers, start, end)?;
    if !prices.skipped.is_empty() {
        eprintln!("  Skipped {} tickers without usable data", prices.skipped.len());
    }

    eprintln!(
        "Running backtest: {} tickers, {} dates",
        prices.table.tickers().len(),
        prices.table.len()
    );
    let result = backtest_engine::run_backtest(
        &prices.table,
        &settings.universe,
        &settings.strategy,
        &settings.backtest,
    )?;

    Ok(PerformanceReport::build(&result))
}

pub fn write_report(report: &PerformanceReport, output: Option<&Path>) -> Result<(), TitanError> {
    let adapter = TextReportAdapter::new();
    match output {
        Some(path) => {
            let mut out = BufWriter::new(File::create(path)?);
            adapter.write(report, &mut out)?;
            out.flush()?;
            eprintln!("\nReport written to: {}", path.display());
        }
        None => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            adapter.write(report, &mut out)?;
        }
    }
    Ok(())
}

fn run_backtest(
    config_path: &Path,
    data_dir_override: Option<&Path>,
    end_override: Option<&str>,
    output: Option<&Path>,
) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(e) => return fail(&e),
    };

    let settings = match build_run_settings(&adapter, end_override) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };
    let data_dir = match resolve_data_dir(&adapter, data_dir_override) {
        Ok(d) => d,
        Err(e) => return fail(&e),
    };

    let data_port = CsvAdapter::new(data_dir);
    let report = match run_backtest_pipeline(&data_port, &settings) {
        Ok(r) => r,
        Err(e) => return fail(&e),
    };

    match write_report(&report, output) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => fail(&e),
    }
}

/// Validate everything a run would use, without loading prices.
pub fn run_dry_run(
    config_path: &Path,
    data_dir_override: Option<&Path>,
    end_override: Option<&str>,
    output: Option<&Path>,
) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(e) => return fail(&e),
    };

    let settings = match build_run_settings(&adapter, end_override) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };
    let data_dir = match resolve_data_dir(&adapter, data_dir_override) {
        Ok(d) => d,
        Err(e) => return fail(&e),
    };
    eprintln!("Config validated successfully");

    let s = &settings.strategy;
    eprintln!("\nStrategy:");
    eprintln!("  lookback_momentum:   {}", s.lookback_momentum);
    eprintln!("  lookback_volatility: {}", s.lookback_volatility);
    eprintln!("  top_n:               {}", s.top_n);
    eprintln!(
        "  max_sector_weight:   {} ({} slots per category)",
        s.max_sector_weight,
        s.max_slots_per_category()
    );
    eprintln!("  stop_loss_pct:       {}", s.stop_loss_pct);
    eprintln!("  rebalance_weekday:   {}", s.rebalance_weekday);

    let c = &settings.backtest.commission;
    eprintln!("\nCommission:");
    eprintln!(
        "  rate {} min {:.2} max_pct {}",
        c.rate, c.min_commission, c.max_pct
    );

    eprintln!("\nBacktest:");
    eprintln!("  initial_capital: {:.2}", settings.backtest.initial_capital);
    eprintln!(
        "  data window:     {} to {}",
        settings.window.start(s.lookback_momentum),
        settings.window.end_date
    );
    eprintln!("  data_dir:        {}", data_dir.display());
    if !data_dir.is_dir() {
        eprintln!("  warning: data_dir is not a directory");
    }
    match output {
        Some(path) => eprintln!("  report:          {}", path.display()),
        None => eprintln!("  report:          stdout"),
    }

    eprintln!("\nUniverse:");
    for category in settings.universe.categories() {
        eprintln!("  {}: {} tickers", category.name, category.tickers.len());
    }
    eprintln!("  {} distinct tickers", settings.universe.count());

    eprintln!("\nDry run complete: configuration is valid");
    ExitCode::SUCCESS
}

fn run_universe(config_path: Option<&Path>) -> ExitCode {
    let universe = match config_path {
        Some(path) => match load_config(path).and_then(|c| Universe::from_config(&c)) {
            Ok(u) => u,
            Err(e) => return fail(&e),
        },
        None => Universe::builtin(),
    };

    for category in universe.categories() {
        println!("[{}]", category.name);
        println!("{}", category.tickers.join(", "));
    }
    eprintln!(
        "{} categories, {} distinct tickers",
        universe.categories().len(),
        universe.count()
    );
    ExitCode::SUCCESS
}

fn run_info(config_path: &Path, ticker: Option<&str>) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };
    let data_dir = match resolve_data_dir(&config, None) {
        Ok(d) => d,
        Err(e) => return fail(&e),
    };

    let tickers = match ticker {
        Some(t) => vec![t.trim().to_uppercase()],
        None => match Universe::from_config(&config) {
            Ok(u) => u.all_tickers(),
            Err(e) => return fail(&e),
        },
    };

    let adapter = CsvAdapter::new(data_dir);
    let mut found = 0usize;
    for ticker in &tickers {
        match adapter.get_data_range(ticker) {
            Ok(Some((first, last, rows))) => {
                found += 1;
                println!("{ticker}: {first} to {last} ({rows} rows)");
            }
            Ok(None) => println!("{ticker}: no data"),
            Err(e) => eprintln!("warning: {ticker}: {e}"),
        }
    }
    eprintln!("{found} of {} tickers have data", tickers.len());
    ExitCode::SUCCESS
}
