//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use rayon::prelude::*;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, warn};

use crate::adapters::csv_candle_adapter::CsvCandleAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::config_validation::{build_run_config, RunConfig};
use crate::domain::error::ZonetraderError;
use crate::domain::metrics::Metrics;
use crate::domain::simulator::BacktestResult;
use crate::domain::strategy::{self, StrategyRun};
use crate::domain::universe::{load_series, SkippedSymbol};
use crate::ports::candle_port::CandlePort;
use crate::ports::result_sink::{ResultSink, SymbolReport};

#[derive(Parser, Debug)]
#[command(name = "zonetrader", about = "Support/resistance zone and channel breakout backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Detect signals and simulate trades
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Directory for CSV output (overrides [report] output_dir)
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        symbol: Option<String>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Detect signals only
    Scan {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        symbol: Option<String>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show data range for symbol(s)
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Backtest,
    Scan,
}

/// Per-symbol outcome of a pipeline run.
#[derive(Debug, Clone)]
pub struct SymbolSummary {
    pub symbol: String,
    pub candles: usize,
    pub zones: usize,
    pub signals: usize,
    pub result: Option<BacktestResult>,
    pub metrics: Option<Metrics>,
}

#[derive(Debug, Clone, Default)]
pub struct PipelineOutcome {
    pub summaries: Vec<SymbolSummary>,
    pub skipped: Vec<SkippedSymbol>,
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            output,
            symbol,
            dry_run,
        } => {
            if dry_run {
                run_validate(&config)
            } else {
                run_command(&config, output, symbol.as_deref(), Mode::Backtest)
            }
        }
        Command::Scan {
            config,
            output,
            symbol,
        } => run_command(&config, output, symbol.as_deref(), Mode::Scan),
        Command::Validate { config } => run_validate(&config),
        Command::Info { config, symbol } => run_info(&config, symbol.as_deref()),
    }
}

pub fn load_run_config(
    path: &PathBuf,
    symbol_override: Option<&str>,
) -> Result<RunConfig, ZonetraderError> {
    let adapter = FileConfigAdapter::from_file(path)?;
    let mut config = build_run_config(&adapter)?;
    if let Some(symbol) = symbol_override {
        config.data.symbols = vec![symbol.trim().to_uppercase()];
    }
    Ok(config)
}

fn run_command(
    config_path: &PathBuf,
    output: Option<PathBuf>,
    symbol: Option<&str>,
    mode: Mode,
) -> ExitCode {
    // Stage 1: Load and validate config
    eprintln!("Loading config from {}", config_path.display());
    let config = match load_run_config(config_path, symbol) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    // Stage 2: Wire adapters
    let data_port = CsvCandleAdapter::new(config.data.dir.clone());
    let sink = output
        .or_else(|| config.report.output_dir.clone())
        .map(|dir| CsvReportAdapter::new(dir, config.report.annotations));

    eprintln!(
        "Running {} ({}) on {} symbols at {}",
        if mode == Mode::Backtest {
            "backtest"
        } else {
            "scan"
        },
        config.strategy.kind,
        config.data.symbols.len(),
        config.data.interval,
    );

    // Stage 3: Run symbols
    let outcome = run_pipeline(
        &data_port,
        sink.as_ref().map(|s| s as &dyn ResultSink),
        &config,
        mode,
    );

    if outcome.summaries.is_empty() {
        eprintln!("error: no symbols with usable data");
        return ExitCode::from(5);
    }

    // Stage 4: Console summary
    print_summary(&outcome, mode);
    ExitCode::SUCCESS
}

/// Run every configured symbol in parallel. Failing symbols are skipped.
pub fn run_pipeline(
    data_port: &dyn CandlePort,
    sink: Option<&dyn ResultSink>,
    config: &RunConfig,
    mode: Mode,
) -> PipelineOutcome {
    let results: Vec<(String, Result<SymbolSummary, ZonetraderError>)> = config
        .data
        .symbols
        .par_iter()
        .map(|symbol| {
            let result = process_symbol(data_port, sink, symbol, config, mode);
            (symbol.clone(), result)
        })
        .collect();

    let mut outcome = PipelineOutcome::default();
    for (symbol, result) in results {
        match result {
            Ok(summary) => outcome.summaries.push(summary),
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "skipping symbol");
                outcome.skipped.push(SkippedSymbol::from_error(&symbol, &e));
            }
        }
    }
    outcome
}

pub fn process_symbol(
    data_port: &dyn CandlePort,
    sink: Option<&dyn ResultSink>,
    symbol: &str,
    config: &RunConfig,
    mode: Mode,
) -> Result<SymbolSummary, ZonetraderError> {
    let series = load_series(
        data_port,
        symbol,
        &config.data.interval,
        config.data.start,
        config.data.end,
        config.strategy.min_candles(),
    )?;
    if series.malformed_count() > 0 {
        warn!(
            symbol,
            malformed = series.malformed_count(),
            "non-finite candles will be skipped"
        );
    }

    let (run, result): (StrategyRun, Option<BacktestResult>) = match mode {
        Mode::Backtest => {
            let (run, result) = strategy::backtest(&series, &config.strategy, &config.simulation);
            (run, Some(result))
        }
        Mode::Scan => (strategy::run_strategy(&series, &config.strategy), None),
    };
    let metrics = result.as_ref().map(Metrics::compute);

    info!(
        symbol,
        candles = series.len(),
        zones = run.zones.len(),
        signals = run.signals.len(),
        "symbol processed"
    );

    if let Some(sink) = sink {
        sink.write(&SymbolReport {
            symbol,
            interval: &config.data.interval,
            strategy: &config.strategy,
            run: &run,
            result: result.as_ref(),
            metrics: metrics.as_ref(),
        })?;
    }

    Ok(SymbolSummary {
        symbol: symbol.to_string(),
        candles: series.len(),
        zones: run.zones.len(),
        signals: run.signals.len(),
        result,
        metrics,
    })
}

fn print_summary(outcome: &PipelineOutcome, mode: Mode) {
    eprintln!("\n=== Per-Symbol Summary ===");
    for s in &outcome.summaries {
        match (&s.result, &s.metrics) {
            (Some(result), Some(m)) if mode == Mode::Backtest => {
                let sign = if result.growth_pct >= 0.0 { "+" } else { "" };
                eprintln!(
                    "  {}:  {} signals, {} trades ({}W/{}L/{} open), {:.1}% win rate, {}{:.2}%, max DD -{:.1}%",
                    s.symbol,
                    s.signals,
                    m.total_trades,
                    m.wins,
                    m.losses,
                    m.open,
                    m.win_rate_pct,
                    sign,
                    result.growth_pct,
                    m.max_drawdown * 100.0,
                );
            }
            _ => {
                eprintln!(
                    "  {}:  {} candles, {} zones, {} signals",
                    s.symbol, s.candles, s.zones, s.signals
                );
            }
        }
    }

    if !outcome.skipped.is_empty() {
        eprintln!("\nSkipped {} symbol(s):", outcome.skipped.len());
        for skipped in &outcome.skipped {
            eprintln!("  {}: {:?}", skipped.symbol, skipped.reason);
        }
    }
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let config = match load_run_config(config_path, None) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    eprintln!("\nData:");
    eprintln!("  dir:      {}", config.data.dir.display());
    eprintln!("  symbols:  {}", config.data.symbols.join(", "));
    eprintln!("  interval: {}", config.data.interval);

    let s = &config.strategy;
    eprintln!("\nStrategy:");
    eprintln!("  kind:        {}", s.kind);
    eprintln!("  strength:    {} ({:?})", s.pivot.strength, s.pivot.source);
    eprintln!(
        "  channel:     backcandles={} window={} {:?} {:?}",
        s.channel.backcandles, s.channel.window, s.channel.confirmation, s.channel.debounce
    );
    eprintln!("  heikin-ashi: {}", s.heikin_ashi);

    let b = &config.simulation;
    eprintln!("\nSimulation:");
    eprintln!("  capital: {:.2}", b.initial_capital);
    eprintln!(
        "  risk:    {:.2}% x{}",
        b.risk_pct * 100.0,
        b.reward_multiple
    );
    eprintln!(
        "  entry:   {:?}, stop: {:?}, target: {:?}, side: {:?}",
        b.entry, b.stop, b.target, b.side
    );

    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

fn run_info(config_path: &PathBuf, symbol: Option<&str>) -> ExitCode {
    let config = match load_run_config(config_path, symbol) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let adapter = CsvCandleAdapter::new(config.data.dir.clone());
    let interval = &config.data.interval;

    for s in &config.data.symbols {
        match adapter.get_data_range(s, interval) {
            Ok(Some((first, last, count))) => {
                println!(
                    "{} ({}): {} candles, {} to {}",
                    s, interval, count, first, last
                );
            }
            Ok(None) => {
                eprintln!("{} ({}): no data found", s, interval);
            }
            Err(e) => {
                eprintln!("error querying {} ({}): {}", s, interval, e);
            }
        }
    }

    match unconfigured_symbols(&adapter, &config) {
        Ok(extra) if !extra.is_empty() => {
            eprintln!("also available at {}: {}", interval, extra.join(", "));
        }
        Ok(_) => {}
        Err(e) => {
            eprintln!("error listing symbols: {e}");
        }
    }
    ExitCode::SUCCESS
}

/// Symbols the data source holds at the configured interval that the run
/// does not include.
pub fn unconfigured_symbols(
    data_port: &dyn CandlePort,
    config: &RunConfig,
) -> Result<Vec<String>, ZonetraderError> {
    let available = data_port.list_symbols(&config.data.interval)?;
    Ok(available
        .into_iter()
        .filter(|s| !config.data.symbols.contains(s))
        .collect())
}
