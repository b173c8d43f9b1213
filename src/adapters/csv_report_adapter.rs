//! CSV result writer.
//!
//! Per symbol: `<SYMBOL>_<interval>_trades.csv` and a one-row
//! `<SYMBOL>_<interval>_summary.csv` (when a backtest ran),
//! `<SYMBOL>_<interval>_signals.csv` and, optionally,
//! `<SYMBOL>_<interval>_annotations.csv`.

use crate::domain::annotation::CandleAnnotation;
use crate::domain::candle::Candle;
use crate::domain::error::ZonetraderError;
use crate::domain::metrics::Metrics;
use crate::domain::signal::Signal;
use crate::domain::simulator::{BacktestResult, Trade};
use crate::ports::result_sink::{ResultSink, SymbolReport};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Serialize)]
struct TradeRow {
    direction: String,
    signal_time: String,
    entry_time: String,
    entry_price: f64,
    stop_loss: f64,
    take_profit: f64,
    exit_time: Option<String>,
    exit_price: Option<f64>,
    bars_held: Option<usize>,
    outcome: String,
    capital_after: f64,
}

#[derive(Debug, Serialize)]
struct SummaryRow<'a> {
    symbol: &'a str,
    interval: &'a str,
    strategy: String,
    heikin_ashi: bool,
    trades: usize,
    wins: usize,
    losses: usize,
    open: usize,
    dropped_signals: usize,
    initial_capital: f64,
    final_capital: f64,
    growth_pct: f64,
    win_rate_pct: f64,
    max_drawdown_pct: f64,
    avg_bars_held: f64,
    max_consecutive_losses: usize,
    profit_factor: f64,
}

#[derive(Debug, Serialize)]
struct SignalRow {
    timestamp: String,
    index: usize,
    direction: String,
    label: &'static str,
    trigger_price: f64,
}

#[derive(Debug, Serialize)]
struct AnnotationRow {
    timestamp: String,
    index: usize,
    pivot: Option<String>,
    formed: usize,
    invalidated: usize,
    retested: usize,
    signal: Option<String>,
    near_zone: bool,
}

fn format_time(candles: &[Candle], index: usize) -> String {
    candles
        .get(index)
        .map(|c| c.timestamp.format(TIMESTAMP_FORMAT).to_string())
        .unwrap_or_default()
}

fn trade_row(trade: &Trade, candles: &[Candle]) -> TradeRow {
    TradeRow {
        direction: trade.direction.to_string(),
        signal_time: format_time(candles, trade.signal_index),
        entry_time: format_time(candles, trade.entry_index),
        entry_price: trade.entry_price,
        stop_loss: trade.stop_loss,
        take_profit: trade.take_profit,
        exit_time: trade.exit_index.map(|i| format_time(candles, i)),
        exit_price: trade.exit_price,
        bars_held: trade.bars_held(),
        outcome: trade.outcome.to_string(),
        capital_after: trade.capital_after,
    }
}

fn summary_row<'a>(
    report: &SymbolReport<'a>,
    result: &BacktestResult,
    metrics: &Metrics,
) -> SummaryRow<'a> {
    SummaryRow {
        symbol: report.symbol,
        interval: report.interval,
        strategy: report.strategy.kind.to_string(),
        heikin_ashi: report.strategy.heikin_ashi,
        trades: metrics.total_trades,
        wins: metrics.wins,
        losses: metrics.losses,
        open: metrics.open,
        dropped_signals: result.dropped_signals,
        initial_capital: result.initial_capital,
        final_capital: result.final_capital,
        growth_pct: result.growth_pct,
        win_rate_pct: result.win_rate_pct,
        max_drawdown_pct: metrics.max_drawdown * 100.0,
        avg_bars_held: metrics.avg_bars_held,
        max_consecutive_losses: metrics.max_consecutive_losses,
        profit_factor: metrics.profit_factor,
    }
}

fn signal_row(signal: &Signal, candles: &[Candle]) -> SignalRow {
    SignalRow {
        timestamp: format_time(candles, signal.index),
        index: signal.index,
        direction: signal.direction.to_string(),
        label: signal.label(),
        trigger_price: signal.trigger_price,
    }
}

fn annotation_row(note: &CandleAnnotation) -> AnnotationRow {
    AnnotationRow {
        timestamp: note.timestamp.format(TIMESTAMP_FORMAT).to_string(),
        index: note.index,
        pivot: note.pivot.map(|p| p.to_string()),
        formed: note.formed.len(),
        invalidated: note.invalidated.len(),
        retested: note.retested.len(),
        signal: note.signal.map(|d| d.to_string()),
        near_zone: note.near_zone,
    }
}

pub struct CsvReportAdapter {
    output_dir: PathBuf,
    annotations: bool,
}

impl CsvReportAdapter {
    pub fn new(output_dir: PathBuf, annotations: bool) -> Self {
        Self {
            output_dir,
            annotations,
        }
    }

    fn path_for(&self, report: &SymbolReport<'_>, kind: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}_{}_{}.csv", report.symbol, report.interval, kind))
    }
}

fn write_rows<T: Serialize>(
    path: &Path,
    rows: impl IntoIterator<Item = T>,
) -> Result<(), ZonetraderError> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| ZonetraderError::Report {
        reason: format!("failed to create {}: {}", path.display(), e),
    })?;
    for row in rows {
        writer.serialize(row).map_err(|e| ZonetraderError::Report {
            reason: format!("failed to write {}: {}", path.display(), e),
        })?;
    }
    writer.flush()?;
    Ok(())
}

impl ResultSink for CsvReportAdapter {
    fn write(&self, report: &SymbolReport<'_>) -> Result<(), ZonetraderError> {
        fs::create_dir_all(&self.output_dir)?;
        let candles = &report.run.candles;

        if let Some(result) = report.result {
            let path = self.path_for(report, "trades");
            write_rows(&path, result.trades.iter().map(|t| trade_row(t, candles)))?;
            info!(
                symbol = report.symbol,
                path = %path.display(),
                "trade ledger written"
            );

            let metrics = match report.metrics {
                Some(m) => m.clone(),
                None => Metrics::compute(result),
            };
            let path = self.path_for(report, "summary");
            write_rows(&path, [summary_row(report, result, &metrics)])?;
        }

        let path = self.path_for(report, "signals");
        write_rows(&path, report.run.signals.iter().map(|s| signal_row(s, candles)))?;

        if self.annotations {
            let path = self.path_for(report, "annotations");
            write_rows(&path, report.run.annotations.iter().map(annotation_row))?;
        }

        Ok(())
    }
}
