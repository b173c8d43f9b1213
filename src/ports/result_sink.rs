//! Result output port trait.

use crate::domain::error::ZonetraderError;
use crate::domain::metrics::Metrics;
use crate::domain::simulator::BacktestResult;
use crate::domain::strategy::{StrategyConfig, StrategyRun};

/// Everything produced for one symbol.
pub struct SymbolReport<'a> {
    pub symbol: &'a str,
    pub interval: &'a str,
    pub strategy: &'a StrategyConfig,
    pub run: &'a StrategyRun,
    /// Absent for signal-only scans.
    pub result: Option<&'a BacktestResult>,
    pub metrics: Option<&'a Metrics>,
}

/// Port for persisting per-symbol output.
pub trait ResultSink: Send + Sync {
    fn write(&self, report: &SymbolReport<'_>) -> Result<(), ZonetraderError>;
}
