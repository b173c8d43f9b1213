//! Symbol lists and per-symbol data loading.
//!
//! Parses symbol lists from configuration and checks that each symbol has
//! enough candles for the selected detector.

use crate::domain::candle::CandleSeries;
use crate::domain::error::ZonetraderError;
use crate::ports::candle_port::CandlePort;
use chrono::NaiveDate;
use std::collections::HashSet;

#[derive(Debug, Clone, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in symbol list")]
    EmptyToken,

    #[error("duplicate symbol: {0}")]
    DuplicateSymbol(String),
}

pub fn parse_symbols(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut symbols = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let symbol = trimmed.to_uppercase();
        if !seen.insert(symbol.clone()) {
            return Err(UniverseError::DuplicateSymbol(symbol));
        }
        symbols.push(symbol);
    }

    Ok(symbols)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    NoData,
    InsufficientBars { bars: usize },
    Rejected(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedSymbol {
    pub symbol: String,
    pub reason: SkipReason,
}

impl SkippedSymbol {
    pub fn from_error(symbol: &str, err: &ZonetraderError) -> Self {
        let reason = match err {
            ZonetraderError::NoData { .. } => SkipReason::NoData,
            ZonetraderError::InsufficientData { bars, .. } => {
                SkipReason::InsufficientBars { bars: *bars }
            }
            other => SkipReason::Rejected(other.to_string()),
        };
        SkippedSymbol {
            symbol: symbol.to_string(),
            reason,
        }
    }
}

/// Fetch and order-check one symbol's candles.
pub fn load_series(
    port: &dyn CandlePort,
    symbol: &str,
    interval: &str,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    minimum: usize,
) -> Result<CandleSeries, ZonetraderError> {
    let candles = port.fetch_candles(symbol, interval, start, end)?;
    if candles.is_empty() {
        return Err(ZonetraderError::NoData {
            symbol: symbol.to_string(),
            interval: interval.to_string(),
        });
    }
    if candles.len() < minimum {
        return Err(ZonetraderError::InsufficientData {
            symbol: symbol.to_string(),
            bars: candles.len(),
            minimum,
        });
    }
    CandleSeries::new(candles)
}
