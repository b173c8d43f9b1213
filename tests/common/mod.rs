#![allow(dead_code)]

use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::collections::HashMap;
use std::path::PathBuf;
use zonetrader::domain::candle::Candle;
use zonetrader::domain::config_validation::{DataConfig, ReportConfig, RunConfig};
use zonetrader::domain::error::ZonetraderError;
use zonetrader::domain::simulator::SimulationConfig;
use zonetrader::domain::strategy::StrategyConfig;
use zonetrader::ports::candle_port::CandlePort;

pub struct MockCandlePort {
    pub data: HashMap<String, Vec<Candle>>,
    pub errors: HashMap<String, String>,
}

impl MockCandlePort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_candles(mut self, symbol: &str, candles: Vec<Candle>) -> Self {
        self.data.insert(symbol.to_string(), candles);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl CandlePort for MockCandlePort {
    fn fetch_candles(
        &self,
        symbol: &str,
        _interval: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<Candle>, ZonetraderError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(ZonetraderError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(symbol)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter(|c| {
                let d = c.timestamp.date();
                start.is_none_or(|s| d >= s) && end.is_none_or(|e| d <= e)
            })
            .collect())
    }

    fn list_symbols(&self, _interval: &str) -> Result<Vec<String>, ZonetraderError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }

    fn get_data_range(
        &self,
        symbol: &str,
        _interval: &str,
    ) -> Result<Option<(NaiveDateTime, NaiveDateTime, usize)>, ZonetraderError> {
        match self.data.get(symbol) {
            Some(candles) if !candles.is_empty() => {
                let first = candles.first().unwrap().timestamp;
                let last = candles.last().unwrap().timestamp;
                Ok(Some((first, last, candles.len())))
            }
            _ => Ok(None),
        }
    }
}

pub fn day(i: usize) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(9, 15, 0)
        .unwrap()
        + Duration::days(i as i64)
}

pub fn make_candle(i: usize, open: f64, high: f64, low: f64, close: f64) -> Candle {
    Candle {
        timestamp: day(i),
        open,
        high,
        low,
        close,
        volume: 1000.0,
    }
}

/// Candles from `(high, low)` pairs; open/close sit at the midpoint.
pub fn hl_candles(pairs: &[(f64, f64)]) -> Vec<Candle> {
    pairs
        .iter()
        .enumerate()
        .map(|(i, &(h, l))| make_candle(i, (h + l) / 2.0, h, l, (h + l) / 2.0))
        .collect()
}

/// Candles from closes with a one-point range either side.
pub fn close_candles(closes: &[f64]) -> Vec<Candle> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| make_candle(i, c, c + 1.0, c - 1.0, c))
        .collect()
}

/// Period-4 oscillation between 101 and 109 around 105.
pub fn zigzag(count: usize) -> Vec<Candle> {
    let mids = [101.0, 105.0, 109.0, 105.0];
    close_candles(&(0..count).map(|i| mids[i % 4]).collect::<Vec<_>>())
}

pub fn sample_run_config(symbols: &[&str]) -> RunConfig {
    RunConfig {
        data: DataConfig {
            dir: PathBuf::from("unused"),
            symbols: symbols.iter().map(|s| s.to_string()).collect(),
            interval: "1d".to_string(),
            start: None,
            end: None,
        },
        strategy: StrategyConfig::default(),
        simulation: SimulationConfig::default(),
        report: ReportConfig {
            output_dir: None,
            annotations: true,
        },
    }
}
