//! CSV file candle adapter.
//!
//! One file per symbol and interval: `<dir>/<SYMBOL>_<interval>.csv` with a
//! header row `timestamp,open,high,low,close,volume` (`date` is accepted in
//! place of `timestamp`, volume may be empty).

use crate::domain::candle::Candle;
use crate::domain::error::ZonetraderError;
use crate::ports::candle_port::CandlePort;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::debug;

const TIMESTAMP_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

#[derive(Debug, Deserialize)]
struct CandleRow {
    #[serde(alias = "date", alias = "time")]
    timestamp: String,
    // blank prices load as NaN and the detectors skip the row
    open: Option<f64>,
    high: Option<f64>,
    low: Option<f64>,
    close: Option<f64>,
    #[serde(default)]
    volume: Option<f64>,
}

pub struct CsvCandleAdapter {
    base_path: PathBuf,
}

impl CsvCandleAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str, interval: &str) -> PathBuf {
        self.base_path.join(format!("{}_{}.csv", symbol, interval))
    }

    fn read_all(&self, symbol: &str, interval: &str) -> Result<Vec<Candle>, ZonetraderError> {
        let path = self.csv_path(symbol, interval);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(ZonetraderError::NoData {
                    symbol: symbol.to_string(),
                    interval: interval.to_string(),
                });
            }
            Err(e) => {
                return Err(ZonetraderError::Data {
                    reason: format!("failed to read {}: {}", path.display(), e),
                });
            }
        };

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());
        let mut candles = Vec::new();

        for (line, result) in rdr.deserialize::<CandleRow>().enumerate() {
            let row = result.map_err(|e| ZonetraderError::Data {
                reason: format!("{}: CSV parse error: {}", path.display(), e),
            })?;
            let timestamp = parse_timestamp(&row.timestamp).ok_or_else(|| ZonetraderError::Data {
                reason: format!(
                    "{}: invalid timestamp '{}' on row {}",
                    path.display(),
                    row.timestamp,
                    line + 1
                ),
            })?;

            candles.push(Candle {
                timestamp,
                open: row.open.unwrap_or(f64::NAN),
                high: row.high.unwrap_or(f64::NAN),
                low: row.low.unwrap_or(f64::NAN),
                close: row.close.unwrap_or(f64::NAN),
                volume: row.volume.unwrap_or(0.0),
            });
        }

        candles.sort_by_key(|c| c.timestamp);
        debug!(
            symbol,
            interval,
            candles = candles.len(),
            "loaded csv candles"
        );
        Ok(candles)
    }
}

pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

impl CandlePort for CsvCandleAdapter {
    fn fetch_candles(
        &self,
        symbol: &str,
        interval: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<Candle>, ZonetraderError> {
        let mut candles = self.read_all(symbol, interval)?;
        candles.retain(|c| {
            let date = c.timestamp.date();
            start.is_none_or(|s| date >= s) && end.is_none_or(|e| date <= e)
        });
        Ok(candles)
    }

    fn list_symbols(&self, interval: &str) -> Result<Vec<String>, ZonetraderError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| ZonetraderError::Data {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let suffix = format!("_{}.csv", interval);
        let mut symbols = Vec::new();

        for entry in entries {
            let entry = entry?;
            let name = entry.file_name();
            let name_str = name.to_string_lossy();

            if let Some(symbol) = name_str.strip_suffix(&suffix) {
                symbols.push(symbol.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }

    fn get_data_range(
        &self,
        symbol: &str,
        interval: &str,
    ) -> Result<Option<(NaiveDateTime, NaiveDateTime, usize)>, ZonetraderError> {
        let candles = match self.read_all(symbol, interval) {
            Ok(candles) => candles,
            Err(ZonetraderError::NoData { .. }) => return Ok(None),
            Err(e) => return Err(e),
        };
        Ok(match (candles.first(), candles.last()) {
            (Some(first), Some(last)) => Some((first.timestamp, last.timestamp, candles.len())),
            _ => None,
        })
    }
}
