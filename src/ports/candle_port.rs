//! Candle data port trait.

use crate::domain::candle::Candle;
use crate::domain::error::ZonetraderError;
use chrono::{NaiveDate, NaiveDateTime};

/// Source of historical candles. Shared across worker threads.
pub trait CandlePort: Send + Sync {
    /// Candles for `symbol` at `interval`, ascending by timestamp, limited to
    /// the inclusive date range when bounds are given.
    fn fetch_candles(
        &self,
        symbol: &str,
        interval: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<Candle>, ZonetraderError>;

    fn list_symbols(&self, interval: &str) -> Result<Vec<String>, ZonetraderError>;

    /// First timestamp, last timestamp and candle count, if any data exists.
    fn get_data_range(
        &self,
        symbol: &str,
        interval: &str,
    ) -> Result<Option<(NaiveDateTime, NaiveDateTime, usize)>, ZonetraderError>;
}
