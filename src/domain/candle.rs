//! Candle representation and the ordered series the detectors read from.

use chrono::NaiveDateTime;
use std::ops::Deref;

use super::error::ZonetraderError;

#[derive(Debug, Clone, PartialEq)]
pub struct Candle {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    /// True when every price field is a usable number.
    pub fn is_finite(&self) -> bool {
        self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite()
    }
}

/// Immutable, strictly chronological sequence of candles.
///
/// Construction fails fast on duplicate or out-of-order timestamps. Non-finite
/// prices are kept; detectors skip them.
#[derive(Debug, Clone, Default)]
pub struct CandleSeries {
    candles: Vec<Candle>,
}

impl CandleSeries {
    pub fn new(candles: Vec<Candle>) -> Result<Self, ZonetraderError> {
        for (i, pair) in candles.windows(2).enumerate() {
            if pair[1].timestamp <= pair[0].timestamp {
                return Err(ZonetraderError::UnorderedSeries {
                    index: i + 1,
                    previous: pair[0].timestamp.to_string(),
                    timestamp: pair[1].timestamp.to_string(),
                });
            }
        }
        Ok(Self { candles })
    }

    /// Number of candles with a non-finite price field.
    pub fn malformed_count(&self) -> usize {
        self.candles.iter().filter(|c| !c.is_finite()).count()
    }
}

impl Deref for CandleSeries {
    type Target = [Candle];

    fn deref(&self) -> &[Candle] {
        &self.candles
    }
}
