//! Per-candle diagnostic records handed to the result sink.

use chrono::NaiveDateTime;

use super::pivot::PivotKind;
use super::signal::Direction;

#[derive(Debug, Clone, PartialEq)]
pub struct CandleAnnotation {
    pub index: usize,
    pub timestamp: NaiveDateTime,
    pub pivot: Option<PivotKind>,
    /// Zones (by position in the run's zone list) formed on this candle.
    pub formed: Vec<usize>,
    pub invalidated: Vec<usize>,
    pub retested: Vec<usize>,
    pub signal: Option<Direction>,
    /// Close sits within the proximity band of a valid zone.
    pub near_zone: bool,
}

impl CandleAnnotation {
    pub fn new(index: usize, timestamp: NaiveDateTime) -> Self {
        CandleAnnotation {
            index,
            timestamp,
            pivot: None,
            formed: Vec::new(),
            invalidated: Vec::new(),
            retested: Vec::new(),
            signal: None,
            near_zone: false,
        }
    }

    /// True when nothing happened on this candle.
    pub fn is_quiet(&self) -> bool {
        self.pivot.is_none()
            && self.formed.is_empty()
            && self.invalidated.is_empty()
            && self.retested.is_empty()
            && self.signal.is_none()
            && !self.near_zone
    }
}
