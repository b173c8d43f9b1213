//! Trade signals emitted by the zone and channel detectors.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Buy,
    Sell,
}

impl Direction {
    pub fn is_long(self) -> bool {
        self == Direction::Buy
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Buy => write!(f, "BUY"),
            Direction::Sell => write!(f, "SELL"),
        }
    }
}

/// What produced a signal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SignalSource {
    /// Zone formed at `zone` (position in the run's zone list) from the pivot
    /// registered at `pivot_index`.
    Zone { zone: usize, pivot_index: usize },
    /// Close escaped the fitted channel; line values at the signal index.
    Channel { lower: f64, upper: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Signal {
    pub index: usize,
    pub direction: Direction,
    pub trigger_price: f64,
    pub source: SignalSource,
}

impl Signal {
    /// "Breakout High" / "Breakout Low" for channel signals, "Support" /
    /// "Resistance" for zone signals.
    pub fn label(&self) -> &'static str {
        match (self.source, self.direction) {
            (SignalSource::Channel { .. }, Direction::Buy) => "Breakout High",
            (SignalSource::Channel { .. }, Direction::Sell) => "Breakout Low",
            (SignalSource::Zone { .. }, Direction::Buy) => "Support",
            (SignalSource::Zone { .. }, Direction::Sell) => "Resistance",
        }
    }
}
