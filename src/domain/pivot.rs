//! Pivot (fractal) detection over a symmetric lookback/lookahead window.
//!
//! A candle at index `i` is a pivot-high when its compared high is `>=` every
//! compared high in `[i-w, i-1]` and strictly `>` every compared high in
//! `[i+1, i+w]`. Ties therefore favour the earlier candle. Pivot-lows mirror
//! the rule on the low side.

use std::fmt;

use super::candle::Candle;

/// Which candle field the pivot rules compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PriceSource {
    /// high for the high rule, low for the low rule
    #[default]
    HighLow,
    /// close for both rules
    Close,
}

impl PriceSource {
    pub fn high_of(self, candle: &Candle) -> f64 {
        match self {
            PriceSource::HighLow => candle.high,
            PriceSource::Close => candle.close,
        }
    }

    pub fn low_of(self, candle: &Candle) -> f64 {
        match self {
            PriceSource::HighLow => candle.low,
            PriceSource::Close => candle.close,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "hl" | "high_low" | "highlow" => Some(PriceSource::HighLow),
            "close" => Some(PriceSource::Close),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PivotKind {
    High,
    Low,
    Both,
}

impl PivotKind {
    pub fn is_high(self) -> bool {
        matches!(self, PivotKind::High | PivotKind::Both)
    }

    pub fn is_low(self) -> bool {
        matches!(self, PivotKind::Low | PivotKind::Both)
    }
}

impl fmt::Display for PivotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PivotKind::High => write!(f, "HIGH"),
            PivotKind::Low => write!(f, "LOW"),
            PivotKind::Both => write!(f, "BOTH"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pivot {
    pub index: usize,
    pub kind: PivotKind,
    /// Compared high for `High`/`Both`, compared low for `Low`.
    pub value: f64,
    pub strength: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PivotConfig {
    pub strength: usize,
    pub source: PriceSource,
}

impl Default for PivotConfig {
    fn default() -> Self {
        PivotConfig {
            strength: 5,
            source: PriceSource::HighLow,
        }
    }
}

/// Smallest series length that can contain a pivot at this strength.
pub fn min_len(strength: usize) -> usize {
    2 * strength + 1
}

/// Classify the candle at `index`, or `None` when it is not a pivot or the
/// window does not fit.
pub fn classify(candles: &[Candle], index: usize, config: &PivotConfig) -> Option<PivotKind> {
    let w = config.strength;
    if w == 0 || index < w || index + w >= candles.len() {
        return None;
    }

    let window = &candles[index - w..=index + w];
    if window.iter().any(|c| !c.is_finite()) {
        return None;
    }

    let src = config.source;
    let current = &candles[index];
    let (before, after) = (&candles[index - w..index], &candles[index + 1..=index + w]);

    let high = src.high_of(current);
    let is_high = before.iter().all(|c| high >= src.high_of(c))
        && after.iter().all(|c| high > src.high_of(c));

    let low = src.low_of(current);
    let is_low = before.iter().all(|c| low <= src.low_of(c))
        && after.iter().all(|c| low < src.low_of(c));

    match (is_high, is_low) {
        (true, true) => Some(PivotKind::Both),
        (true, false) => Some(PivotKind::High),
        (false, true) => Some(PivotKind::Low),
        (false, false) => None,
    }
}

/// Scan the whole series and return every pivot in index order.
pub fn detect(candles: &[Candle], config: &PivotConfig) -> Vec<Pivot> {
    if candles.len() < min_len(config.strength) {
        return Vec::new();
    }

    (0..candles.len())
        .filter_map(|i| {
            let kind = classify(candles, i, config)?;
            let value = match kind {
                PivotKind::High | PivotKind::Both => config.source.high_of(&candles[i]),
                PivotKind::Low => config.source.low_of(&candles[i]),
            };
            Some(Pivot {
                index: i,
                kind,
                value,
                strength: config.strength,
            })
        })
        .collect()
}

/// Dense per-index view of `detect`, handy for annotating candles.
pub fn pivot_map(pivots: &[Pivot], len: usize) -> Vec<Option<Pivot>> {
    let mut map = vec![None; len];
    for p in pivots {
        if p.index < len {
            map[p.index] = Some(*p);
        }
    }
    map
}
