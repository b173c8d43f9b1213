//! Regression-channel breakout detection.
//!
//! For a candle at `index`, pivots are collected from the trailing window
//! `[index-backcandles-window, index-window)`, one OLS line is fitted through
//! the pivot highs and one through the pivot lows, and both lines are
//! projected to `index`. A close below the lower line is a sell breakout, a
//! close above the upper line a buy breakout.

use tracing::debug;

use super::annotation::CandleAnnotation;
use super::candle::Candle;
use super::pivot::{self, PivotConfig, PivotKind, PriceSource};
use super::regression::{self, Line};
use super::signal::{Direction, Signal, SignalSource};

pub const MIN_POINTS_PER_SIDE: usize = 2;
pub const MIN_POINTS_TOTAL: usize = 5;

/// How repeated breakouts are suppressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DebouncePolicy {
    /// Suppress a breakout within one candle of the last emitted one.
    #[default]
    MinGap,
    /// Suppress until a candle closes back inside a fitted channel.
    ReturnInside,
}

impl DebouncePolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "gap" | "min_gap" => Some(DebouncePolicy::MinGap),
            "inside" | "return_inside" => Some(DebouncePolicy::ReturnInside),
            _ => None,
        }
    }
}

/// What counts as a breakout once the channel is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BreakoutConfirmation {
    /// Close beyond the line.
    #[default]
    CloseOnly,
    /// Previous candle straddles the line and closes beyond it, current candle
    /// opens and closes beyond it.
    TwoCandle,
}

impl BreakoutConfirmation {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "close" | "close_only" => Some(BreakoutConfirmation::CloseOnly),
            "two_candle" | "confirmed" => Some(BreakoutConfirmation::TwoCandle),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelParams {
    pub backcandles: usize,
    pub window: usize,
    pub confirmation: BreakoutConfirmation,
    pub debounce: DebouncePolicy,
}

impl Default for ChannelParams {
    fn default() -> Self {
        ChannelParams {
            backcandles: 40,
            window: 4,
            confirmation: BreakoutConfirmation::CloseOnly,
            debounce: DebouncePolicy::MinGap,
        }
    }
}

impl ChannelParams {
    /// First index at which a channel can be evaluated.
    pub fn first_index(&self) -> usize {
        self.backcandles + self.window
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Channel {
    pub lower: Line,
    pub upper: Line,
    pub high_points: usize,
    pub low_points: usize,
}

/// Fit the channel for `index` from trailing pivots, positioned by their
/// index in the full series.
pub fn fit_channel(
    candles: &[Candle],
    index: usize,
    backcandles: usize,
    window: usize,
) -> Option<Channel> {
    if index < backcandles + window || index >= candles.len() {
        return None;
    }

    let start = index - backcandles - window;
    let local = &candles[start..index - window];
    let config = PivotConfig {
        strength: window,
        source: PriceSource::HighLow,
    };

    let mut highs = Vec::new();
    let mut lows = Vec::new();
    for p in pivot::detect(local, &config) {
        let x = (start + p.index) as f64;
        match p.kind {
            PivotKind::High => highs.push((x, local[p.index].high)),
            PivotKind::Low => lows.push((x, local[p.index].low)),
            PivotKind::Both => {}
        }
    }

    if highs.len() < MIN_POINTS_PER_SIDE
        || lows.len() < MIN_POINTS_PER_SIDE
        || highs.len() + lows.len() < MIN_POINTS_TOTAL
    {
        return None;
    }

    Some(Channel {
        lower: regression::fit(&lows)?,
        upper: regression::fit(&highs)?,
        high_points: highs.len(),
        low_points: lows.len(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Evaluation {
    NoChannel,
    Inside { lower: f64, upper: f64 },
    Breakout(Signal),
}

/// Classify the candle at `index` against its channel.
pub fn classify(candles: &[Candle], index: usize, params: &ChannelParams) -> Evaluation {
    let Some(current) = candles.get(index).filter(|c| c.is_finite()) else {
        return Evaluation::NoChannel;
    };
    let Some(channel) = fit_channel(candles, index, params.backcandles, params.window) else {
        return Evaluation::NoChannel;
    };

    let x = index as f64;
    let lower = channel.lower.at(x);
    let upper = channel.upper.at(x);

    let direction = match params.confirmation {
        BreakoutConfirmation::CloseOnly => {
            if current.close < lower {
                Some(Direction::Sell)
            } else if current.close > upper {
                Some(Direction::Buy)
            } else {
                None
            }
        }
        BreakoutConfirmation::TwoCandle => confirmed_direction(candles, index, &channel),
    };

    match direction {
        Some(direction) => Evaluation::Breakout(Signal {
            index,
            direction,
            trigger_price: current.close,
            source: SignalSource::Channel { lower, upper },
        }),
        None if current.close >= lower && current.close <= upper => {
            Evaluation::Inside { lower, upper }
        }
        // beyond a line but not confirmed: neither a signal nor a return inside
        None => Evaluation::NoChannel,
    }
}

fn confirmed_direction(candles: &[Candle], index: usize, channel: &Channel) -> Option<Direction> {
    let prev_index = index.checked_sub(1)?;
    let prev = candles.get(prev_index).filter(|c| c.is_finite())?;
    let curr = &candles[index];
    let (px, cx) = (prev_index as f64, index as f64);

    let lower_prev = channel.lower.at(px);
    let lower_curr = channel.lower.at(cx);
    if prev.high > lower_prev
        && prev.close < lower_prev
        && curr.open < lower_curr
        && curr.close < lower_curr
    {
        return Some(Direction::Sell);
    }

    let upper_prev = channel.upper.at(px);
    let upper_curr = channel.upper.at(cx);
    if prev.low < upper_prev
        && prev.close > upper_prev
        && curr.open > upper_curr
        && curr.close > upper_curr
    {
        return Some(Direction::Buy);
    }

    None
}

/// Breakout signal at `index`, ignoring debounce.
pub fn evaluate(candles: &[Candle], index: usize, params: &ChannelParams) -> Option<Signal> {
    match classify(candles, index, params) {
        Evaluation::Breakout(signal) => Some(signal),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy)]
struct Debounce {
    policy: DebouncePolicy,
    last: Option<usize>,
    armed: bool,
}

impl Debounce {
    fn new(policy: DebouncePolicy) -> Self {
        Debounce {
            policy,
            last: None,
            armed: true,
        }
    }

    fn admit(&mut self, index: usize) -> bool {
        let ok = match self.policy {
            DebouncePolicy::MinGap => self.last.is_none_or(|k| index - k > 1),
            DebouncePolicy::ReturnInside => self.armed,
        };
        if ok {
            self.last = Some(index);
            self.armed = false;
        }
        ok
    }

    fn observe_inside(&mut self) {
        self.armed = true;
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChannelRun {
    pub signals: Vec<Signal>,
    pub annotations: Vec<CandleAnnotation>,
    /// Breakouts swallowed by the debounce policy.
    pub suppressed: usize,
}

/// Evaluate every candle from `first_index` on and apply the debounce policy.
pub fn scan(candles: &[Candle], params: &ChannelParams) -> ChannelRun {
    let pivot_config = PivotConfig {
        strength: params.window,
        source: PriceSource::HighLow,
    };
    let pivots = pivot::pivot_map(&pivot::detect(candles, &pivot_config), candles.len());

    let mut debounce = Debounce::new(params.debounce);
    let mut run = ChannelRun {
        annotations: Vec::with_capacity(candles.len()),
        ..ChannelRun::default()
    };

    for (index, candle) in candles.iter().enumerate() {
        let mut note = CandleAnnotation::new(index, candle.timestamp);
        note.pivot = pivots[index].map(|p| p.kind);

        if index >= params.first_index() {
            match classify(candles, index, params) {
                Evaluation::Breakout(signal) => {
                    if debounce.admit(index) {
                        note.signal = Some(signal.direction);
                        run.signals.push(signal);
                    } else {
                        debug!(index, "breakout suppressed by debounce");
                        run.suppressed += 1;
                    }
                }
                Evaluation::Inside { .. } => debounce.observe_inside(),
                Evaluation::NoChannel => {}
            }
        }

        run.annotations.push(note);
    }

    run
}
