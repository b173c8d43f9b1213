//! Support/resistance zone lifecycle.
//!
//! Zones are formed when a later close breaks an open pivot, stay `Valid`
//! until a close moves through their far bound, and gather retests while
//! price trades back into the band. Each candle is one explicit transition
//! `step(state, input) -> Step`; the state is consumed and a new one returned.
//!
//! Per candle, in order:
//! 1. invalidation of valid zones
//! 2. retests of zones that survived step 1
//! 3. formation from broken open pivots (with same-side pruning)
//! 4. registration of the current candle if it is a pivot

use std::fmt;

use tracing::debug;

use super::annotation::CandleAnnotation;
use super::candle::Candle;
use super::pivot::{pivot_map, Pivot, PivotKind, PriceSource};
use super::signal::{Direction, Signal, SignalSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneKind {
    Support,
    Resistance,
}

impl fmt::Display for ZoneKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ZoneKind::Support => write!(f, "SUPPORT"),
            ZoneKind::Resistance => write!(f, "RESISTANCE"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneStatus {
    Valid,
    Invalid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Retest {
    pub index: usize,
    pub zone_formed_at: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Zone {
    pub kind: ZoneKind,
    pub low: f64,
    pub high: f64,
    pub formed_at: usize,
    /// Index of the pivot whose break formed this zone.
    pub pivot_index: usize,
    pub status: ZoneStatus,
    pub invalidated_at: Option<usize>,
    pub retests: Vec<Retest>,
}

impl Zone {
    pub fn new(kind: ZoneKind, a: f64, b: f64, formed_at: usize, pivot_index: usize) -> Self {
        Zone {
            kind,
            low: a.min(b),
            high: a.max(b),
            formed_at,
            pivot_index,
            status: ZoneStatus::Valid,
            invalidated_at: None,
            retests: Vec::new(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.status == ZoneStatus::Valid
    }

    /// Close beyond the far bound in the adverse direction.
    pub fn is_invalidated_by(&self, close: f64) -> bool {
        match self.kind {
            ZoneKind::Support => close < self.low,
            ZoneKind::Resistance => close > self.high,
        }
    }

    /// Candle trades back into the band while closing on the zone's side.
    pub fn is_retested_by(&self, candle: &Candle) -> bool {
        match self.kind {
            ZoneKind::Support => candle.close > self.low && candle.low <= self.high,
            ZoneKind::Resistance => candle.close < self.high && candle.high >= self.low,
        }
    }

    /// `low*(1-pct) <= price <= high*(1+pct)`
    pub fn is_near(&self, price: f64, pct: f64) -> bool {
        price >= self.low * (1.0 - pct) && price <= self.high * (1.0 + pct)
    }

    fn invalidate(&mut self, index: usize) {
        // Invalid is terminal
        if self.is_valid() {
            self.status = ZoneStatus::Invalid;
            self.invalidated_at = Some(index);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PivotSide {
    Up,
    Down,
}

/// A registered pivot waiting to be broken.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpenPivot {
    pub index: usize,
    pub side: PivotSide,
    pub value: f64,
}

impl OpenPivot {
    pub fn is_broken_by(&self, close: f64) -> bool {
        match self.side {
            PivotSide::Up => close > self.value,
            PivotSide::Down => close < self.value,
        }
    }

    /// Same side and closer to price than a pivot at `value` on that side.
    fn is_pruned_by(&self, side: PivotSide, value: f64) -> bool {
        self.side == side
            && match side {
                PivotSide::Up => self.value < value,
                PivotSide::Down => self.value > value,
            }
    }

    /// Open entries a pivot candle contributes. `Both` registers on each side.
    pub fn from_pivot(
        index: usize,
        kind: PivotKind,
        candle: &Candle,
        source: PriceSource,
    ) -> Vec<OpenPivot> {
        let mut out = Vec::with_capacity(2);
        if kind.is_high() {
            out.push(OpenPivot {
                index,
                side: PivotSide::Up,
                value: source.high_of(candle),
            });
        }
        if kind.is_low() {
            out.push(OpenPivot {
                index,
                side: PivotSide::Down,
                value: source.low_of(candle),
            });
        }
        out
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ZoneState {
    /// Every zone ever formed, in formation order. Invalid zones stay here.
    pub zones: Vec<Zone>,
    pub open_pivots: Vec<OpenPivot>,
}

impl ZoneState {
    pub fn valid_zones(&self) -> impl Iterator<Item = &Zone> {
        self.zones.iter().filter(|z| z.is_valid())
    }

    pub fn is_near_valid_zone(&self, price: f64, pct: f64) -> bool {
        self.valid_zones().any(|z| z.is_near(price, pct))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct StepInput<'a> {
    pub index: usize,
    pub candle: &'a Candle,
    pub previous: Option<&'a Candle>,
    /// Pivot classification of the current candle, if any.
    pub pivot: Option<PivotKind>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneEvent {
    Invalidated { zone: usize },
    Retested { zone: usize },
    Formed { zone: usize, pivot_index: usize },
}

#[derive(Debug, Clone)]
pub struct Step {
    pub state: ZoneState,
    pub signal: Option<Signal>,
    pub events: Vec<ZoneEvent>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneConfig {
    pub source: PriceSource,
    /// Proximity band for `near_zone` annotations, as a fraction.
    pub near_zone_pct: f64,
}

impl Default for ZoneConfig {
    fn default() -> Self {
        ZoneConfig {
            source: PriceSource::HighLow,
            near_zone_pct: 0.005,
        }
    }
}

/// Advance the zone state by one candle.
pub fn step(state: ZoneState, input: StepInput<'_>, config: &ZoneConfig) -> Step {
    let ZoneState {
        mut zones,
        open_pivots,
    } = state;
    let candle = input.candle;
    let close = candle.close;
    let mut events = Vec::new();

    // 1. invalidation
    let mut survivors = Vec::new();
    for (id, zone) in zones.iter_mut().enumerate().filter(|(_, z)| z.is_valid()) {
        if zone.is_invalidated_by(close) {
            zone.invalidate(input.index);
            events.push(ZoneEvent::Invalidated { zone: id });
        } else {
            survivors.push(id);
        }
    }

    // 2. retests
    for id in survivors {
        let zone = &mut zones[id];
        if zone.is_retested_by(candle) {
            zone.retests.push(Retest {
                index: input.index,
                zone_formed_at: zone.formed_at,
            });
            events.push(ZoneEvent::Retested { zone: id });
        }
    }

    // 3. formation
    let previous = input.previous.filter(|p| p.is_finite()).unwrap_or(candle);
    let mut signal = None;
    let mut breaks: Vec<OpenPivot> = Vec::new();
    let mut open = Vec::with_capacity(open_pivots.len() + 2);

    for pivot in open_pivots {
        if breaks.iter().any(|b| pivot.is_pruned_by(b.side, b.value)) {
            continue;
        }
        if !pivot.is_broken_by(close) {
            open.push(pivot);
            continue;
        }

        let zone = match pivot.side {
            PivotSide::Up => Zone::new(
                ZoneKind::Support,
                candle.low,
                previous.high,
                input.index,
                pivot.index,
            ),
            PivotSide::Down => Zone::new(
                ZoneKind::Resistance,
                previous.low,
                candle.high,
                input.index,
                pivot.index,
            ),
        };
        let id = zones.len();
        debug!(
            index = input.index,
            pivot = pivot.index,
            kind = %zone.kind,
            low = zone.low,
            high = zone.high,
            "zone formed"
        );
        events.push(ZoneEvent::Formed {
            zone: id,
            pivot_index: pivot.index,
        });

        // earliest-registered break wins the candle's signal
        if signal.is_none() {
            signal = Some(Signal {
                index: input.index,
                direction: match zone.kind {
                    ZoneKind::Support => Direction::Buy,
                    ZoneKind::Resistance => Direction::Sell,
                },
                trigger_price: close,
                source: SignalSource::Zone {
                    zone: id,
                    pivot_index: pivot.index,
                },
            });
        }

        zones.push(zone);
        breaks.push(pivot);
    }

    open.retain(|p| !breaks.iter().any(|b| p.is_pruned_by(b.side, b.value)));

    // 4. registration
    if let Some(kind) = input.pivot {
        open.extend(OpenPivot::from_pivot(input.index, kind, candle, config.source));
    }

    Step {
        state: ZoneState {
            zones,
            open_pivots: open,
        },
        signal,
        events,
    }
}

/// Everything a full pass over a series produced.
#[derive(Debug, Clone, Default)]
pub struct ZoneRun {
    pub zones: Vec<Zone>,
    pub open_pivots: Vec<OpenPivot>,
    pub signals: Vec<Signal>,
    pub annotations: Vec<CandleAnnotation>,
}

/// Drive `step` over every candle in order.
pub fn run(candles: &[Candle], pivots: &[Pivot], config: &ZoneConfig) -> ZoneRun {
    let by_index = pivot_map(pivots, candles.len());
    let mut state = ZoneState::default();
    let mut signals = Vec::new();
    let mut annotations = Vec::with_capacity(candles.len());

    for (index, candle) in candles.iter().enumerate() {
        let mut note = CandleAnnotation::new(index, candle.timestamp);
        if !candle.is_finite() {
            annotations.push(note);
            continue;
        }

        let pivot = by_index[index].map(|p| p.kind);
        let out = step(
            state,
            StepInput {
                index,
                candle,
                previous: index.checked_sub(1).map(|i| &candles[i]),
                pivot,
            },
            config,
        );
        state = out.state;

        note.pivot = pivot;
        for event in out.events {
            match event {
                ZoneEvent::Invalidated { zone } => note.invalidated.push(zone),
                ZoneEvent::Retested { zone } => note.retested.push(zone),
                ZoneEvent::Formed { zone, .. } => note.formed.push(zone),
            }
        }
        note.signal = out.signal.map(|s| s.direction);
        note.near_zone = state.is_near_valid_zone(candle.close, config.near_zone_pct);
        annotations.push(note);

        if let Some(signal) = out.signal {
            signals.push(signal);
        }
    }

    ZoneRun {
        zones: state.zones,
        open_pivots: state.open_pivots,
        signals,
        annotations,
    }
}
