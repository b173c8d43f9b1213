//! Trade simulation from a signal stream.
//!
//! One position at a time: a signal that arrives while a trade is open is
//! dropped. Exits are scanned candle by candle after the entry candle; a
//! candle touching both the stop and the target closes the trade at the stop.
//! Capital compounds: a loss costs `risk_pct` of current capital, a win earns
//! `risk_pct * reward_multiple` of it.

use std::fmt;

use tracing::{debug, warn};

use super::candle::Candle;
use super::signal::{Direction, Signal};

/// Where the entry fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntryRule {
    /// At the signal candle's close.
    #[default]
    SignalClose,
    /// Stop order at the signal candle's high (buy) or low (sell), live for
    /// the next candle only.
    PreviousBreak,
}

impl EntryRule {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "close" | "signal_close" => Some(EntryRule::SignalClose),
            "previous_break" | "break" => Some(EntryRule::PreviousBreak),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum StopRule {
    /// Stop distance is `entry * risk_pct`.
    #[default]
    RiskPct,
    /// Signal candle's opposite extreme, pushed out by `buffer`.
    Structural { buffer: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum TargetRule {
    /// Target distance is the stop distance times `reward_multiple`.
    #[default]
    RewardMultiple,
    /// Target at `entry * (1 ± pct)`.
    Percent(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TradeSide {
    #[default]
    Both,
    LongOnly,
    ShortOnly,
}

impl TradeSide {
    pub fn allows(self, direction: Direction) -> bool {
        match self {
            TradeSide::Both => true,
            TradeSide::LongOnly => direction == Direction::Buy,
            TradeSide::ShortOnly => direction == Direction::Sell,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "both" => Some(TradeSide::Both),
            "buy" | "long" => Some(TradeSide::LongOnly),
            "sell" | "short" => Some(TradeSide::ShortOnly),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub initial_capital: f64,
    /// Fraction of capital lost on a losing trade.
    pub risk_pct: f64,
    pub reward_multiple: f64,
    pub entry: EntryRule,
    pub stop: StopRule,
    pub target: TargetRule,
    pub side: TradeSide,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            initial_capital: 100_000.0,
            risk_pct: 0.01,
            reward_multiple: 2.0,
            entry: EntryRule::SignalClose,
            stop: StopRule::RiskPct,
            target: TargetRule::RewardMultiple,
            side: TradeSide::Both,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Win,
    Loss,
    Open,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Win => write!(f, "WIN"),
            Outcome::Loss => write!(f, "LOSS"),
            Outcome::Open => write!(f, "OPEN"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub direction: Direction,
    pub signal_index: usize,
    pub entry_index: usize,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub exit_index: Option<usize>,
    pub exit_price: Option<f64>,
    pub outcome: Outcome,
    pub capital_after: f64,
}

impl Trade {
    pub fn is_long(&self) -> bool {
        self.direction.is_long()
    }

    pub fn is_closed(&self) -> bool {
        self.outcome != Outcome::Open
    }

    /// Adverse extreme reached the stop.
    pub fn should_stop_loss(&self, candle: &Candle) -> bool {
        if self.is_long() {
            candle.low <= self.stop_loss
        } else {
            candle.high >= self.stop_loss
        }
    }

    /// Favourable extreme reached the target.
    pub fn should_take_profit(&self, candle: &Candle) -> bool {
        if self.is_long() {
            candle.high >= self.take_profit
        } else {
            candle.low <= self.take_profit
        }
    }

    /// Exit decision for one candle. The stop is checked first.
    pub fn check_exit(&self, candle: &Candle) -> Option<(Outcome, f64)> {
        if self.should_stop_loss(candle) {
            Some((Outcome::Loss, self.stop_loss))
        } else if self.should_take_profit(candle) {
            Some((Outcome::Win, self.take_profit))
        } else {
            None
        }
    }

    pub fn bars_held(&self) -> Option<usize> {
        self.exit_index.map(|exit| exit - self.entry_index)
    }
}

/// Result of an entry attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryResult {
    Entered(Trade),
    /// The break-of-previous order was never filled.
    Expired,
    /// Stop on the wrong side of entry or a non-finite level.
    InvalidGeometry,
}

/// Build the trade a signal would open.
///
/// Steps:
/// 1. Resolve the entry fill per `EntryRule`
/// 2. Place the stop per `StopRule` and reject non-positive distances
/// 3. Place the target per `TargetRule`
pub fn open_trade(
    signal: &Signal,
    candles: &[Candle],
    config: &SimulationConfig,
    capital: f64,
) -> EntryResult {
    let Some(reference) = candles.get(signal.index).filter(|c| c.is_finite()) else {
        return EntryResult::InvalidGeometry;
    };
    let long = signal.direction.is_long();

    let (entry_index, entry_price) = match config.entry {
        EntryRule::SignalClose => (signal.index, reference.close),
        EntryRule::PreviousBreak => {
            let level = if long { reference.high } else { reference.low };
            match candles.get(signal.index + 1).filter(|c| c.is_finite()) {
                Some(next) if long && next.high >= level => {
                    (signal.index + 1, level.max(next.open))
                }
                Some(next) if !long && next.low <= level => {
                    (signal.index + 1, level.min(next.open))
                }
                _ => return EntryResult::Expired,
            }
        }
    };

    let stop_loss = match config.stop {
        StopRule::RiskPct => {
            let distance = entry_price * config.risk_pct;
            if long {
                entry_price - distance
            } else {
                entry_price + distance
            }
        }
        StopRule::Structural { buffer } => {
            if long {
                reference.low - buffer
            } else {
                reference.high + buffer
            }
        }
    };

    let distance = if long {
        entry_price - stop_loss
    } else {
        stop_loss - entry_price
    };
    if !distance.is_finite() || distance <= 0.0 {
        return EntryResult::InvalidGeometry;
    }

    let take_profit = match config.target {
        TargetRule::RewardMultiple => {
            let reach = distance * config.reward_multiple;
            if long {
                entry_price + reach
            } else {
                entry_price - reach
            }
        }
        TargetRule::Percent(pct) => {
            if long {
                entry_price * (1.0 + pct)
            } else {
                entry_price * (1.0 - pct)
            }
        }
    };

    EntryResult::Entered(Trade {
        direction: signal.direction,
        signal_index: signal.index,
        entry_index,
        entry_price,
        stop_loss,
        take_profit,
        exit_index: None,
        exit_price: None,
        outcome: Outcome::Open,
        capital_after: capital,
    })
}

/// Scan forward from the candle after entry until the stop or target is hit.
pub fn resolve_exit(trade: &Trade, candles: &[Candle]) -> Option<(usize, Outcome, f64)> {
    candles
        .iter()
        .enumerate()
        .skip(trade.entry_index + 1)
        .filter(|(_, c)| c.is_finite())
        .find_map(|(i, c)| {
            let (outcome, price) = trade.check_exit(c)?;
            Some((i, outcome, price))
        })
}

/// Capital after a closed trade.
pub fn apply_outcome(capital: f64, outcome: Outcome, config: &SimulationConfig) -> f64 {
    match outcome {
        Outcome::Win => capital + capital * config.risk_pct * config.reward_multiple,
        Outcome::Loss => capital - capital * config.risk_pct,
        Outcome::Open => capital,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub trades: Vec<Trade>,
    pub initial_capital: f64,
    pub final_capital: f64,
    pub growth_pct: f64,
    pub win_rate_pct: f64,
    /// Signals that did not open a trade.
    pub dropped_signals: usize,
}

impl BacktestResult {
    pub fn from_trades(
        trades: Vec<Trade>,
        initial_capital: f64,
        final_capital: f64,
        dropped_signals: usize,
    ) -> Self {
        let closed = trades.iter().filter(|t| t.is_closed()).count();
        let wins = trades.iter().filter(|t| t.outcome == Outcome::Win).count();
        let win_rate_pct = if closed > 0 {
            wins as f64 / closed as f64 * 100.0
        } else {
            0.0
        };
        let growth_pct = if initial_capital > 0.0 {
            (final_capital - initial_capital) / initial_capital * 100.0
        } else {
            0.0
        };

        BacktestResult {
            trades,
            initial_capital,
            final_capital,
            growth_pct,
            win_rate_pct,
            dropped_signals,
        }
    }

    pub fn total_trades(&self) -> usize {
        self.trades.iter().filter(|t| t.is_closed()).count()
    }
}

/// Replay `signals` (chronological) against `candles`.
pub fn run(signals: &[Signal], candles: &[Candle], config: &SimulationConfig) -> BacktestResult {
    let mut capital = config.initial_capital;
    let mut trades = Vec::new();
    let mut dropped = 0usize;
    // last candle index the current position occupies; usize::MAX while open to the end
    let mut busy_until: Option<usize> = None;

    for signal in signals {
        if busy_until.is_some_and(|b| signal.index <= b) {
            debug!(index = signal.index, "signal dropped: position open");
            dropped += 1;
            continue;
        }
        if !config.side.allows(signal.direction) {
            dropped += 1;
            continue;
        }

        let mut trade = match open_trade(signal, candles, config, capital) {
            EntryResult::Entered(trade) => trade,
            EntryResult::Expired => {
                debug!(index = signal.index, "entry order expired");
                dropped += 1;
                continue;
            }
            EntryResult::InvalidGeometry => {
                warn!(
                    index = signal.index,
                    "signal dropped: invalid stop/target geometry"
                );
                dropped += 1;
                continue;
            }
        };

        match resolve_exit(&trade, candles) {
            Some((exit_index, outcome, price)) => {
                capital = apply_outcome(capital, outcome, config);
                trade.exit_index = Some(exit_index);
                trade.exit_price = Some(price);
                trade.outcome = outcome;
                busy_until = Some(exit_index);
            }
            None => {
                busy_until = Some(usize::MAX);
            }
        }
        trade.capital_after = capital;
        trades.push(trade);
    }

    BacktestResult::from_trades(trades, config.initial_capital, capital, dropped)
}
