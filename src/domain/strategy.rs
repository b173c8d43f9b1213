//! Detector selection and the per-series signal pipeline.

use std::fmt;

use super::annotation::CandleAnnotation;
use super::candle::Candle;
use super::channel::{self, ChannelParams};
use super::heikin_ashi;
use super::pivot::{self, Pivot, PivotConfig};
use super::signal::Signal;
use super::simulator::{self, BacktestResult, SimulationConfig};
use super::zone::{self, Zone, ZoneConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrategyKind {
    /// Pivot breaks form support/resistance zones.
    #[default]
    Zones,
    /// Regression channel breakouts.
    Channel,
}

impl StrategyKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "zones" | "zone" | "pivot" => Some(StrategyKind::Zones),
            "channel" | "breakout" => Some(StrategyKind::Channel),
            _ => None,
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::Zones => write!(f, "zones"),
            StrategyKind::Channel => write!(f, "channel"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct StrategyConfig {
    pub kind: StrategyKind,
    pub pivot: PivotConfig,
    pub zone: ZoneConfig,
    pub channel: ChannelParams,
    pub heikin_ashi: bool,
}

impl StrategyConfig {
    /// Fewest candles for which the selected detector can emit anything.
    pub fn min_candles(&self) -> usize {
        match self.kind {
            StrategyKind::Zones => pivot::min_len(self.pivot.strength),
            StrategyKind::Channel => self.channel.first_index() + 1,
        }
    }
}

/// Everything the detectors produced for one series.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StrategyRun {
    /// The series the detectors saw (smoothed when Heikin-Ashi is on).
    pub candles: Vec<Candle>,
    pub pivots: Vec<Pivot>,
    pub zones: Vec<Zone>,
    pub signals: Vec<Signal>,
    pub annotations: Vec<CandleAnnotation>,
}

pub fn run_strategy(candles: &[Candle], config: &StrategyConfig) -> StrategyRun {
    let candles = if config.heikin_ashi {
        heikin_ashi::transform(candles)
    } else {
        candles.to_vec()
    };

    match config.kind {
        StrategyKind::Zones => {
            let pivots = pivot::detect(&candles, &config.pivot);
            let run = zone::run(&candles, &pivots, &config.zone);
            StrategyRun {
                candles,
                pivots,
                zones: run.zones,
                signals: run.signals,
                annotations: run.annotations,
            }
        }
        StrategyKind::Channel => {
            let run = channel::scan(&candles, &config.channel);
            StrategyRun {
                candles,
                pivots: Vec::new(),
                zones: Vec::new(),
                signals: run.signals,
                annotations: run.annotations,
            }
        }
    }
}

/// Detect signals and replay them against the same series.
pub fn backtest(
    candles: &[Candle],
    strategy: &StrategyConfig,
    simulation: &SimulationConfig,
) -> (StrategyRun, BacktestResult) {
    let run = run_strategy(candles, strategy);
    let result = simulator::run(&run.signals, &run.candles, simulation);
    (run, result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn make_candles(closes: &[f64]) -> Vec<Candle> {
        let base = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Candle {
                timestamp: base + Duration::days(i as i64),
                open: c,
                high: c + 1.0,
                low: c - 1.0,
                close: c,
                volume: 1000.0,
            })
            .collect()
    }

    #[test]
    fn parse_kind() {
        assert_eq!(StrategyKind::parse("Zones"), Some(StrategyKind::Zones));
        assert_eq!(StrategyKind::parse(" channel "), Some(StrategyKind::Channel));
        assert_eq!(StrategyKind::parse("rsi"), None);
    }

    #[test]
    fn min_candles_per_kind() {
        let mut config = StrategyConfig::default();
        config.pivot.strength = 3;
        assert_eq!(config.min_candles(), 7);
        config.kind = StrategyKind::Channel;
        assert_eq!(config.min_candles(), config.channel.first_index() + 1);
    }

    #[test]
    fn zones_pipeline_emits_buy_on_break_of_pivot_high() {
        // pivot high at 2 (strength 1), broken by the close at 5
        let candles = make_candles(&[100.0, 102.0, 105.0, 101.0, 103.0, 107.0]);
        let config = StrategyConfig {
            pivot: PivotConfig {
                strength: 1,
                ..PivotConfig::default()
            },
            ..StrategyConfig::default()
        };
        let run = run_strategy(&candles, &config);
        assert!(run.pivots.iter().any(|p| p.index == 2 && p.kind.is_high()));
        assert_eq!(run.signals.len(), 1);
        assert_eq!(run.signals[0].index, 5);
        assert!(run.signals[0].direction.is_long());
        assert_eq!(run.annotations.len(), candles.len());
    }

    #[test]
    fn heikin_ashi_replaces_detector_input() {
        let candles = make_candles(&[100.0, 102.0, 105.0, 101.0, 103.0, 107.0]);
        let config = StrategyConfig {
            heikin_ashi: true,
            ..StrategyConfig::default()
        };
        let run = run_strategy(&candles, &config);
        assert_eq!(run.candles, heikin_ashi::transform(&candles));
    }

    #[test]
    fn heikin_ashi_run_survives_one_bad_candle() {
        let closes: Vec<f64> = (0..40)
            .map(|i| 100.0 + 10.0 * (i as f64 * std::f64::consts::TAU / 10.0).sin())
            .collect();
        let mut candles = make_candles(&closes);
        candles[3].close = f64::NAN;
        let config = StrategyConfig {
            heikin_ashi: true,
            pivot: PivotConfig {
                strength: 2,
                ..PivotConfig::default()
            },
            ..StrategyConfig::default()
        };
        let run = run_strategy(&candles, &config);

        assert_eq!(run.candles.iter().filter(|c| !c.is_finite()).count(), 1);
        assert!(run.pivots.iter().any(|p| p.index > 10));
    }

    #[test]
    fn channel_pipeline_on_short_series_is_quiet() {
        let candles = make_candles(&[100.0; 10]);
        let config = StrategyConfig {
            kind: StrategyKind::Channel,
            ..StrategyConfig::default()
        };
        let (run, result) = backtest(&candles, &config, &SimulationConfig::default());
        assert!(run.signals.is_empty());
        assert!(result.trades.is_empty());
        assert_eq!(result.final_capital, result.initial_capital);
    }
}
