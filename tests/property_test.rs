//! Property tests over random candle series.

mod common;

use common::make_candle;
use proptest::prelude::*;
use zonetrader::domain::candle::Candle;
use zonetrader::domain::pivot::{self, PivotConfig, PriceSource};
use zonetrader::domain::simulator::{self, Outcome, SimulationConfig};
use zonetrader::domain::zone::{self, ZoneConfig, ZoneStatus};

fn series_strategy(max_len: usize) -> impl Strategy<Value = Vec<Candle>> {
    prop::collection::vec((50.0f64..150.0, 0.1f64..5.0, 0.0f64..1.0), 0..max_len).prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (mid, half, pos))| {
                let low = mid - half;
                let high = mid + half;
                let close = low + (high - low) * pos;
                make_candle(i, mid, high, low, close)
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn short_series_has_no_pivots(strength in 1usize..6, candles in series_strategy(12)) {
        prop_assume!(candles.len() < pivot::min_len(strength));
        let config = PivotConfig {
            strength,
            source: PriceSource::HighLow,
        };
        prop_assert!(pivot::detect(&candles, &config).is_empty());
    }

    #[test]
    fn detection_is_deterministic(strength in 1usize..4, candles in series_strategy(60)) {
        let config = PivotConfig {
            strength,
            source: PriceSource::HighLow,
        };
        prop_assert_eq!(pivot::detect(&candles, &config), pivot::detect(&candles, &config));
    }

    #[test]
    fn pivots_stay_inside_the_window(strength in 1usize..4, candles in series_strategy(60)) {
        let config = PivotConfig {
            strength,
            source: PriceSource::Close,
        };
        for p in pivot::detect(&candles, &config) {
            prop_assert!(p.index >= strength);
            prop_assert!(p.index + strength < candles.len());
        }
    }

    #[test]
    fn invalid_zones_never_revert(candles in series_strategy(80)) {
        let config = PivotConfig {
            strength: 2,
            source: PriceSource::HighLow,
        };
        let pivots = pivot::detect(&candles, &config);
        let run = zone::run(&candles, &pivots, &ZoneConfig::default());

        for z in &run.zones {
            match z.status {
                ZoneStatus::Invalid => {
                    let at = z.invalidated_at.unwrap();
                    prop_assert!(at > z.formed_at);
                    // no retest recorded on or after the invalidating candle
                    prop_assert!(z.retests.iter().all(|r| r.index < at));
                }
                ZoneStatus::Valid => prop_assert!(z.invalidated_at.is_none()),
            }
            prop_assert!(z.low <= z.high);
        }
        // at most one signal per candle
        for pair in run.signals.windows(2) {
            prop_assert!(pair[0].index < pair[1].index);
        }
    }

    #[test]
    fn simulation_invariants(
        candles in series_strategy(80),
        risk in 0.005f64..0.05,
        reward in 0.5f64..4.0,
    ) {
        let pivot_config = PivotConfig {
            strength: 2,
            source: PriceSource::HighLow,
        };
        let pivots = pivot::detect(&candles, &pivot_config);
        let run = zone::run(&candles, &pivots, &ZoneConfig::default());
        let config = SimulationConfig {
            risk_pct: risk,
            reward_multiple: reward,
            ..SimulationConfig::default()
        };
        let result = simulator::run(&run.signals, &candles, &config);

        prop_assert!((0.0..=100.0).contains(&result.win_rate_pct));
        if result.trades.is_empty() {
            prop_assert_eq!(result.win_rate_pct, 0.0);
        }

        // one position at a time: each entry comes after the previous exit
        for pair in result.trades.windows(2) {
            let prev_exit = pair[0].exit_index;
            prop_assert!(prev_exit.is_some());
            prop_assert!(pair[1].signal_index > prev_exit.unwrap());
        }
        let open = result
            .trades
            .iter()
            .filter(|t| t.outcome == Outcome::Open)
            .count();
        prop_assert!(open <= 1);

        let expected = result
            .trades
            .iter()
            .fold(config.initial_capital, |capital, t| match t.outcome {
                Outcome::Win => capital * (1.0 + risk * reward),
                Outcome::Loss => capital * (1.0 - risk),
                Outcome::Open => capital,
            });
        prop_assert!((result.final_capital - expected).abs() <= expected.abs() * 1e-9);
    }
}
