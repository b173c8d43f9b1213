//! Configuration validation.
//!
//! Builds the typed configs the core runs on from a [`ConfigPort`], rejecting
//! missing or out-of-range values before any data is touched.

use std::path::PathBuf;

use crate::domain::channel::{
    BreakoutConfirmation, ChannelParams, DebouncePolicy, MIN_POINTS_PER_SIDE,
};
use crate::domain::error::ZonetraderError;
use crate::domain::pivot::{PivotConfig, PriceSource};
use crate::domain::simulator::{EntryRule, SimulationConfig, StopRule, TargetRule, TradeSide};
use crate::domain::strategy::{StrategyConfig, StrategyKind};
use crate::domain::universe::parse_symbols;
use crate::domain::zone::ZoneConfig;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct DataConfig {
    pub dir: PathBuf,
    pub symbols: Vec<String>,
    pub interval: String,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportConfig {
    pub output_dir: Option<PathBuf>,
    pub annotations: bool,
}

/// All typed configuration for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub data: DataConfig,
    pub strategy: StrategyConfig,
    pub simulation: SimulationConfig,
    pub report: ReportConfig,
}

pub fn build_run_config(config: &dyn ConfigPort) -> Result<RunConfig, ZonetraderError> {
    Ok(RunConfig {
        data: build_data_config(config)?,
        strategy: build_strategy_config(config)?,
        simulation: build_simulation_config(config)?,
        report: build_report_config(config),
    })
}

pub fn build_data_config(config: &dyn ConfigPort) -> Result<DataConfig, ZonetraderError> {
    let dir = non_empty(config, "data", "dir")
        .map(PathBuf::from)
        .ok_or_else(|| missing("data", "dir"))?;

    let list = non_empty(config, "data", "symbols")
        .or_else(|| non_empty(config, "data", "symbol"))
        .ok_or_else(|| missing("data", "symbols"))?;
    let symbols = parse_symbols(&list).map_err(|e| invalid("data", "symbols", e.to_string()))?;

    let interval = non_empty(config, "data", "interval").unwrap_or_else(|| "1d".to_string());
    let start = optional_date(config, "start_date")?;
    let end = optional_date(config, "end_date")?;
    if let (Some(s), Some(e)) = (start, end) {
        if s > e {
            return Err(invalid(
                "data",
                "start_date",
                "start_date must not be after end_date",
            ));
        }
    }

    Ok(DataConfig {
        dir,
        symbols,
        interval,
        start,
        end,
    })
}

pub fn build_strategy_config(config: &dyn ConfigPort) -> Result<StrategyConfig, ZonetraderError> {
    let kind = choice(
        config,
        "strategy",
        "kind",
        StrategyKind::Zones,
        StrategyKind::parse,
    )?;
    let source = choice(
        config,
        "strategy",
        "source",
        PriceSource::HighLow,
        PriceSource::parse,
    )?;

    let strength = positive_int(config, "strategy", "strength", 5)?;

    let near_zone_pct = config.get_double("strategy", "near_zone_pct", 0.005);
    if !(0.0..1.0).contains(&near_zone_pct) {
        return Err(invalid(
            "strategy",
            "near_zone_pct",
            "near_zone_pct must be between 0 and 1",
        ));
    }

    let window = positive_int(config, "strategy", "window", 4)?;
    let backcandles = positive_int(config, "strategy", "backcandles", 40)?;
    // the local window must fit at least two pivots per side
    let min_backcandles = 2 * window + 2 * MIN_POINTS_PER_SIDE;
    if backcandles < min_backcandles {
        return Err(invalid(
            "strategy",
            "backcandles",
            format!("backcandles must be at least {}", min_backcandles),
        ));
    }

    let confirmation = choice(
        config,
        "strategy",
        "confirmation",
        BreakoutConfirmation::CloseOnly,
        BreakoutConfirmation::parse,
    )?;
    let debounce = choice(
        config,
        "strategy",
        "debounce",
        DebouncePolicy::MinGap,
        DebouncePolicy::parse,
    )?;

    Ok(StrategyConfig {
        kind,
        pivot: PivotConfig { strength, source },
        zone: ZoneConfig {
            source,
            near_zone_pct,
        },
        channel: ChannelParams {
            backcandles,
            window,
            confirmation,
            debounce,
        },
        heikin_ashi: config.get_bool("strategy", "heikin_ashi", false),
    })
}

pub fn build_simulation_config(
    config: &dyn ConfigPort,
) -> Result<SimulationConfig, ZonetraderError> {
    let initial_capital =
        optional_double(config, "backtest", "initial_capital")?.unwrap_or(100_000.0);
    if initial_capital <= 0.0 {
        return Err(invalid(
            "backtest",
            "initial_capital",
            "initial_capital must be positive",
        ));
    }

    let risk_pct = optional_double(config, "backtest", "risk_pct")?
        .ok_or_else(|| missing("backtest", "risk_pct"))?;
    if risk_pct <= 0.0 || risk_pct >= 1.0 {
        return Err(invalid("backtest", "risk_pct", "risk_pct must be between 0 and 1"));
    }

    let reward_multiple = optional_double(config, "backtest", "reward_multiple")?.unwrap_or(2.0);
    if reward_multiple <= 0.0 {
        return Err(invalid(
            "backtest",
            "reward_multiple",
            "reward_multiple must be positive",
        ));
    }

    let entry = choice(
        config,
        "backtest",
        "entry",
        EntryRule::SignalClose,
        EntryRule::parse,
    )?;
    let side = choice(
        config,
        "backtest",
        "side",
        TradeSide::Both,
        TradeSide::parse,
    )?;

    let stop = match lowercase(config, "backtest", "stop").as_deref() {
        None | Some("risk_pct") | Some("risk") => StopRule::RiskPct,
        Some("structural") | Some("candle") => {
            let buffer = optional_double(config, "backtest", "stop_buffer")?.unwrap_or(0.0);
            if buffer < 0.0 {
                return Err(invalid(
                    "backtest",
                    "stop_buffer",
                    "stop_buffer must be non-negative",
                ));
            }
            StopRule::Structural { buffer }
        }
        Some(other) => return Err(unknown("backtest", "stop", other)),
    };

    let target = match lowercase(config, "backtest", "target").as_deref() {
        None | Some("reward_multiple") | Some("reward") => TargetRule::RewardMultiple,
        Some("percent") | Some("pct") => {
            let pct = optional_double(config, "backtest", "target_pct")?
                .ok_or_else(|| missing("backtest", "target_pct"))?;
            if pct <= 0.0 || pct >= 1.0 {
                return Err(invalid(
                    "backtest",
                    "target_pct",
                    "target_pct must be between 0 and 1",
                ));
            }
            TargetRule::Percent(pct)
        }
        Some(other) => return Err(unknown("backtest", "target", other)),
    };

    Ok(SimulationConfig {
        initial_capital,
        risk_pct,
        reward_multiple,
        entry,
        stop,
        target,
        side,
    })
}

pub fn build_report_config(config: &dyn ConfigPort) -> ReportConfig {
    ReportConfig {
        output_dir: non_empty(config, "report", "output_dir").map(PathBuf::from),
        annotations: config.get_bool("report", "annotations", true),
    }
}

fn non_empty(config: &dyn ConfigPort, section: &str, key: &str) -> Option<String> {
    config
        .get_string(section, key)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn lowercase(config: &dyn ConfigPort, section: &str, key: &str) -> Option<String> {
    non_empty(config, section, key).map(|s| s.to_lowercase())
}

fn optional_double(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<f64>, ZonetraderError> {
    match non_empty(config, section, key) {
        None => Ok(None),
        Some(raw) => match raw.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(Some(v)),
            _ => Err(invalid(section, key, format!("'{}' is not a number", raw))),
        },
    }
}

fn positive_int(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: usize,
) -> Result<usize, ZonetraderError> {
    match non_empty(config, section, key) {
        None => Ok(default),
        Some(raw) => match raw.parse::<usize>() {
            Ok(v) if v >= 1 => Ok(v),
            _ => Err(invalid(section, key, format!("{} must be a positive integer", key))),
        },
    }
}

fn optional_date(config: &dyn ConfigPort, key: &str) -> Result<Option<NaiveDate>, ZonetraderError> {
    match non_empty(config, "data", key) {
        None => Ok(None),
        Some(raw) => match NaiveDate::parse_from_str(&raw, "%Y-%m-%d") {
            Ok(date) => Ok(Some(date)),
            Err(_) => Err(invalid("data", key, format!("{} must be YYYY-MM-DD", key))),
        },
    }
}

fn choice<T>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: T,
    parse: fn(&str) -> Option<T>,
) -> Result<T, ZonetraderError> {
    match non_empty(config, section, key) {
        None => Ok(default),
        Some(raw) => parse(&raw).ok_or_else(|| unknown(section, key, &raw)),
    }
}

fn missing(section: &str, key: &str) -> ZonetraderError {
    ZonetraderError::ConfigMissing {
        section: section.to_string(),
        key: key.to_string(),
    }
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> ZonetraderError {
    ZonetraderError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn unknown(section: &str, key: &str, value: &str) -> ZonetraderError {
    invalid(section, key, format!("unknown value '{}'", value))
}
