//! CLI integration tests for command orchestration.
//!
//! Tests cover:
//! - Argument parsing for every subcommand
//! - Config loading from real INI files on disk, with symbol override
//! - End-to-end backtest and scan over CSV candles in a temp directory

mod common;

use clap::Parser;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use zonetrader::cli::{self, Cli, Command};
use zonetrader::domain::error::ZonetraderError;
use zonetrader::domain::strategy::StrategyKind;

fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn write_candles(dir: &Path, symbol: &str, closes: &[f64]) {
    let mut content = String::from("timestamp,open,high,low,close,volume\n");
    for (i, c) in closes.iter().enumerate() {
        content.push_str(&format!(
            "2024-01-{:02} 09:15:00,{},{},{},{},1000\n",
            i + 1,
            c,
            c + 1.0,
            c - 1.0,
            c
        ));
    }
    fs::write(dir.join(format!("{}_1d.csv", symbol)), content).unwrap();
}

fn ini_for(data_dir: &Path) -> String {
    format!(
        r#"
[data]
dir = {}
symbols = TCS, INFY
interval = 1d

[strategy]
kind = zones
strength = 1

[backtest]
initial_capital = 100000
risk_pct = 0.01
reward_multiple = 2
"#,
        data_dir.display()
    )
}

mod argument_parsing {
    use super::*;

    #[test]
    fn backtest_arguments() {
        let cli = Cli::try_parse_from([
            "zonetrader", "backtest", "-c", "run.ini", "-o", "out", "--symbol", "tcs",
        ])
        .unwrap();
        match cli.command {
            Command::Backtest {
                config,
                output,
                symbol,
                dry_run,
            } => {
                assert_eq!(config, PathBuf::from("run.ini"));
                assert_eq!(output, Some(PathBuf::from("out")));
                assert_eq!(symbol.as_deref(), Some("tcs"));
                assert!(!dry_run);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn scan_validate_and_info_parse() {
        assert!(matches!(
            Cli::try_parse_from(["zonetrader", "scan", "--config", "a.ini"]).unwrap().command,
            Command::Scan { .. }
        ));
        assert!(matches!(
            Cli::try_parse_from(["zonetrader", "validate", "-c", "a.ini"]).unwrap().command,
            Command::Validate { .. }
        ));
        assert!(matches!(
            Cli::try_parse_from(["zonetrader", "info", "-c", "a.ini", "--symbol", "SBIN"])
                .unwrap()
                .command,
            Command::Info { .. }
        ));
    }

    #[test]
    fn config_is_required() {
        assert!(Cli::try_parse_from(["zonetrader", "backtest"]).is_err());
    }
}

mod config_loading {
    use super::*;

    #[test]
    fn loads_run_config_from_file() {
        let dir = TempDir::new().unwrap();
        let file = write_temp_ini(&ini_for(dir.path()));
        let config = cli::load_run_config(&PathBuf::from(file.path()), None).unwrap();

        assert_eq!(config.data.dir, dir.path());
        assert_eq!(config.data.symbols, vec!["TCS", "INFY"]);
        assert_eq!(config.strategy.kind, StrategyKind::Zones);
        assert_eq!(config.strategy.pivot.strength, 1);
        assert_eq!(config.simulation.risk_pct, 0.01);
    }

    #[test]
    fn symbol_override_replaces_list() {
        let dir = TempDir::new().unwrap();
        let file = write_temp_ini(&ini_for(dir.path()));
        let config = cli::load_run_config(&PathBuf::from(file.path()), Some("sbin")).unwrap();
        assert_eq!(config.data.symbols, vec!["SBIN"]);
    }

    #[test]
    fn missing_file_is_config_parse_error() {
        let result = cli::load_run_config(&PathBuf::from("/nonexistent/run.ini"), None);
        assert!(matches!(result, Err(ZonetraderError::ConfigParse { .. })));
    }

    #[test]
    fn missing_risk_pct_is_rejected() {
        let file = write_temp_ini(
            "[data]\ndir = /tmp\nsymbols = TCS\n\n[backtest]\ninitial_capital = 1000\n",
        );
        let result = cli::load_run_config(&PathBuf::from(file.path()), None);
        assert!(
            matches!(result, Err(ZonetraderError::ConfigMissing { key, .. }) if key == "risk_pct")
        );
    }
}

mod end_to_end {
    use super::*;

    fn setup() -> (TempDir, tempfile::NamedTempFile) {
        let dir = TempDir::new().unwrap();
        write_candles(
            dir.path(),
            "TCS",
            &[
                100.0, 102.0, 105.0, 101.0, 103.0, 107.0, 108.0, 110.0, 112.0,
            ],
        );
        let file = write_temp_ini(&ini_for(dir.path()));
        (dir, file)
    }

    fn run_cli(args: &[&str]) {
        let mut argv = vec!["zonetrader"];
        argv.extend_from_slice(args);
        cli::run(Cli::try_parse_from(argv).unwrap());
    }

    #[test]
    fn backtest_writes_reports_for_available_symbols() {
        let (dir, ini) = setup();
        let out = dir.path().join("out");
        let path = ini.path().to_str().unwrap();
        let out_str = out.to_str().unwrap();

        run_cli(&["backtest", "-c", path, "-o", out_str]);

        let trades = fs::read_to_string(out.join("TCS_1d_trades.csv")).unwrap();
        assert!(trades.contains("WIN"));
        assert!(out.join("TCS_1d_summary.csv").exists());
        assert!(out.join("TCS_1d_annotations.csv").exists());
        // INFY has no file and is skipped
        assert!(!out.join("INFY_1d_trades.csv").exists());
    }

    #[test]
    fn scan_writes_signals_only() {
        let (dir, ini) = setup();
        let out = dir.path().join("scan");
        let path = ini.path().to_str().unwrap();
        let out_str = out.to_str().unwrap();

        run_cli(&["scan", "-c", path, "-o", out_str]);

        let signals = fs::read_to_string(out.join("TCS_1d_signals.csv")).unwrap();
        assert!(signals.contains("Support"));
        assert!(!out.join("TCS_1d_trades.csv").exists());
    }

    #[test]
    fn dry_run_writes_nothing() {
        let (dir, ini) = setup();
        let out = dir.path().join("dry");
        let path = ini.path().to_str().unwrap();
        let out_str = out.to_str().unwrap();

        run_cli(&["backtest", "-c", path, "-o", out_str, "--dry-run"]);

        assert!(!out.exists());
    }
}
