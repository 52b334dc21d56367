//! CLI integration tests.
//!
//! Tests cover:
//! - Config loading from INI files on disk
//! - Data-source selection and watchlist resolution
//! - The CSV provider feeding a watchlist run
//! - Command dispatch and exit codes

mod common;

use clap::Parser;
use common::*;
use std::io::Write;
use std::path::Path;
use std::process::ExitCode;
use volstop::adapters::{DataSource, build_provider};
use volstop::cli::{self, Cli};
use volstop::domain::config_validation::build_stop_config;
use volstop::domain::error::StopError;
use volstop::domain::indicator::AtrMethod;
use volstop::domain::recommender::{TickerRequest, recommend_watchlist};
use volstop::domain::regime::VolatilityRegime;
use volstop::ports::price_history::HistoryWindow;

fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn same_code(a: ExitCode, b: ExitCode) -> bool {
    format!("{a:?}") == format!("{b:?}")
}

fn write_csv(dir: &Path, ticker: &str, bars: &[PriceBar]) {
    let mut content = String::from("date,open,high,low,close,volume\n");
    for b in bars {
        content.push_str(&format!(
            "{},{},{},{},{},{}\n",
            b.date, b.open, b.high, b.low, b.close, b.volume
        ));
    }
    std::fs::write(dir.join(format!("{ticker}.csv")), content).unwrap();
}

const VALID_INI: &str = r#"
[atr]
period = 10
method = sma
display_periods = 5, 10, 20

[regime]
lookback_days = 100
thresholds = 20, 70, 90, 100
multipliers = 1.25, 2.0, 2.75, 3.5
adjust = true

[stop]
base_multiplier = 2.0
recent_high_lookback = 15

[sizing]
risk_amounts = 250, 500

[data]
source = mock
history = 6mo
seed = 7

[watchlist]
tickers = spy, qqq, msft
"#;

mod config_loading {
    use super::*;

    #[test]
    fn ini_file_builds_full_configuration() {
        let file = write_temp_ini(VALID_INI);
        let adapter = cli::load_config(file.path()).unwrap();

        let config = build_stop_config(&adapter).unwrap();
        assert_eq!(config.atr_period, 10);
        assert_eq!(config.method, AtrMethod::Sma);
        assert_eq!(config.display_periods, vec![5, 10, 20]);
        assert_eq!(config.regime_lookback, 100);
        assert_eq!(config.recent_high_lookback, 15);
        assert_eq!(config.risk_amounts, vec![250.0, 500.0]);
        assert_eq!(
            config.regime_table.multiplier(VolatilityRegime::Low),
            1.25
        );

        let settings = cli::build_data_settings(&adapter, false, None).unwrap();
        assert_eq!(settings.source, DataSource::Mock);
        assert_eq!(settings.window, HistoryWindow::SixMonths);
        assert_eq!(settings.seed, 7);

        assert_eq!(
            cli::resolve_watchlist(&adapter).unwrap(),
            vec!["SPY", "QQQ", "MSFT"]
        );
    }

    #[test]
    fn missing_file_is_config_parse_error() {
        let err = cli::load_config(Path::new("/nonexistent/volstop.ini")).unwrap_err();
        assert!(matches!(err, StopError::ConfigParse { .. }));
        assert!(same_code((&err).into(), ExitCode::from(2)));
    }

    #[test]
    fn unknown_source_rejected() {
        let file = write_temp_ini("[data]\nsource = bloomberg\n");
        let adapter = cli::load_config(file.path()).unwrap();
        let err = cli::build_data_settings(&adapter, false, None).unwrap_err();
        assert!(matches!(err, StopError::ConfigInvalid { key, .. } if key == "source"));
    }

    #[test]
    fn unparsable_seed_rejected() {
        let file = write_temp_ini("[data]\nsource = mock\nseed = lucky\n");
        let adapter = cli::load_config(file.path()).unwrap();
        let err = cli::build_data_settings(&adapter, false, None).unwrap_err();
        assert!(matches!(err, StopError::ConfigInvalid { key, .. } if key == "seed"));
    }

    #[test]
    fn validate_rejects_unparsable_period() {
        let file = write_temp_ini("[atr]\nperiod = abc\n");
        let path = file.path().to_str().unwrap();
        let code = cli::run(Cli::try_parse_from(["volstop", "validate", "--config", path]).unwrap());
        assert!(same_code(code, ExitCode::from(2)));
    }

    #[test]
    fn duplicate_watchlist_ticker_rejected() {
        let file = write_temp_ini("[watchlist]\ntickers = NVDA, AMD, nvda\n");
        let adapter = cli::load_config(file.path()).unwrap();
        let err = cli::resolve_watchlist(&adapter).unwrap_err();
        assert!(err.to_string().contains("duplicate ticker: NVDA"));
    }

    #[test]
    fn csv_dir_flag_selects_csv_source() {
        let adapter = cli::load_optional_config(None).unwrap();
        let settings =
            cli::build_data_settings(&adapter, false, Some(Path::new("/data/prices"))).unwrap();
        assert_eq!(settings.source, DataSource::Csv);
        assert_eq!(settings.csv_dir.as_deref(), Some(Path::new("/data/prices")));
    }
}

mod csv_pipeline {
    use super::*;

    #[test]
    fn csv_directory_feeds_watchlist() {
        let dir = tempfile::TempDir::new().unwrap();
        write_csv(dir.path(), "AAA", &trending_bars(60, 100.0, 1.0, 2.0));
        write_csv(dir.path(), "BBB", &widening_bars(60));

        let adapter = cli::load_optional_config(None).unwrap();
        let settings = cli::build_data_settings(&adapter, false, Some(dir.path())).unwrap();
        let provider = build_provider(&settings).unwrap();
        assert_eq!(provider.name(), "csv");

        let requests: Vec<TickerRequest> = ["AAA", "MISSING", "BBB"]
            .into_iter()
            .map(TickerRequest::new)
            .collect();
        let report = recommend_watchlist(
            provider.as_ref(),
            &requests,
            settings.window,
            &build_stop_config(&adapter).unwrap(),
            false,
        );

        assert_eq!(report.recommendations.len(), 2);
        assert_eq!(report.recommendations[0].ticker, "AAA");
        assert_eq!(report.recommendations[1].ticker, "BBB");
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].ticker, "MISSING");
        assert!(same_code((&report.failures[0].error).into(), ExitCode::from(7)));
    }
}

mod dispatch {
    use super::*;

    #[test]
    fn validate_accepts_good_config() {
        let file = write_temp_ini(VALID_INI);
        let path = file.path().to_str().unwrap();
        let code = cli::run(Cli::try_parse_from(["volstop", "validate", "--config", path]).unwrap());
        assert!(same_code(code, ExitCode::SUCCESS));
    }

    #[test]
    fn validate_rejects_bad_thresholds() {
        let file = write_temp_ini("[regime]\nthresholds = 25, 75, 90, 95\n");
        let path = file.path().to_str().unwrap();
        let code = cli::run(Cli::try_parse_from(["volstop", "validate", "--config", path]).unwrap());
        assert!(same_code(code, ExitCode::from(2)));
    }

    #[test]
    fn analyze_mock_json_succeeds() {
        let code = cli::run(
            Cli::try_parse_from(["volstop", "analyze", "nvda", "amd", "--mock", "--json"]).unwrap(),
        );
        assert!(same_code(code, ExitCode::SUCCESS));
    }

    #[test]
    fn analyze_with_only_failures_uses_error_code() {
        let dir = tempfile::TempDir::new().unwrap();
        let dir_arg = dir.path().to_str().unwrap();
        let code = cli::run(
            Cli::try_parse_from(["volstop", "analyze", "GHOST", "--csv-dir", dir_arg]).unwrap(),
        );
        assert!(same_code(code, ExitCode::from(7)));
    }

    #[test]
    fn analyze_short_history_is_data_error() {
        let dir = tempfile::TempDir::new().unwrap();
        write_csv(dir.path(), "TINY", &trending_bars(10, 20.0, 0.1, 0.5));
        let dir_arg = dir.path().to_str().unwrap();
        let code = cli::run(
            Cli::try_parse_from(["volstop", "analyze", "tiny", "--csv-dir", dir_arg]).unwrap(),
        );
        assert!(same_code(code, ExitCode::from(5)));
    }

    #[test]
    fn history_from_csv_succeeds() {
        let dir = tempfile::TempDir::new().unwrap();
        write_csv(dir.path(), "WIDE", &widening_bars(60));
        let dir_arg = dir.path().to_str().unwrap();
        let code = cli::run(
            Cli::try_parse_from(["volstop", "history", "wide", "--csv-dir", dir_arg, "--json"])
                .unwrap(),
        );
        assert!(same_code(code, ExitCode::SUCCESS));
    }

    #[test]
    fn history_with_mock_succeeds() {
        let code = cli::run(
            Cli::try_parse_from(["volstop", "history", "qqq", "--mock", "--days", "5"]).unwrap(),
        );
        assert!(same_code(code, ExitCode::SUCCESS));
    }

    #[test]
    fn quick_with_mock_succeeds() {
        let code = cli::run(Cli::try_parse_from(["volstop", "quick", "spy", "--mock"]).unwrap());
        assert!(same_code(code, ExitCode::SUCCESS));
    }
}
