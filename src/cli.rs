//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_report::JsonReport;
use crate::adapters::text_report::{TextReport, format_quick};
use crate::adapters::{DataSettings, DataSource, build_provider};
use crate::domain::config::StopConfig;
use crate::domain::config_validation::{build_channel_params, build_stop_config};
use crate::domain::error::StopError;
use crate::domain::indicator::AtrMethod;
use crate::domain::recommender::{
    BatchReport, EntryPosition, TickerRequest, analyze_ticker, recommend_watchlist,
};
use crate::domain::stop_history::ticker_history;
use crate::domain::watchlist::{parse_ticker_list, parse_tickers};
use crate::ports::config_port::ConfigPort;
use crate::ports::price_history::HistoryWindow;
use crate::ports::report_port::ReportPort;

pub const DEFAULT_WATCHLIST: &str = "NVDA,TSLA,AAPL,AMD,META";

#[derive(Parser, Debug)]
#[command(
    name = "volstop",
    about = "Volatility-adjusted trailing stop recommendations"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Analyze one or more tickers
    Analyze {
        #[arg(required = true)]
        tickers: Vec<String>,
        /// Entry price of an open position (applies to every ticker)
        #[arg(short, long)]
        entry: Option<f64>,
        /// Entry date (YYYY-MM-DD); anchors the recent high and the entry ATR
        #[arg(long, requires = "entry")]
        entry_date: Option<NaiveDate>,
        /// Base ATR multiplier, used when regime adjustment is off
        #[arg(short, long)]
        multiplier: Option<f64>,
        #[arg(short = 'p', long)]
        atr_period: Option<usize>,
        #[arg(long)]
        method: Option<AtrMethod>,
        /// History to request: 1mo, 3mo, 6mo, 1y, 2y or 5y
        #[arg(long)]
        history: Option<HistoryWindow>,
        #[arg(long)]
        no_regime_adjust: bool,
        /// Summary table only
        #[arg(short, long)]
        summary: bool,
        #[arg(short, long)]
        json: bool,
        /// Use simulated data
        #[arg(long, conflicts_with = "csv_dir")]
        mock: bool,
        #[arg(long)]
        csv_dir: Option<PathBuf>,
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        parallel: bool,
    },
    /// Analyze the configured watchlist
    Watchlist {
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Detail panel for each ticker after the summary
        #[arg(short, long)]
        verbose: bool,
        #[arg(short, long)]
        json: bool,
        #[arg(long)]
        mock: bool,
        #[arg(long)]
        parallel: bool,
    },
    /// One-line summary for a single ticker
    Quick {
        ticker: String,
        #[arg(long)]
        mock: bool,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Daily ATR, regime and channel stops for one ticker
    History {
        ticker: String,
        /// Most recent rows to show; 0 shows all
        #[arg(short, long, default_value_t = 20)]
        days: usize,
        #[arg(short = 'p', long)]
        atr_period: Option<usize>,
        #[arg(long)]
        method: Option<AtrMethod>,
        #[arg(long)]
        history: Option<HistoryWindow>,
        #[arg(short, long)]
        json: bool,
        #[arg(long, conflicts_with = "csv_dir")]
        mock: bool,
        #[arg(long)]
        csv_dir: Option<PathBuf>,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// CLI flags layered over the configuration file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    pub atr_period: Option<usize>,
    pub method: Option<AtrMethod>,
    pub multiplier: Option<f64>,
    pub no_regime_adjust: bool,
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Analyze {
            tickers,
            entry,
            entry_date,
            multiplier,
            atr_period,
            method,
            history,
            no_regime_adjust,
            summary,
            json,
            mock,
            csv_dir,
            config,
            parallel,
        } => {
            let overrides = Overrides {
                atr_period,
                method,
                multiplier,
                no_regime_adjust,
            };
            let entry = entry.map(|price| EntryPosition {
                price,
                date: entry_date,
            });
            run_analyze(AnalyzeArgs {
                tickers: &tickers,
                entry,
                overrides: &overrides,
                history,
                summary,
                json,
                mock,
                csv_dir: csv_dir.as_deref(),
                config: config.as_deref(),
                parallel,
            })
        }
        Command::Watchlist {
            config,
            verbose,
            json,
            mock,
            parallel,
        } => run_watchlist(config.as_deref(), verbose, json, mock, parallel),
        Command::Quick {
            ticker,
            mock,
            config,
        } => run_quick(&ticker, mock, config.as_deref()),
        Command::History {
            ticker,
            days,
            atr_period,
            method,
            history,
            json,
            mock,
            csv_dir,
            config,
        } => {
            let overrides = Overrides {
                atr_period,
                method,
                ..Overrides::default()
            };
            run_history(HistoryArgs {
                ticker: &ticker,
                days,
                overrides: &overrides,
                history,
                json,
                mock,
                csv_dir: csv_dir.as_deref(),
                config: config.as_deref(),
            })
        }
        Command::Validate { config } => run_validate(&config),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, StopError> {
    log::info!("loading config from {}", path.display());
    let file = FileConfigAdapter::from_file(path)?;
    for section in file.unknown_sections() {
        log::warn!("{}: ignoring unknown section [{section}]", path.display());
    }
    Ok(file)
}

/// Config file when given, otherwise an empty one so every key takes its
/// standard value.
pub fn load_optional_config(path: Option<&Path>) -> Result<FileConfigAdapter, StopError> {
    match path {
        Some(p) => load_config(p),
        None => FileConfigAdapter::from_string(""),
    }
}

pub fn apply_overrides(config: StopConfig, overrides: &Overrides) -> Result<StopConfig, StopError> {
    if *overrides == Overrides::default() {
        return Ok(config);
    }
    let mut params = config.into_params();
    if let Some(period) = overrides.atr_period {
        params.atr_period = period;
    }
    if let Some(method) = overrides.method {
        params.method = method;
    }
    if let Some(multiplier) = overrides.multiplier {
        params.base_multiplier = multiplier;
    }
    if overrides.no_regime_adjust {
        params.use_regime_adjustment = false;
    }
    StopConfig::new(params)
}

pub fn build_data_settings(
    config: &dyn ConfigPort,
    mock: bool,
    csv_dir: Option<&Path>,
) -> Result<DataSettings, StopError> {
    let defaults = DataSettings::default();

    let mut source = match config.get_string("data", "source") {
        Some(raw) => raw.parse::<DataSource>().map_err(|e| config_invalid("data", "source", e))?,
        None => defaults.source,
    };
    let window = match config.get_string("data", "history") {
        Some(raw) => raw
            .parse::<HistoryWindow>()
            .map_err(|e| config_invalid("data", "history", e))?,
        None => defaults.window,
    };
    let seed = config.get_int("data", "seed", defaults.seed as i64)?;
    if seed < 0 {
        return Err(config_invalid("data", "seed", "must not be negative"));
    }

    let mut csv_path = config.get_string("data", "csv_dir").map(PathBuf::from);
    if let Some(dir) = csv_dir {
        source = DataSource::Csv;
        csv_path = Some(dir.to_path_buf());
    }
    if mock {
        source = DataSource::Mock;
    }

    Ok(DataSettings {
        source,
        window,
        csv_dir: csv_path,
        seed: seed as u64,
        mock_end: None,
    })
}

/// `[watchlist] tickers`, or the built-in list when the key is absent.
pub fn resolve_watchlist(config: &dyn ConfigPort) -> Result<Vec<String>, StopError> {
    let raw = config
        .get_string("watchlist", "tickers")
        .unwrap_or_else(|| DEFAULT_WATCHLIST.to_string());
    parse_ticker_list(&raw).map_err(|e| config_invalid("watchlist", "tickers", e))
}

fn config_invalid(section: &str, key: &str, reason: impl ToString) -> StopError {
    StopError::ConfigInvalid {
        section: section.into(),
        key: key.into(),
        reason: reason.to_string(),
    }
}

/// Successful when at least one ticker produced a recommendation; otherwise
/// the first failure decides the exit code.
fn batch_exit_code(report: &BatchReport) -> ExitCode {
    match report.failures.first() {
        Some(first) if report.is_empty() => (&first.error).into(),
        _ => ExitCode::SUCCESS,
    }
}

struct AnalyzeArgs<'a> {
    tickers: &'a [String],
    entry: Option<EntryPosition>,
    overrides: &'a Overrides,
    history: Option<HistoryWindow>,
    summary: bool,
    json: bool,
    mock: bool,
    csv_dir: Option<&'a Path>,
    config: Option<&'a Path>,
    parallel: bool,
}

fn run_analyze(args: AnalyzeArgs<'_>) -> Result<ExitCode, StopError> {
    let file = load_optional_config(args.config)?;
    let stop_config = apply_overrides(build_stop_config(&file)?, args.overrides)?;
    let mut settings = build_data_settings(&file, args.mock, args.csv_dir)?;
    if let Some(window) = args.history {
        settings.window = window;
    }

    let tickers = parse_tickers(args.tickers)
        .map_err(|e| StopError::invalid_config("tickers", e.to_string()))?;
    let requests: Vec<TickerRequest> = tickers
        .into_iter()
        .map(|t| {
            let req = TickerRequest::new(t);
            match args.entry {
                Some(entry) => req.with_entry(entry),
                None => req,
            }
        })
        .collect();

    if settings.source == DataSource::Mock && !args.json {
        eprintln!("Using simulated data (--mock mode)");
    }
    let provider = build_provider(&settings)?;
    let report = recommend_watchlist(
        provider.as_ref(),
        &requests,
        settings.window,
        &stop_config,
        args.parallel,
    );

    let output = if args.json {
        JsonReport.render_batch(&report, true)?
    } else if requests.len() == 1 && report.failures.is_empty() {
        TextReport.render(&report.recommendations[0])?
    } else {
        TextReport.render_batch(&report, !args.summary)?
    };
    print!("{output}");
    Ok(batch_exit_code(&report))
}

fn run_watchlist(
    config: Option<&Path>,
    verbose: bool,
    json: bool,
    mock: bool,
    parallel: bool,
) -> Result<ExitCode, StopError> {
    let file = load_optional_config(config)?;
    let stop_config = build_stop_config(&file)?;
    let settings = build_data_settings(&file, mock, None)?;
    let tickers = resolve_watchlist(&file)?;

    if !json {
        eprintln!("Analyzing watchlist: {}", tickers.join(", "));
        if settings.source == DataSource::Mock {
            eprintln!("Using simulated data (--mock mode)");
        }
    }

    let requests: Vec<TickerRequest> = tickers.into_iter().map(TickerRequest::new).collect();
    let provider = build_provider(&settings)?;
    let report = recommend_watchlist(
        provider.as_ref(),
        &requests,
        settings.window,
        &stop_config,
        parallel,
    );

    let output = if json {
        JsonReport.render_batch(&report, verbose)?
    } else {
        TextReport.render_batch(&report, verbose)?
    };
    print!("{output}");
    Ok(batch_exit_code(&report))
}

fn run_quick(ticker: &str, mock: bool, config: Option<&Path>) -> Result<ExitCode, StopError> {
    let file = load_optional_config(config)?;
    let stop_config = build_stop_config(&file)?;
    let settings = build_data_settings(&file, mock, None)?;
    let ticker = ticker.trim().to_uppercase();

    let provider = build_provider(&settings)?;
    let rec = analyze_ticker(provider.as_ref(), &ticker, settings.window, None, &stop_config)?;
    println!("{}", format_quick(&rec));
    Ok(ExitCode::SUCCESS)
}

struct HistoryArgs<'a> {
    ticker: &'a str,
    days: usize,
    overrides: &'a Overrides,
    history: Option<HistoryWindow>,
    json: bool,
    mock: bool,
    csv_dir: Option<&'a Path>,
    config: Option<&'a Path>,
}

fn run_history(args: HistoryArgs<'_>) -> Result<ExitCode, StopError> {
    let file = load_optional_config(args.config)?;
    let stop_config = apply_overrides(build_stop_config(&file)?, args.overrides)?;
    let channels = build_channel_params(&file)?;
    let mut settings = build_data_settings(&file, args.mock, args.csv_dir)?;
    if let Some(window) = args.history {
        settings.window = window;
    }
    let ticker = args.ticker.trim().to_uppercase();

    let provider = build_provider(&settings)?;
    let rows = ticker_history(
        provider.as_ref(),
        &ticker,
        settings.window,
        &stop_config,
        &channels,
        args.days,
    )?;

    let output = if args.json {
        JsonReport.render_history(&ticker, &rows)?
    } else {
        TextReport.render_history(&ticker, &rows)?
    };
    print!("{output}");
    Ok(ExitCode::SUCCESS)
}

fn run_validate(config_path: &Path) -> Result<ExitCode, StopError> {
    eprintln!("Validating config: {}", config_path.display());
    let file = load_config(config_path)?;
    let stop_config = build_stop_config(&file)?;
    let settings = build_data_settings(&file, false, None)?;
    let tickers = resolve_watchlist(&file)?;
    let channels = build_channel_params(&file)?;

    let display: Vec<String> = stop_config
        .display_periods
        .iter()
        .map(|p| p.to_string())
        .collect();
    eprintln!("\nATR:");
    eprintln!("  period:          {}", stop_config.atr_period);
    eprintln!("  method:          {}", stop_config.method);
    eprintln!("  display periods: {}", display.join(", "));
    eprintln!("\nRegime:");
    eprintln!("  lookback:        {}", stop_config.regime_lookback);
    eprintln!("  adjust:          {}", stop_config.use_regime_adjustment);
    eprintln!("\nStop:");
    eprintln!("  base multiplier: {}", stop_config.base_multiplier);
    eprintln!("  high lookback:   {}", stop_config.recent_high_lookback);
    eprintln!("\nChannels:");
    eprintln!(
        "  chandelier:      ATR({}) x {} over {} bars",
        channels.chandelier_atr_period, channels.chandelier_multiplier, channels.chandelier_lookback
    );
    eprintln!(
        "  keltner:         EMA({}) - ATR({}) x {}",
        channels.keltner_ema_period, channels.keltner_atr_period, channels.keltner_multiplier
    );
    eprintln!("\nData:");
    eprintln!("  source:          {}", settings.source);
    eprintln!("  history:         {}", settings.window);
    eprintln!("\nWatchlist:");
    eprintln!("  tickers:         {}", tickers.join(", "));

    eprintln!("\nConfiguration is valid.");
    Ok(ExitCode::SUCCESS)
}
