//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::allocation::{AllocationPolicy, PolicyKind, DEFAULT_BETA, DEFAULT_BUDGET_PCT};
use crate::domain::config_validation::{optional_f64, parse_window, validate_config};
use crate::domain::dashboard::{
    build_snapshot, fetch_inputs, DashboardParams, DashboardSnapshot,
};
use crate::domain::deviation::{BandPolicy, ScoringParams, WindowOutcome, DEFAULT_THRESHOLD_PCT};
use crate::domain::error::DcaError;
use crate::domain::universe::{
    default_instruments, default_macro_indicators, parse_instruments, parse_macro_indicators,
    Instrument, MacroIndicator,
};
use crate::domain::window::{default_windows, LookbackWindow};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "dcadash", about = "ETF deviation scores and DCA allocation")]
pub struct Cli {
    /// Log the per-window breakdown
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Score the basket and print the DCA allocation
    Score {
        #[arg(short, long)]
        config: PathBuf,
        /// Deviation threshold in percent
        #[arg(long)]
        threshold: Option<f64>,
        /// four_band or two_band
        #[arg(long)]
        band: Option<BandPolicy>,
        /// shift or beta
        #[arg(long)]
        policy: Option<PolicyKind>,
        #[arg(long)]
        beta: Option<f64>,
        /// Score as of this date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        as_of: Option<NaiveDate>,
        /// Write the allocation report to this CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Print the per-window formula breakdown
        #[arg(long)]
        debug: bool,
    },
    /// Show the latest macro indicator readings
    Macro {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        as_of: Option<NaiveDate>,
    },
    /// Show data range for the configured instruments
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        ticker: Option<String>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct ScoreOverrides {
    pub threshold_pct: Option<f64>,
    pub band: Option<BandPolicy>,
    pub policy: Option<PolicyKind>,
    pub beta: Option<f64>,
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Score {
            config,
            threshold,
            band,
            policy,
            beta,
            as_of,
            output,
            debug,
        } => {
            let overrides = ScoreOverrides {
                threshold_pct: threshold,
                band,
                policy,
                beta,
            };
            run_score(&config, &overrides, as_of, output.as_deref(), debug)
        }
        Command::Macro { config, as_of } => run_macro(&config, as_of),
        Command::Info { config, ticker } => run_info(&config, ticker.as_deref()),
        Command::Validate { config } => run_validate(&config),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = DcaError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        log::error!("{err}");
        ExitCode::from(&err)
    })
}

fn load_validated(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    log::info!("Loading config from {}", path.display());
    let adapter = load_config(path)?;
    if let Err(e) = validate_config(&adapter) {
        log::error!("{e}");
        return Err((&e).into());
    }
    Ok(adapter)
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

pub fn load_instruments(config: &dyn ConfigPort) -> Result<Vec<Instrument>, DcaError> {
    let entries = config.section_entries("instruments");
    if entries.is_empty() {
        return Ok(default_instruments());
    }
    parse_instruments(entries).map_err(|e| DcaError::invalid("instruments", "*", e.to_string()))
}

pub fn load_macro_indicators(config: &dyn ConfigPort) -> Result<Vec<MacroIndicator>, DcaError> {
    let entries = config.section_entries("macro");
    if entries.is_empty() {
        return Ok(default_macro_indicators());
    }
    parse_macro_indicators(entries).map_err(|e| DcaError::invalid("macro", "*", e.to_string()))
}

pub fn load_windows(config: &dyn ConfigPort) -> Result<Vec<LookbackWindow>, DcaError> {
    let entries = config.section_entries("windows");
    if entries.is_empty() {
        return Ok(default_windows());
    }
    entries
        .into_iter()
        .map(|(label, days)| parse_window(label, &days))
        .collect()
}

pub fn build_dashboard_params(
    config: &dyn ConfigPort,
    overrides: &ScoreOverrides,
) -> Result<DashboardParams, DcaError> {
    let threshold_pct = match overrides.threshold_pct {
        Some(t) => t,
        None => optional_f64(config, "scoring", "threshold_pct")?.unwrap_or(DEFAULT_THRESHOLD_PCT),
    };
    if !(threshold_pct > 0.0 && threshold_pct < 100.0) {
        return Err(DcaError::invalid(
            "scoring",
            "threshold_pct",
            "threshold_pct must be between 0 and 100 (exclusive)",
        ));
    }

    let band = match overrides.band {
        Some(b) => b,
        None => match config.get_string("scoring", "band") {
            Some(s) => s
                .parse::<BandPolicy>()
                .map_err(|reason| DcaError::invalid("scoring", "band", reason))?,
            None => BandPolicy::default(),
        },
    };

    let beta = match overrides.beta {
        Some(b) => b,
        None => optional_f64(config, "allocation", "beta")?.unwrap_or(DEFAULT_BETA),
    };
    if !(0.0..=1.0).contains(&beta) {
        return Err(DcaError::invalid(
            "allocation",
            "beta",
            "beta must be between 0 and 1",
        ));
    }

    let kind = match overrides.policy {
        Some(k) => k,
        None => match config.get_string("allocation", "policy") {
            Some(s) => s
                .parse::<PolicyKind>()
                .map_err(|reason| DcaError::invalid("allocation", "policy", reason))?,
            None => PolicyKind::default(),
        },
    };
    let policy = kind.with_beta(beta);

    let budget_pct =
        optional_f64(config, "allocation", "budget_pct")?.unwrap_or(DEFAULT_BUDGET_PCT);

    Ok(DashboardParams {
        windows: load_windows(config)?,
        scoring: ScoringParams {
            threshold_pct,
            band,
        },
        policy,
        budget_pct,
    })
}

pub fn open_data_port(config: &dyn ConfigPort) -> Result<Box<dyn DataPort>, DcaError> {
    let source = config
        .get_string("data", "source")
        .unwrap_or_else(|| "csv".to_string())
        .trim()
        .to_lowercase();

    match source.as_str() {
        "csv" => Ok(Box::new(CsvAdapter::from_config(config)?)),
        #[cfg(feature = "sqlite")]
        "sqlite" => {
            use crate::adapters::sqlite_adapter::SqliteAdapter;
            Ok(Box::new(SqliteAdapter::from_config(config)?))
        }
        #[cfg(not(feature = "sqlite"))]
        "sqlite" => Err(DcaError::invalid(
            "data",
            "source",
            "sqlite feature is required for this source",
        )),
        other => Err(DcaError::invalid(
            "data",
            "source",
            format!("unknown source '{other}' (expected csv or sqlite)"),
        )),
    }
}

fn run_score(
    config_path: &Path,
    overrides: &ScoreOverrides,
    as_of: Option<NaiveDate>,
    output_path: Option<&Path>,
    debug: bool,
) -> ExitCode {
    let adapter = match load_validated(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let setup = build_dashboard_params(&adapter, overrides).and_then(|params| {
        Ok((
            params,
            load_instruments(&adapter)?,
            load_macro_indicators(&adapter)?,
            open_data_port(&adapter)?,
        ))
    });
    let (params, instruments, macro_indicators, data_port) = match setup {
        Ok(s) => s,
        Err(e) => {
            log::error!("{e}");
            return (&e).into();
        }
    };

    let output = output_path
        .map(|p| p.display().to_string())
        .or_else(|| adapter.get_string("report", "output"));

    run_score_pipeline(
        data_port.as_ref(),
        &instruments,
        &macro_indicators,
        &params,
        as_of.unwrap_or_else(today),
        output.as_deref(),
        debug,
    )
}

pub fn run_score_pipeline(
    data_port: &dyn DataPort,
    instruments: &[Instrument],
    macro_indicators: &[MacroIndicator],
    params: &DashboardParams,
    as_of: NaiveDate,
    output_path: Option<&str>,
    debug: bool,
) -> ExitCode {
    log::info!(
        "Scoring {} instruments as of {} (threshold {}%, {}, {})",
        instruments.len(),
        as_of,
        params.scoring.threshold_pct,
        params.scoring.band,
        params.policy
    );

    let inputs = fetch_inputs(
        data_port,
        instruments,
        macro_indicators,
        &params.windows,
        as_of,
    );

    if inputs.prices.values().all(|s| s.is_empty()) {
        let err = DcaError::NoData {
            symbol: "any configured instrument".to_string(),
        };
        log::error!("{err}");
        return (&err).into();
    }

    let snapshot = build_snapshot(instruments, macro_indicators, &inputs, params);

    for condition in &snapshot.conditions {
        log::warn!("{condition}");
    }

    print_snapshot(&snapshot, params, debug);

    if let Some(path) = output_path {
        if let Err(e) = CsvReportAdapter.write(&snapshot, path) {
            log::error!("{e}");
            return (&e).into();
        }
    }

    ExitCode::SUCCESS
}

fn badges(summary: &crate::domain::dashboard::InstrumentSummary) -> String {
    summary
        .score
        .windows
        .iter()
        .map(|w| match w.stance() {
            Some(stance) => format!("{} {}", w.window.label, stance.arrow()),
            None => format!("{} -", w.window.label),
        })
        .collect::<Vec<_>>()
        .join("  ")
}

pub fn print_snapshot(snapshot: &DashboardSnapshot, params: &DashboardParams, debug: bool) {
    println!(
        "=== DCA Allocation ({:.0}% equities, policy {}) ===",
        params.budget_pct, params.policy
    );
    for summary in &snapshot.instruments {
        match summary.latest {
            Some(latest) => println!(
                "  {:<20} {:>10.2} {:+7.2}%  raw {:+5.2}  alloc {:5.1}%",
                summary.instrument.name,
                latest.value,
                summary.daily_change_pct,
                summary.score.raw_score,
                summary.allocation_pct
            ),
            None => println!(
                "  {:<20} {:>10} {:>8}  raw {:+5.2}  alloc {:5.1}%",
                summary.instrument.name,
                "N/A",
                "",
                summary.score.raw_score,
                summary.allocation_pct
            ),
        }
        println!("  {:<20} {}", "", badges(summary));

        if debug {
            print_debug(summary, snapshot, params);
        }
    }

    println!("\n=== Macro ===");
    for reading in &snapshot.macros {
        println!("  {reading}");
    }
}

fn print_debug(
    summary: &crate::domain::dashboard::InstrumentSummary,
    snapshot: &DashboardSnapshot,
    params: &DashboardParams,
) {
    let last = summary.latest.map(|p| p.value).unwrap_or(f64::NAN);
    for w in &summary.score.windows {
        match &w.outcome {
            WindowOutcome::Scored { mean, diff, stance } => println!(
                "      {}: last={:.2}, mean={:.2}, diff={:.4}, score={:+.1}",
                w.window.label,
                last,
                mean,
                diff,
                stance.score()
            ),
            WindowOutcome::Insufficient { .. } => {
                println!("      {}: not enough data", w.window.label)
            }
            WindowOutcome::Undefined { .. } => {
                println!("      {}: zero trailing mean", w.window.label)
            }
        }
    }
    let raw = summary.score.raw_score;
    match params.policy {
        AllocationPolicy::Shift => println!(
            "      raw={:+.2}, shift={:.2}, adj={:+.2}",
            raw, snapshot.allocation.shift, summary.adjusted_score
        ),
        AllocationPolicy::BetaDownweight { beta } if raw < 0.0 => println!(
            "      raw={:+.2}, adj={:+.2} = {}x{:.2}",
            raw, summary.adjusted_score, beta, -raw
        ),
        AllocationPolicy::BetaDownweight { .. } => println!(
            "      raw={:+.2}, adj={:+.2} = v",
            raw, summary.adjusted_score
        ),
    }
}

fn run_macro(config_path: &Path, as_of: Option<NaiveDate>) -> ExitCode {
    let adapter = match load_validated(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let setup = load_macro_indicators(&adapter)
        .and_then(|indicators| Ok((indicators, open_data_port(&adapter)?)));
    let (indicators, data_port) = match setup {
        Ok(s) => s,
        Err(e) => {
            log::error!("{e}");
            return (&e).into();
        }
    };

    let inputs = fetch_inputs(
        data_port.as_ref(),
        &[],
        &indicators,
        &[],
        as_of.unwrap_or_else(today),
    );
    let snapshot = build_snapshot(&[], &indicators, &inputs, &DashboardParams::default());

    if snapshot.macros.iter().all(|m| m.latest.is_none()) {
        log::warn!("no macro data available");
    }
    for reading in &snapshot.macros {
        println!("{reading}");
    }
    ExitCode::SUCCESS
}

fn run_info(config_path: &Path, ticker: Option<&str>) -> ExitCode {
    let adapter = match load_validated(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let setup = load_instruments(&adapter)
        .and_then(|instruments| Ok((instruments, open_data_port(&adapter)?)));
    let (instruments, data_port) = match setup {
        Ok(s) => s,
        Err(e) => {
            log::error!("{e}");
            return (&e).into();
        }
    };

    let tickers: Vec<(String, String)> = match ticker {
        Some(t) => vec![(t.to_string(), t.to_string())],
        None => instruments
            .into_iter()
            .map(|i| (i.name, i.ticker))
            .collect(),
    };

    for (name, t) in &tickers {
        match data_port.get_data_range(t) {
            Ok(Some((min_date, max_date, count))) => {
                println!("{} ({}): {} points, {} to {}", name, t, count, min_date, max_date);
            }
            Ok(None) => {
                log::warn!("{} ({}): no data found", name, t);
            }
            Err(e) => {
                log::error!("error querying {} ({}): {}", name, t, e);
            }
        }
    }
    ExitCode::SUCCESS
}

fn run_validate(config_path: &Path) -> ExitCode {
    let adapter = match load_validated(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let summary = build_dashboard_params(&adapter, &ScoreOverrides::default()).and_then(|p| {
        Ok((
            p,
            load_instruments(&adapter)?,
            load_macro_indicators(&adapter)?,
        ))
    });
    let (params, instruments, indicators) = match summary {
        Ok(s) => s,
        Err(e) => {
            log::error!("{e}");
            return (&e).into();
        }
    };

    println!("Scoring:     threshold {}%, {}", params.scoring.threshold_pct, params.scoring.band);
    println!("Allocation:  {} over {}%", params.policy, params.budget_pct);
    println!(
        "Windows:     {}",
        params
            .windows
            .iter()
            .map(|w| w.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!(
        "Instruments: {}",
        instruments
            .iter()
            .map(|i| format!("{} ({})", i.name, i.ticker))
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!(
        "Macro:       {}",
        indicators
            .iter()
            .map(|m| format!("{} ({})", m.label, m.code))
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}
