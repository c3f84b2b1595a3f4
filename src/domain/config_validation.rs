//! Configuration validation.
//!
//! Validates every configured field before any data is loaded. Absent keys
//! fall back to defaults and are not errors.

use crate::domain::allocation::PolicyKind;
use crate::domain::deviation::BandPolicy;
use crate::domain::error::DcaError;
use crate::domain::universe::{parse_instruments, parse_macro_indicators};
use crate::domain::window::{parse_window_length, LookbackWindow, MAX_WINDOW_OBSERVATIONS};
use crate::ports::config_port::ConfigPort;

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), DcaError> {
    validate_data_source(config)?;
    validate_scoring(config)?;
    validate_allocation(config)?;
    validate_windows(config)?;
    validate_universe(config)?;
    Ok(())
}

/// Parses an optional float, rejecting values that are present but not numeric.
pub(crate) fn optional_f64(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<f64>, DcaError> {
    match config.get_string(section, key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(Some)
            .ok_or_else(|| DcaError::invalid(section, key, format!("'{raw}' is not a number"))),
    }
}

fn validate_data_source(config: &dyn ConfigPort) -> Result<(), DcaError> {
    let source = config
        .get_string("data", "source")
        .unwrap_or_else(|| "csv".to_string());
    match source.trim().to_lowercase().as_str() {
        "csv" => require(config, "csv", "prices_dir"),
        "sqlite" => require(config, "sqlite", "path"),
        other => Err(DcaError::invalid(
            "data",
            "source",
            format!("unknown source '{other}' (expected csv or sqlite)"),
        )),
    }
}

fn require(config: &dyn ConfigPort, section: &str, key: &str) -> Result<(), DcaError> {
    match config.get_string(section, key) {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(DcaError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        }),
    }
}

fn validate_scoring(config: &dyn ConfigPort) -> Result<(), DcaError> {
    if let Some(t) = optional_f64(config, "scoring", "threshold_pct")? {
        if t <= 0.0 || t >= 100.0 {
            return Err(DcaError::invalid(
                "scoring",
                "threshold_pct",
                "threshold_pct must be between 0 and 100 (exclusive)",
            ));
        }
    }
    if let Some(band) = config.get_string("scoring", "band") {
        band.parse::<BandPolicy>()
            .map_err(|reason| DcaError::invalid("scoring", "band", reason))?;
    }
    Ok(())
}

fn validate_allocation(config: &dyn ConfigPort) -> Result<(), DcaError> {
    if let Some(policy) = config.get_string("allocation", "policy") {
        policy
            .parse::<PolicyKind>()
            .map_err(|reason| DcaError::invalid("allocation", "policy", reason))?;
    }
    if let Some(beta) = optional_f64(config, "allocation", "beta")? {
        if !(0.0..=1.0).contains(&beta) {
            return Err(DcaError::invalid(
                "allocation",
                "beta",
                "beta must be between 0 and 1",
            ));
        }
    }
    if let Some(budget) = optional_f64(config, "allocation", "budget_pct")? {
        if budget <= 0.0 || budget > 100.0 {
            return Err(DcaError::invalid(
                "allocation",
                "budget_pct",
                "budget_pct must be in (0, 100]",
            ));
        }
    }
    Ok(())
}

/// One `[windows]` entry, `label = observations`.
pub(crate) fn parse_window(label: String, days: &str) -> Result<LookbackWindow, DcaError> {
    match parse_window_length(days) {
        Some(n) => Ok(LookbackWindow::new(label, n)),
        None => Err(DcaError::invalid(
            "windows",
            &label,
            format!("window length must be between 1 and {MAX_WINDOW_OBSERVATIONS} observations"),
        )),
    }
}

fn validate_windows(config: &dyn ConfigPort) -> Result<(), DcaError> {
    for (label, days) in config.section_entries("windows") {
        parse_window(label, &days)?;
    }
    Ok(())
}

fn validate_universe(config: &dyn ConfigPort) -> Result<(), DcaError> {
    parse_instruments(config.section_entries("instruments"))
        .map_err(|e| DcaError::invalid("instruments", "*", e.to_string()))?;
    parse_macro_indicators(config.section_entries("macro"))
        .map_err(|e| DcaError::invalid("macro", "*", e.to_string()))?;
    Ok(())
}
