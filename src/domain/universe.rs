//! Tracked instruments and macro indicators.
//!
//! Both are (display name, source symbol) pairs. The configured lists
//! replace the built-in defaults; names must be unique.

use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instrument {
    pub name: String,
    pub ticker: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroIndicator {
    pub label: String,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UniverseError {
    #[error("empty name or symbol in entry '{0}'")]
    EmptyEntry(String),

    #[error("duplicate name: {0}")]
    DuplicateName(String),
}

pub fn default_instruments() -> Vec<Instrument> {
    [
        ("S&P500", "SPY"),
        ("NASDAQ100", "QQQ"),
        ("CAC40", "^FCHI"),
        ("EURO STOXX50", "FEZ"),
        ("EURO STOXX600 TECH", "EXV3.DE"),
        ("NIKKEI 225", "^N225"),
        ("WORLD", "VT"),
        ("EMERGING", "EEM"),
    ]
    .into_iter()
    .map(|(name, ticker)| Instrument {
        name: name.to_string(),
        ticker: ticker.to_string(),
    })
    .collect()
}

pub fn default_macro_indicators() -> Vec<MacroIndicator> {
    [
        ("CAPE10", "CAPE"),
        ("Fed Funds Rate", "FEDFUNDS"),
        ("CPI YoY", "CPIAUCSL"),
        ("ECY", "DGS10"),
    ]
    .into_iter()
    .map(|(label, code)| MacroIndicator {
        label: label.to_string(),
        code: code.to_string(),
    })
    .collect()
}

/// Validates (name, symbol) pairs: both non-empty, names unique.
pub fn parse_pairs(
    entries: Vec<(String, String)>,
) -> Result<Vec<(String, String)>, UniverseError> {
    let mut seen = HashSet::new();
    let mut pairs = Vec::with_capacity(entries.len());

    for (name, symbol) in entries {
        let name = name.trim().to_string();
        let symbol = symbol.trim().to_string();
        if name.is_empty() || symbol.is_empty() {
            return Err(UniverseError::EmptyEntry(format!("{name}={symbol}")));
        }
        if !seen.insert(name.clone()) {
            return Err(UniverseError::DuplicateName(name));
        }
        pairs.push((name, symbol));
    }

    Ok(pairs)
}

pub fn parse_instruments(
    entries: Vec<(String, String)>,
) -> Result<Vec<Instrument>, UniverseError> {
    Ok(parse_pairs(entries)?
        .into_iter()
        .map(|(name, ticker)| Instrument { name, ticker })
        .collect())
}

pub fn parse_macro_indicators(
    entries: Vec<(String, String)>,
) -> Result<Vec<MacroIndicator>, UniverseError> {
    Ok(parse_pairs(entries)?
        .into_iter()
        .map(|(label, code)| MacroIndicator { label, code })
        .collect())
}
