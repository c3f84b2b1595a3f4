//! Domain error types and non-fatal scoring conditions.

use std::fmt;

/// Top-level error type for dcadash.
///
/// Only I/O-facing work (configuration, data adapters, report writing) can
/// fail. Scoring and allocation never return errors; see [`ScoreCondition`].
#[derive(Debug, thiserror::Error)]
pub enum DcaError {
    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("no data for {symbol}")]
    NoData { symbol: String },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl DcaError {
    pub(crate) fn invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        DcaError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&DcaError> for std::process::ExitCode {
    fn from(err: &DcaError) -> Self {
        let code: u8 = match err {
            DcaError::Io(_) => 1,
            DcaError::ConfigParse { .. }
            | DcaError::ConfigMissing { .. }
            | DcaError::ConfigInvalid { .. } => 2,
            DcaError::Database { .. } | DcaError::DatabaseQuery { .. } => 3,
            DcaError::Report { .. } => 4,
            DcaError::NoData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}

/// Conditions the scorer and allocator absorb instead of failing.
#[derive(Debug, Clone, PartialEq)]
pub enum ScoreCondition {
    /// A lookback window is longer than the available history.
    InsufficientData {
        instrument: String,
        window: String,
        observations: usize,
        required: usize,
    },
    /// The instrument has no usable observations at all.
    EmptySeries { instrument: String },
    /// Every adjusted score is zero, so every allocation is zero.
    DegenerateNormalization,
}

impl fmt::Display for ScoreCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreCondition::InsufficientData {
                instrument,
                window,
                observations,
                required,
            } => write!(
                f,
                "{instrument}: {window} window skipped (have {observations} observations, need {required})"
            ),
            ScoreCondition::EmptySeries { instrument } => {
                write!(f, "{instrument}: no price data, allocation forced to 0")
            }
            ScoreCondition::DegenerateNormalization => {
                write!(f, "all adjusted scores are zero, allocations are all 0")
            }
        }
    }
}
