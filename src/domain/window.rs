//! Lookback windows and the history span they require.
//!
//! A window counts observations (trading days), not calendar days. When
//! fetching data the largest window is converted to a calendar span with
//! a 10% margin for holidays and gaps.

use chrono::{Duration, NaiveDate};
use std::fmt;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;
const CALENDAR_DAYS_PER_YEAR: f64 = 365.0;
const SPAN_MARGIN: f64 = 1.1;

/// Macro indicators are fetched over a fixed six-year span.
pub const MACRO_HISTORY_DAYS: i64 = 365 * 6;

/// Longest accepted window, a century of daily observations.
pub const MAX_WINDOW_OBSERVATIONS: usize = 36_500;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LookbackWindow {
    pub label: String,
    pub days: usize,
}

impl LookbackWindow {
    pub fn new(label: impl Into<String>, days: usize) -> Self {
        Self {
            label: label.into(),
            days,
        }
    }
}

impl fmt::Display for LookbackWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.label, self.days)
    }
}

pub fn default_windows() -> Vec<LookbackWindow> {
    vec![
        LookbackWindow::new("Weekly", 7),
        LookbackWindow::new("Monthly", 30),
        LookbackWindow::new("Quarterly", 90),
        LookbackWindow::new("Annual", 365),
        LookbackWindow::new("5-year", 365 * 5),
    ]
}

/// Calendar days needed to cover `max(windows)` trading observations.
pub fn calendar_span_days(windows: &[LookbackWindow]) -> i64 {
    let max_window = windows.iter().map(|w| w.days).max().unwrap_or(0) as f64;
    (max_window / TRADING_DAYS_PER_YEAR * CALENDAR_DAYS_PER_YEAR * SPAN_MARGIN).ceil() as i64
}

/// Whole number of observations in `1..=MAX_WINDOW_OBSERVATIONS`.
pub fn parse_window_length(raw: &str) -> Option<usize> {
    raw.trim()
        .parse::<usize>()
        .ok()
        .filter(|n| (1..=MAX_WINDOW_OBSERVATIONS).contains(n))
}

/// First date to request from a data source so that every window can fill.
/// Saturates at `NaiveDate::MIN`.
pub fn history_start(as_of: NaiveDate, windows: &[LookbackWindow]) -> NaiveDate {
    Duration::try_days(calendar_span_days(windows))
        .and_then(|span| as_of.checked_sub_signed(span))
        .unwrap_or(NaiveDate::MIN)
}

pub fn macro_history_start(as_of: NaiveDate) -> NaiveDate {
    as_of - Duration::days(MACRO_HISTORY_DAYS)
}
