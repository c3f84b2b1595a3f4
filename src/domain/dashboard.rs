//! Dashboard snapshot: scores, allocations and macro readings for one run.
//!
//! Everything here is recomputed from the fetched series on every call.
//! Presentation choices (which chart period a card shows, whether a debug
//! breakdown is printed) stay with the caller.

use crate::domain::allocation::{
    compute_allocations, Allocation, AllocationPolicy, DEFAULT_BUDGET_PCT,
};
use crate::domain::deviation::{score_series, InstrumentScore, ScoringParams};
use crate::domain::error::ScoreCondition;
use crate::domain::series::{PricePoint, PriceSeries};
use crate::domain::universe::{Instrument, MacroIndicator};
use crate::domain::window::{
    default_windows, history_start, macro_history_start, LookbackWindow,
};
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardParams {
    pub windows: Vec<LookbackWindow>,
    pub scoring: ScoringParams,
    pub policy: AllocationPolicy,
    pub budget_pct: f64,
}

impl Default for DashboardParams {
    fn default() -> Self {
        Self {
            windows: default_windows(),
            scoring: ScoringParams::default(),
            policy: AllocationPolicy::default(),
            budget_pct: DEFAULT_BUDGET_PCT,
        }
    }
}

#[derive(Debug, Clone)]
pub struct InstrumentSummary {
    pub instrument: Instrument,
    pub latest: Option<PricePoint>,
    pub daily_change_pct: f64,
    pub score: InstrumentScore,
    pub adjusted_score: f64,
    pub allocation_pct: f64,
}

#[derive(Debug, Clone)]
pub struct MacroReading {
    pub indicator: MacroIndicator,
    pub latest: Option<PricePoint>,
}

impl fmt::Display for MacroReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.latest {
            Some(p) => write!(f, "{}: {:.2} ({})", self.indicator.label, p.value, p.date),
            None => write!(f, "{}: N/A", self.indicator.label),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DashboardSnapshot {
    pub instruments: Vec<InstrumentSummary>,
    pub allocation: Allocation,
    pub macros: Vec<MacroReading>,
    pub conditions: Vec<ScoreCondition>,
}

impl DashboardSnapshot {
    pub fn raw_scores(&self) -> BTreeMap<String, f64> {
        self.instruments
            .iter()
            .map(|s| (s.instrument.name.clone(), s.score.raw_score))
            .collect()
    }

    pub fn summary(&self, name: &str) -> Option<&InstrumentSummary> {
        self.instruments.iter().find(|s| s.instrument.name == name)
    }
}

/// Price series keyed by instrument name and macro series keyed by label.
#[derive(Debug, Clone, Default)]
pub struct DashboardInputs {
    pub prices: BTreeMap<String, PriceSeries>,
    pub macros: BTreeMap<String, PriceSeries>,
}

/// Fetches every series needed for a snapshot as of `as_of`.
///
/// A failed fetch is logged and replaced by an empty series so one broken
/// ticker never aborts the run.
pub fn fetch_inputs(
    data_port: &dyn DataPort,
    instruments: &[Instrument],
    macro_indicators: &[MacroIndicator],
    windows: &[LookbackWindow],
    as_of: NaiveDate,
) -> DashboardInputs {
    let start = history_start(as_of, windows);
    let mut inputs = DashboardInputs::default();

    for instrument in instruments {
        let series = match data_port.fetch_price_series(&instrument.ticker, start, as_of) {
            Ok(series) => series,
            Err(e) => {
                log::warn!("{} ({}): {}", instrument.name, instrument.ticker, e);
                PriceSeries::default()
            }
        };
        log::info!(
            "{} ({}): {} observations",
            instrument.name,
            instrument.ticker,
            series.len()
        );
        inputs.prices.insert(instrument.name.clone(), series);
    }

    let macro_start = macro_history_start(as_of);
    for indicator in macro_indicators {
        let series = match data_port.fetch_macro_series(&indicator.code, macro_start, as_of) {
            Ok(series) => series,
            Err(e) => {
                log::warn!("{} ({}): {}", indicator.label, indicator.code, e);
                PriceSeries::default()
            }
        };
        inputs.macros.insert(indicator.label.clone(), series);
    }

    inputs
}

pub fn build_snapshot(
    instruments: &[Instrument],
    macro_indicators: &[MacroIndicator],
    inputs: &DashboardInputs,
    params: &DashboardParams,
) -> DashboardSnapshot {
    let empty = PriceSeries::default();

    let scored: Vec<(Instrument, &PriceSeries, InstrumentScore)> = instruments
        .iter()
        .map(|instrument| {
            let series = inputs.prices.get(&instrument.name).unwrap_or(&empty);
            let score = score_series(&instrument.name, series, &params.windows, &params.scoring);
            (instrument.clone(), series, score)
        })
        .collect();

    // Instruments without data are left out of the adjustment and pinned at 0%.
    let raw_scores: BTreeMap<String, f64> = scored
        .iter()
        .filter(|(_, _, score)| score.latest.is_some())
        .map(|(instrument, _, score)| (instrument.name.clone(), score.raw_score))
        .collect();
    let mut allocation = compute_allocations(&raw_scores, &params.policy, params.budget_pct);
    for (instrument, _, score) in &scored {
        if score.latest.is_none() {
            allocation.adjusted.insert(instrument.name.clone(), 0.0);
            allocation.percents.insert(instrument.name.clone(), 0.0);
        }
    }

    let mut conditions: Vec<ScoreCondition> = Vec::new();
    let summaries: Vec<InstrumentSummary> = scored
        .into_iter()
        .map(|(instrument, series, score)| {
            conditions.extend(score.conditions());
            InstrumentSummary {
                latest: series.latest(),
                daily_change_pct: series.daily_change_pct(),
                adjusted_score: allocation.adjusted_score(&instrument.name),
                allocation_pct: allocation.percent(&instrument.name),
                instrument,
                score,
            }
        })
        .collect();
    conditions.extend(allocation.conditions());

    let macros: Vec<MacroReading> = macro_indicators
        .iter()
        .map(|indicator| MacroReading {
            indicator: indicator.clone(),
            latest: inputs.macros.get(&indicator.label).and_then(PriceSeries::latest),
        })
        .collect();

    DashboardSnapshot {
        instruments: summaries,
        allocation,
        macros,
        conditions,
    }
}
