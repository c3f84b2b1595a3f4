//! Deviation scoring.
//!
//! For every lookback window W the latest price is compared with the mean of
//! the last W observations:
//!
//! ```text
//! diff = (latest - mean(last W)) / mean(last W)
//! ```
//!
//! `diff` is classified into a [`Stance`] by a threshold-banded step function
//! ([`BandPolicy`]). The instrument's raw score is the sum of the stance
//! scores over every window that has enough history. Windows that are too
//! long for the series are skipped, never counted as zero.

use crate::domain::error::ScoreCondition;
use crate::domain::series::{PricePoint, PriceSeries};
use crate::domain::window::LookbackWindow;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_THRESHOLD_PCT: f64 = 10.0;

/// Step function used to turn a deviation into a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BandPolicy {
    /// diff <= -t: 1.0, diff <= 0: 0.5, diff < t: -0.5, otherwise -1.0.
    #[default]
    FourBand,
    /// diff < 0: 1.0, diff < t: 0.5, otherwise -1.0.
    TwoBand,
}

impl fmt::Display for BandPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BandPolicy::FourBand => write!(f, "four_band"),
            BandPolicy::TwoBand => write!(f, "two_band"),
        }
    }
}

impl FromStr for BandPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "four_band" | "four-band" | "4band" | "4" => Ok(BandPolicy::FourBand),
            "two_band" | "two-band" | "2band" | "2" => Ok(BandPolicy::TwoBand),
            other => Err(format!(
                "unknown band policy '{other}' (expected four_band or two_band)"
            )),
        }
    }
}

/// Buy/avoid signal for one window, ordered from most to least attractive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stance {
    StrongBuy,
    Buy,
    Caution,
    Avoid,
}

impl Stance {
    pub fn score(self) -> f64 {
        match self {
            Stance::StrongBuy => 1.0,
            Stance::Buy => 0.5,
            Stance::Caution => -0.5,
            Stance::Avoid => -1.0,
        }
    }

    pub fn arrow(self) -> char {
        match self {
            Stance::StrongBuy => '↑',
            Stance::Buy => '↗',
            Stance::Caution => '↘',
            Stance::Avoid => '↓',
        }
    }

    /// Badge colour used by dashboards.
    pub fn color(self) -> &'static str {
        match self {
            Stance::StrongBuy => "green",
            Stance::Buy => "#c8e6c9",
            Stance::Caution => "orange",
            Stance::Avoid => "crimson",
        }
    }
}

pub fn classify(diff: f64, threshold_pct: f64, band: BandPolicy) -> Stance {
    let t = threshold_pct / 100.0;
    match band {
        BandPolicy::FourBand => {
            if diff <= -t {
                Stance::StrongBuy
            } else if diff <= 0.0 {
                Stance::Buy
            } else if diff < t {
                Stance::Caution
            } else {
                Stance::Avoid
            }
        }
        BandPolicy::TwoBand => {
            if diff < 0.0 {
                Stance::StrongBuy
            } else if diff < t {
                Stance::Buy
            } else {
                Stance::Avoid
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringParams {
    pub threshold_pct: f64,
    pub band: BandPolicy,
}

impl Default for ScoringParams {
    fn default() -> Self {
        Self {
            threshold_pct: DEFAULT_THRESHOLD_PCT,
            band: BandPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WindowOutcome {
    Scored { mean: f64, diff: f64, stance: Stance },
    /// Fewer observations than the window length.
    Insufficient { observations: usize },
    /// The trailing mean is zero, so the deviation has no meaning.
    Undefined { mean: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct WindowScore {
    pub window: LookbackWindow,
    pub outcome: WindowOutcome,
}

impl WindowScore {
    pub fn score(&self) -> Option<f64> {
        match self.outcome {
            WindowOutcome::Scored { stance, .. } => Some(stance.score()),
            _ => None,
        }
    }

    pub fn stance(&self) -> Option<Stance> {
        match self.outcome {
            WindowOutcome::Scored { stance, .. } => Some(stance),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentScore {
    pub name: String,
    pub latest: Option<PricePoint>,
    pub raw_score: f64,
    /// Per-window breakdown, shortest window first.
    pub windows: Vec<WindowScore>,
}

impl InstrumentScore {
    pub fn eligible_windows(&self) -> usize {
        self.windows.iter().filter(|w| w.score().is_some()).count()
    }

    pub fn window(&self, label: &str) -> Option<&WindowScore> {
        self.windows.iter().find(|w| w.window.label == label)
    }

    pub fn conditions(&self) -> Vec<ScoreCondition> {
        if self.latest.is_none() {
            return vec![ScoreCondition::EmptySeries {
                instrument: self.name.clone(),
            }];
        }
        self.windows
            .iter()
            .filter_map(|w| match w.outcome {
                WindowOutcome::Insufficient { observations } => {
                    Some(ScoreCondition::InsufficientData {
                        instrument: self.name.clone(),
                        window: w.window.label.clone(),
                        observations,
                        required: w.window.days,
                    })
                }
                _ => None,
            })
            .collect()
    }
}

fn score_window(
    series: &PriceSeries,
    latest: f64,
    window: &LookbackWindow,
    params: &ScoringParams,
) -> WindowOutcome {
    let Some(mean) = series.trailing_mean(window.days) else {
        return WindowOutcome::Insufficient {
            observations: series.len(),
        };
    };
    let diff = (latest - mean) / mean;
    if !diff.is_finite() {
        return WindowOutcome::Undefined { mean };
    }
    WindowOutcome::Scored {
        mean,
        diff,
        stance: classify(diff, params.threshold_pct, params.band),
    }
}

pub fn score_series(
    name: &str,
    series: &PriceSeries,
    windows: &[LookbackWindow],
    params: &ScoringParams,
) -> InstrumentScore {
    let mut ordered: Vec<&LookbackWindow> = windows.iter().collect();
    ordered.sort_by(|a, b| a.days.cmp(&b.days).then_with(|| a.label.cmp(&b.label)));

    let latest = series.latest();
    let breakdown: Vec<WindowScore> = ordered
        .into_iter()
        .map(|window| {
            let outcome = match latest {
                Some(last) => score_window(series, last.value, window, params),
                None => WindowOutcome::Insufficient { observations: 0 },
            };
            WindowScore {
                window: window.clone(),
                outcome,
            }
        })
        .collect();

    for w in &breakdown {
        match (&w.outcome, latest) {
            (WindowOutcome::Scored { mean, diff, stance }, Some(last)) => log::debug!(
                "{} {}: last={:.2}, mean={:.2}, diff={:.4}, score={:+.1}",
                name,
                w.window.label,
                last.value,
                mean,
                diff,
                stance.score()
            ),
            (WindowOutcome::Undefined { .. }, _) => {
                log::debug!("{} {}: zero trailing mean", name, w.window.label)
            }
            _ => log::debug!("{} {}: not enough data", name, w.window.label),
        }
    }

    let raw_score = breakdown.iter().filter_map(WindowScore::score).sum();

    InstrumentScore {
        name: name.to_string(),
        latest,
        raw_score,
        windows: breakdown,
    }
}

/// Raw score per instrument. Empty series score 0.
pub fn compute_raw_scores(
    prices: &BTreeMap<String, PriceSeries>,
    windows: &[LookbackWindow],
    threshold_pct: f64,
    band: BandPolicy,
) -> BTreeMap<String, f64> {
    let params = ScoringParams {
        threshold_pct,
        band,
    };
    prices
        .iter()
        .map(|(name, series)| {
            let score = score_series(name, series, windows, &params);
            (name.clone(), score.raw_score)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::window::default_windows;
    use chrono::{Duration, NaiveDate};

    fn series_from(values: &[f64]) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        PriceSeries::from_pairs(
            values
                .iter()
                .enumerate()
                .map(|(i, &v)| (start + Duration::days(i as i64), v)),
        )
    }

    #[test]
    fn four_band_boundaries() {
        let b = BandPolicy::FourBand;
        assert_eq!(classify(-0.2, 10.0, b), Stance::StrongBuy);
        assert_eq!(classify(-0.1, 10.0, b), Stance::StrongBuy);
        assert_eq!(classify(-0.05, 10.0, b), Stance::Buy);
        assert_eq!(classify(0.0, 10.0, b), Stance::Buy);
        assert_eq!(classify(0.05, 10.0, b), Stance::Caution);
        assert_eq!(classify(0.1, 10.0, b), Stance::Avoid);
        assert_eq!(classify(0.3, 10.0, b), Stance::Avoid);
    }

    #[test]
    fn two_band_boundaries() {
        let b = BandPolicy::TwoBand;
        assert_eq!(classify(-0.5, 10.0, b), Stance::StrongBuy);
        assert_eq!(classify(-0.01, 10.0, b), Stance::StrongBuy);
        assert_eq!(classify(0.0, 10.0, b), Stance::Buy);
        assert_eq!(classify(0.09, 10.0, b), Stance::Buy);
        assert_eq!(classify(0.1, 10.0, b), Stance::Avoid);
    }

    #[test]
    fn stance_scores_and_badges() {
        assert_eq!(Stance::StrongBuy.score(), 1.0);
        assert_eq!(Stance::Caution.score(), -0.5);
        assert_eq!(Stance::Avoid.arrow(), '↓');
        assert_eq!(Stance::Buy.color(), "#c8e6c9");
    }

    #[test]
    fn band_policy_parses() {
        assert_eq!("four_band".parse::<BandPolicy>(), Ok(BandPolicy::FourBand));
        assert_eq!("Two-Band".parse::<BandPolicy>(), Ok(BandPolicy::TwoBand));
        assert!("three".parse::<BandPolicy>().is_err());
    }

    #[test]
    fn flat_series_scores_half_per_eligible_window() {
        let series = series_from(&[100.0; 400]);
        let score = score_series("FLAT", &series, &default_windows(), &ScoringParams::default());

        // 7, 30, 90 and 365 fit in 400 observations, 1825 does not.
        assert_eq!(score.eligible_windows(), 4);
        assert_eq!(score.raw_score, 2.0);
        let five_year = score.window("5-year").unwrap();
        assert_eq!(
            five_year.outcome,
            WindowOutcome::Insufficient { observations: 400 }
        );
    }

    #[test]
    fn exact_threshold_below_monthly_mean_is_strong_buy() {
        // 28 x 100, then 110, then 90: monthly mean is exactly 100.
        let mut values = vec![100.0; 28];
        values.push(110.0);
        values.push(90.0);
        let series = series_from(&values);
        let windows = vec![LookbackWindow::new("Monthly", 30)];

        let score = score_series("DOWN", &series, &windows, &ScoringParams::default());
        let monthly = score.window("Monthly").unwrap();
        assert_eq!(monthly.stance(), Some(Stance::StrongBuy));
        assert_eq!(score.raw_score, 1.0);
    }

    #[test]
    fn empty_series_scores_zero() {
        let score = score_series(
            "EMPTY",
            &PriceSeries::default(),
            &default_windows(),
            &ScoringParams::default(),
        );
        assert_eq!(score.raw_score, 0.0);
        assert_eq!(score.eligible_windows(), 0);
        assert_eq!(
            score.conditions(),
            vec![ScoreCondition::EmptySeries {
                instrument: "EMPTY".into()
            }]
        );
    }

    #[test]
    fn zero_mean_window_is_undefined() {
        let series = series_from(&[0.0, 0.0, 0.0]);
        let windows = vec![LookbackWindow::new("Short", 3)];
        let score = score_series("ZERO", &series, &windows, &ScoringParams::default());
        assert_eq!(score.raw_score, 0.0);
        assert!(matches!(
            score.windows[0].outcome,
            WindowOutcome::Undefined { .. }
        ));
    }

    #[test]
    fn breakdown_is_sorted_shortest_first() {
        let series = series_from(&[100.0; 40]);
        let windows = vec![
            LookbackWindow::new("Monthly", 30),
            LookbackWindow::new("Weekly", 7),
        ];
        let score = score_series("X", &series, &windows, &ScoringParams::default());
        assert_eq!(score.windows[0].window.label, "Weekly");
        assert_eq!(score.windows[1].window.label, "Monthly");
    }

    #[test]
    fn insufficient_windows_are_reported_as_conditions() {
        let series = series_from(&[100.0; 10]);
        let windows = vec![
            LookbackWindow::new("Weekly", 7),
            LookbackWindow::new("Monthly", 30),
        ];
        let score = score_series("SHORT", &series, &windows, &ScoringParams::default());
        assert_eq!(
            score.conditions(),
            vec![ScoreCondition::InsufficientData {
                instrument: "SHORT".into(),
                window: "Monthly".into(),
                observations: 10,
                required: 30,
            }]
        );
    }

    #[test]
    fn compute_raw_scores_covers_every_instrument() {
        let mut prices = BTreeMap::new();
        prices.insert("FLAT".to_string(), series_from(&[100.0; 400]));
        prices.insert("EMPTY".to_string(), PriceSeries::default());

        let scores = compute_raw_scores(&prices, &default_windows(), 10.0, BandPolicy::FourBand);
        assert_eq!(scores.len(), 2);
        assert_eq!(scores["FLAT"], 2.0);
        assert_eq!(scores["EMPTY"], 0.0);
    }

    #[test]
    fn rising_series_scores_negative() {
        // Linear rise of 1 per day from 100: latest is far above every mean.
        let values: Vec<f64> = (0..400).map(|i| 100.0 + i as f64).collect();
        let series = series_from(&values);
        let windows = vec![
            LookbackWindow::new("Weekly", 7),
            LookbackWindow::new("Annual", 365),
        ];
        let score = score_series("UP", &series, &windows, &ScoringParams::default());
        // Weekly: mean 496, diff ~0.006 -> -0.5. Annual: mean 317, diff ~0.57 -> -1.0
        assert_eq!(score.window("Weekly").unwrap().stance(), Some(Stance::Caution));
        assert_eq!(score.window("Annual").unwrap().stance(), Some(Stance::Avoid));
        assert_eq!(score.raw_score, -1.5);
    }
}
