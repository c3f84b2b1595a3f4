//! DCA allocation across the instrument basket.
//!
//! Raw scores can be negative, so they are first mapped to non-negative
//! adjusted scores by an [`AdjustmentStrategy`], then normalised so that the
//! allocations sum to the budget (half of the notional portfolio by
//! default). When every adjusted score is zero the denominator is replaced by
//! 1 and every allocation is zero.

use crate::domain::error::ScoreCondition;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Share of the notional portfolio distributed across the basket.
pub const DEFAULT_BUDGET_PCT: f64 = 50.0;
pub const DEFAULT_BETA: f64 = 0.5;

#[derive(Debug, Clone, PartialEq)]
pub struct AdjustedScores {
    pub scores: BTreeMap<String, f64>,
    /// Amount added to every raw score; zero for strategies that don't shift.
    pub shift: f64,
}

pub trait AdjustmentStrategy {
    fn name(&self) -> &'static str;
    fn adjust(&self, raw_scores: &BTreeMap<String, f64>) -> AdjustedScores;
}

/// Adds `-min(raw)` to every score when the minimum is negative.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ShiftToNonNegative;

impl AdjustmentStrategy for ShiftToNonNegative {
    fn name(&self) -> &'static str {
        "shift"
    }

    fn adjust(&self, raw_scores: &BTreeMap<String, f64>) -> AdjustedScores {
        let min = raw_scores.values().copied().fold(f64::INFINITY, f64::min);
        let shift = if min < 0.0 { -min } else { 0.0 };
        AdjustedScores {
            scores: raw_scores
                .iter()
                .map(|(name, &raw)| (name.clone(), raw + shift))
                .collect(),
            shift,
        }
    }
}

/// Keeps non-negative scores and maps a negative score `v` to `beta * -v`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BetaDownweight {
    beta: f64,
}

impl BetaDownweight {
    /// `beta` is clamped to [0, 1].
    pub fn new(beta: f64) -> Self {
        Self {
            beta: beta.clamp(0.0, 1.0),
        }
    }

    pub fn beta(&self) -> f64 {
        self.beta
    }
}

impl AdjustmentStrategy for BetaDownweight {
    fn name(&self) -> &'static str {
        "beta"
    }

    fn adjust(&self, raw_scores: &BTreeMap<String, f64>) -> AdjustedScores {
        AdjustedScores {
            scores: raw_scores
                .iter()
                .map(|(name, &raw)| {
                    let adjusted = if raw >= 0.0 { raw } else { self.beta * -raw };
                    (name.clone(), adjusted)
                })
                .collect(),
            shift: 0.0,
        }
    }
}

/// Configuration-facing choice of adjustment strategy.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum AllocationPolicy {
    #[default]
    Shift,
    BetaDownweight { beta: f64 },
}

/// Strategy name as written in `[allocation] policy` or `--policy`.
/// The beta factor is configured separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PolicyKind {
    #[default]
    Shift,
    Beta,
}

impl PolicyKind {
    pub fn with_beta(self, beta: f64) -> AllocationPolicy {
        match self {
            PolicyKind::Shift => AllocationPolicy::Shift,
            PolicyKind::Beta => AllocationPolicy::BetaDownweight { beta },
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyKind::Shift => write!(f, "shift"),
            PolicyKind::Beta => write!(f, "beta"),
        }
    }
}

impl FromStr for PolicyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "shift" | "shift_to_nonnegative" => Ok(PolicyKind::Shift),
            "beta" | "beta_downweight" => Ok(PolicyKind::Beta),
            other => Err(format!(
                "unknown allocation policy '{other}' (expected shift or beta)"
            )),
        }
    }
}

impl fmt::Display for AllocationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllocationPolicy::Shift => write!(f, "shift"),
            AllocationPolicy::BetaDownweight { beta } => write!(f, "beta({beta})"),
        }
    }
}

impl AdjustmentStrategy for AllocationPolicy {
    fn name(&self) -> &'static str {
        match self {
            AllocationPolicy::Shift => ShiftToNonNegative.name(),
            AllocationPolicy::BetaDownweight { beta } => BetaDownweight::new(*beta).name(),
        }
    }

    fn adjust(&self, raw_scores: &BTreeMap<String, f64>) -> AdjustedScores {
        match self {
            AllocationPolicy::Shift => ShiftToNonNegative.adjust(raw_scores),
            AllocationPolicy::BetaDownweight { beta } => {
                BetaDownweight::new(*beta).adjust(raw_scores)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Allocation {
    pub adjusted: BTreeMap<String, f64>,
    pub percents: BTreeMap<String, f64>,
    pub shift: f64,
    pub budget_pct: f64,
    /// Every adjusted score was zero.
    pub degenerate: bool,
}

impl Allocation {
    pub fn percent(&self, name: &str) -> f64 {
        self.percents.get(name).copied().unwrap_or(0.0)
    }

    pub fn adjusted_score(&self, name: &str) -> f64 {
        self.adjusted.get(name).copied().unwrap_or(0.0)
    }

    pub fn total(&self) -> f64 {
        self.percents.values().sum()
    }

    pub fn conditions(&self) -> Vec<ScoreCondition> {
        if self.degenerate {
            vec![ScoreCondition::DegenerateNormalization]
        } else {
            Vec::new()
        }
    }
}

pub fn compute_allocations<S>(
    raw_scores: &BTreeMap<String, f64>,
    strategy: &S,
    budget_pct: f64,
) -> Allocation
where
    S: AdjustmentStrategy + ?Sized,
{
    let sanitized: BTreeMap<String, f64> = raw_scores
        .iter()
        .map(|(name, &raw)| {
            if raw.is_finite() {
                (name.clone(), raw)
            } else {
                log::warn!("{name}: non-finite raw score {raw}, treated as 0");
                (name.clone(), 0.0)
            }
        })
        .collect();

    let AdjustedScores { scores, shift } = strategy.adjust(&sanitized);
    let sum: f64 = scores.values().sum();
    let degenerate = sum == 0.0;
    let denominator = if degenerate { 1.0 } else { sum };

    let percents = scores
        .iter()
        .map(|(name, &adj)| (name.clone(), adj / denominator * budget_pct))
        .collect();

    log::debug!(
        "allocation via {}: shift={:.2}, adjusted sum={:.2}",
        strategy.name(),
        shift,
        sum
    );
    if degenerate && !scores.is_empty() {
        log::warn!("all adjusted scores are zero, every allocation is 0%");
    }

    Allocation {
        adjusted: scores,
        percents,
        shift,
        budget_pct,
        degenerate,
    }
}
