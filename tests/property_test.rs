//! Property-based tests for scoring and allocation invariants.

mod common;

use common::*;
use dcadash::domain::allocation::{
    compute_allocations, AllocationPolicy, BetaDownweight, ShiftToNonNegative,
};
use dcadash::domain::deviation::{classify, score_series, BandPolicy, ScoringParams};
use dcadash::domain::window::LookbackWindow;
use proptest::prelude::*;
use std::collections::BTreeMap;

fn windows() -> Vec<LookbackWindow> {
    vec![
        LookbackWindow::new("Weekly", 7),
        LookbackWindow::new("Fortnight", 14),
        LookbackWindow::new("Monthly", 30),
        LookbackWindow::new("Quarterly", 90),
    ]
}

fn raw_scores_strategy() -> impl Strategy<Value = BTreeMap<String, f64>> {
    prop::collection::vec(-5.0f64..5.0, 1..10).prop_map(|scores| {
        scores
            .into_iter()
            .enumerate()
            .map(|(i, s)| (format!("ETF{i}"), s))
            .collect()
    })
}

fn band_strategy() -> impl Strategy<Value = BandPolicy> {
    prop_oneof![Just(BandPolicy::FourBand), Just(BandPolicy::TwoBand)]
}

proptest! {
    #[test]
    fn shift_allocations_sum_to_budget(raw in raw_scores_strategy(), budget in 1.0f64..100.0) {
        let allocation = compute_allocations(&raw, &ShiftToNonNegative, budget);
        let adjusted_sum: f64 = allocation.adjusted.values().sum();
        if adjusted_sum != 0.0 {
            prop_assert!((allocation.total() - budget).abs() < 1e-6);
            prop_assert!(!allocation.degenerate);
        } else {
            prop_assert!(allocation.degenerate);
            prop_assert_eq!(allocation.total(), 0.0);
        }
    }

    #[test]
    fn beta_allocations_sum_to_budget(raw in raw_scores_strategy(), beta in 0.0f64..=1.0) {
        let allocation = compute_allocations(&raw, &BetaDownweight::new(beta), 50.0);
        let adjusted_sum: f64 = allocation.adjusted.values().sum();
        if adjusted_sum != 0.0 {
            prop_assert!((allocation.total() - 50.0).abs() < 1e-6);
        }
    }

    #[test]
    fn allocations_are_never_negative(raw in raw_scores_strategy(), beta in 0.0f64..=1.0) {
        for policy in [AllocationPolicy::Shift, AllocationPolicy::BetaDownweight { beta }] {
            let allocation = compute_allocations(&raw, &policy, 50.0);
            for (name, pct) in &allocation.percents {
                prop_assert!(*pct >= 0.0, "{} got {}", name, pct);
            }
        }
    }

    #[test]
    fn shift_leaves_minimum_at_zero(raw in raw_scores_strategy()) {
        let allocation = compute_allocations(&raw, &ShiftToNonNegative, 50.0);
        let min = allocation.adjusted.values().copied().fold(f64::INFINITY, f64::min);
        let raw_min = raw.values().copied().fold(f64::INFINITY, f64::min);
        if raw_min < 0.0 {
            prop_assert!(min.abs() < 1e-12);
        } else {
            prop_assert_eq!(allocation.shift, 0.0);
        }
    }

    #[test]
    fn raw_score_ignores_window_order(
        values in prop::collection::vec(1.0f64..1000.0, 0..120),
        shuffled in Just(windows()).prop_shuffle(),
        band in band_strategy(),
    ) {
        let series = series_ending(date(2025, 6, 30), &values);
        let params = ScoringParams { threshold_pct: 10.0, band };
        let ordered = score_series("X", &series, &windows(), &params);
        let permuted = score_series("X", &series, &shuffled, &params);
        prop_assert_eq!(ordered.raw_score, permuted.raw_score);
        prop_assert_eq!(ordered.windows, permuted.windows);
    }

    #[test]
    fn raw_score_bounded_by_eligible_windows(
        values in prop::collection::vec(1.0f64..1000.0, 0..120),
        band in band_strategy(),
    ) {
        let series = series_ending(date(2025, 6, 30), &values);
        let params = ScoringParams { threshold_pct: 10.0, band };
        let score = score_series("X", &series, &windows(), &params);
        let n = score.eligible_windows() as f64;
        prop_assert!(score.raw_score <= n);
        prop_assert!(score.raw_score >= -n);
    }

    #[test]
    fn classify_is_monotone(a in -1.0f64..1.0, b in -1.0f64..1.0, band in band_strategy()) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(classify(lo, 10.0, band).score() >= classify(hi, 10.0, band).score());
    }
}
