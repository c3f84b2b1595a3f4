//! Dated value series for instruments and macro indicators.

use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Chronologically ordered observations for one instrument or indicator.
///
/// Non-finite values are dropped and points are sorted by date on
/// construction. Gaps between dates are allowed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn new(mut points: Vec<PricePoint>) -> Self {
        points.retain(|p| p.value.is_finite());
        points.sort_by_key(|p| p.date);
        Self { points }
    }

    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (NaiveDate, f64)>,
    {
        Self::new(
            pairs
                .into_iter()
                .map(|(date, value)| PricePoint { date, value })
                .collect(),
        )
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn latest(&self) -> Option<PricePoint> {
        self.points.last().copied()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    /// The last `n` observations (all of them if fewer exist).
    pub fn tail(&self, n: usize) -> &[PricePoint] {
        let start = self.points.len().saturating_sub(n);
        &self.points[start..]
    }

    /// Mean of the last `n` observations. `None` unless at least `n` exist.
    pub fn trailing_mean(&self, n: usize) -> Option<f64> {
        if n == 0 || self.points.len() < n {
            return None;
        }
        let window = self.tail(n);
        Some(window.iter().map(|p| p.value).sum::<f64>() / n as f64)
    }

    /// (last / previous - 1) * 100; 0 with fewer than two points.
    pub fn daily_change_pct(&self) -> f64 {
        match self.points.as_slice() {
            [.., prev, last] if prev.value != 0.0 => (last.value / prev.value - 1.0) * 100.0,
            _ => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[test]
    fn new_sorts_and_drops_non_finite() {
        let series = PriceSeries::from_pairs(vec![
            (d(3), 103.0),
            (d(1), 101.0),
            (d(2), f64::NAN),
            (d(4), f64::INFINITY),
        ]);
        assert_eq!(series.len(), 2);
        assert_eq!(series.points()[0].date, d(1));
        assert_eq!(series.latest().unwrap().value, 103.0);
    }

    #[test]
    fn trailing_mean_requires_full_window() {
        let series = PriceSeries::from_pairs(vec![(d(1), 10.0), (d(2), 20.0), (d(3), 30.0)]);
        assert_eq!(series.trailing_mean(2), Some(25.0));
        assert_eq!(series.trailing_mean(3), Some(20.0));
        assert_eq!(series.trailing_mean(4), None);
        assert_eq!(series.trailing_mean(0), None);
    }

    #[test]
    fn tail_clamps_to_length() {
        let series = PriceSeries::from_pairs(vec![(d(1), 10.0), (d(2), 20.0)]);
        assert_eq!(series.tail(5).len(), 2);
        assert_eq!(series.tail(1)[0].value, 20.0);
    }

    #[test]
    fn daily_change_pct() {
        let series = PriceSeries::from_pairs(vec![(d(1), 100.0), (d(2), 105.0)]);
        assert!((series.daily_change_pct() - 5.0).abs() < 1e-12);

        let single = PriceSeries::from_pairs(vec![(d(1), 100.0)]);
        assert_eq!(single.daily_change_pct(), 0.0);
        assert_eq!(PriceSeries::default().daily_change_pct(), 0.0);
    }
}
