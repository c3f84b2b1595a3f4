#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use dcadash::domain::error::DcaError;
pub use dcadash::domain::series::{PricePoint, PriceSeries};
use dcadash::domain::universe::{Instrument, MacroIndicator};
use dcadash::ports::data_port::DataPort;
use std::collections::HashMap;

/// In-memory data port. Date filtering mirrors the real adapters.
pub struct MockDataPort {
    pub prices: HashMap<String, PriceSeries>,
    pub macros: HashMap<String, PriceSeries>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            prices: HashMap::new(),
            macros: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_series(mut self, ticker: &str, series: PriceSeries) -> Self {
        self.prices.insert(ticker.to_string(), series);
        self
    }

    pub fn with_macro(mut self, code: &str, series: PriceSeries) -> Self {
        self.macros.insert(code.to_string(), series);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }

    fn lookup(
        &self,
        table: &HashMap<String, PriceSeries>,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, DcaError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(DcaError::Database {
                reason: reason.clone(),
            });
        }
        let points = table
            .get(symbol)
            .map(|s| {
                s.points()
                    .iter()
                    .copied()
                    .filter(|p| p.date >= start && p.date <= end)
                    .collect()
            })
            .unwrap_or_default();
        Ok(PriceSeries::new(points))
    }
}

impl DataPort for MockDataPort {
    fn fetch_price_series(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<PriceSeries, DcaError> {
        self.lookup(&self.prices, ticker, start_date, end_date)
    }

    fn fetch_macro_series(
        &self,
        code: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<PriceSeries, DcaError> {
        self.lookup(&self.macros, code, start_date, end_date)
    }

    fn get_data_range(
        &self,
        ticker: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, DcaError> {
        if let Some(reason) = self.errors.get(ticker) {
            return Err(DcaError::Database {
                reason: reason.clone(),
            });
        }
        match self.prices.get(ticker) {
            Some(series) if !series.is_empty() => {
                let first = series.first_date().unwrap();
                let last = series.latest().unwrap().date;
                Ok(Some((first, last, series.len())))
            }
            _ => Ok(None),
        }
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Consecutive daily observations ending on `end`.
pub fn series_ending(end: NaiveDate, values: &[f64]) -> PriceSeries {
    let n = values.len() as i64;
    PriceSeries::from_pairs(
        values
            .iter()
            .enumerate()
            .map(|(i, v)| (end - Duration::days(n - 1 - i as i64), *v)),
    )
}

pub fn flat_series(end: NaiveDate, len: usize, value: f64) -> PriceSeries {
    series_ending(end, &vec![value; len])
}

pub fn instrument(name: &str, ticker: &str) -> Instrument {
    Instrument {
        name: name.to_string(),
        ticker: ticker.to_string(),
    }
}

pub fn indicator(label: &str, code: &str) -> MacroIndicator {
    MacroIndicator {
        label: label.to_string(),
        code: code.to_string(),
    }
}
