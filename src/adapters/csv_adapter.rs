//! CSV file data adapter.
//!
//! One file per symbol: `<prices_dir>/<ticker>.csv` for instruments and
//! `<macro_dir>/<code>.csv` for macro indicators. Columns are located by
//! header name, so exports with extra columns (open/high/low/volume) load
//! as-is. Blank or non-numeric values are skipped.

use crate::domain::error::DcaError;
use crate::domain::series::{PricePoint, PriceSeries};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};

const DATE_COLUMNS: &[&str] = &["date"];
const VALUE_COLUMNS: &[&str] = &["adj_close", "adj close", "adjclose", "close", "value"];

pub struct CsvAdapter {
    prices_dir: PathBuf,
    macro_dir: PathBuf,
}

impl CsvAdapter {
    pub fn new(prices_dir: PathBuf, macro_dir: PathBuf) -> Self {
        Self {
            prices_dir,
            macro_dir,
        }
    }

    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, DcaError> {
        let prices_dir =
            config
                .get_string("csv", "prices_dir")
                .ok_or_else(|| DcaError::ConfigMissing {
                    section: "csv".into(),
                    key: "prices_dir".into(),
                })?;
        let macro_dir = config
            .get_string("csv", "macro_dir")
            .unwrap_or_else(|| prices_dir.clone());
        Ok(Self::new(PathBuf::from(prices_dir), PathBuf::from(macro_dir)))
    }

    fn csv_path(dir: &Path, symbol: &str) -> PathBuf {
        dir.join(format!("{}.csv", symbol))
    }

    fn read_series(
        path: &Path,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<PriceSeries, DcaError> {
        let content = fs::read_to_string(path).map_err(|e| DcaError::Database {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr
            .headers()
            .map_err(|e| DcaError::Database {
                reason: format!("CSV header error in {}: {}", path.display(), e),
            })?
            .clone();

        let date_idx = find_column(&headers, DATE_COLUMNS).ok_or_else(|| DcaError::Database {
            reason: format!("missing date column in {}", path.display()),
        })?;
        let value_idx =
            find_column(&headers, VALUE_COLUMNS).ok_or_else(|| DcaError::Database {
                reason: format!(
                    "missing value column in {} (expected one of {})",
                    path.display(),
                    VALUE_COLUMNS.join(", ")
                ),
            })?;

        let mut points = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| DcaError::Database {
                reason: format!("CSV parse error: {}", e),
            })?;

            let date_str = record.get(date_idx).unwrap_or_default().trim();
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|e| {
                DcaError::Database {
                    reason: format!("invalid date '{}': {}", date_str, e),
                }
            })?;

            if date < start_date || date > end_date {
                continue;
            }

            let Ok(value) = record.get(value_idx).unwrap_or_default().trim().parse::<f64>()
            else {
                continue;
            };

            points.push(PricePoint { date, value });
        }

        Ok(PriceSeries::new(points))
    }

    fn range_of(path: &Path) -> Result<Option<(NaiveDate, NaiveDate, usize)>, DcaError> {
        if !path.exists() {
            return Ok(None);
        }
        let series = Self::read_series(path, NaiveDate::MIN, NaiveDate::MAX)?;
        match (series.first_date(), series.latest()) {
            (Some(first), Some(last)) => Ok(Some((first, last.date, series.len()))),
            _ => Ok(None),
        }
    }
}

fn find_column(headers: &csv::StringRecord, candidates: &[&str]) -> Option<usize> {
    candidates.iter().find_map(|candidate| {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(candidate))
    })
}

impl DataPort for CsvAdapter {
    fn fetch_price_series(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<PriceSeries, DcaError> {
        Self::read_series(
            &Self::csv_path(&self.prices_dir, ticker),
            start_date,
            end_date,
        )
    }

    fn fetch_macro_series(
        &self,
        code: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<PriceSeries, DcaError> {
        Self::read_series(&Self::csv_path(&self.macro_dir, code), start_date, end_date)
    }

    fn get_data_range(
        &self,
        ticker: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, DcaError> {
        Self::range_of(&Self::csv_path(&self.prices_dir, ticker))
    }
}
