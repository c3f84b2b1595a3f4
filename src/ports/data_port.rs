//! Data access port trait for price and macro series.

use crate::domain::error::DcaError;
use crate::domain::series::PriceSeries;
use chrono::NaiveDate;

pub trait DataPort {
    /// Closing prices for `ticker` within [start_date, end_date], oldest first.
    fn fetch_price_series(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<PriceSeries, DcaError>;

    /// Macro indicator values for `code` within [start_date, end_date].
    fn fetch_macro_series(
        &self,
        code: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<PriceSeries, DcaError>;

    fn get_data_range(
        &self,
        ticker: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, DcaError>;
}
