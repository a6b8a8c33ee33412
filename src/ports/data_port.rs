//! Historical price data port trait.

use crate::domain::error::TitanError;
use chrono::NaiveDate;

pub trait DataPort {
    /// Adjusted closes for one ticker within `[start_date, end_date]`, sorted
    /// by date. Days without a price are simply absent.
    fn fetch_closes(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<(NaiveDate, f64)>, TitanError>;

    /// First date, last date and row count for a ticker, if it has data.
    fn get_data_range(
        &self,
        ticker: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, TitanError>;
}
