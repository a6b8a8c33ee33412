//! CSV file data adapter.
//!
//! One file per ticker, `<base_path>/<TICKER>.csv`, with a header row holding
//! a `date` column (`YYYY-MM-DD`) and an `adj_close` or `close` column.
//! `adj_close` is preferred when both are present. Rows with an empty price
//! cell are skipped.

use crate::domain::error::TitanError;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

const PRICE_COLUMNS: [&str; 2] = ["adj_close", "close"];

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, ticker: &str) -> PathBuf {
        self.base_path.join(format!("{ticker}.csv"))
    }

    /// Every row of a ticker's file, sorted by date. A missing file reads as
    /// no rows.
    fn read_closes(&self, ticker: &str) -> Result<Vec<(NaiveDate, f64)>, TitanError> {
        let path = self.csv_path(ticker);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(TitanError::Data {
                    reason: format!("failed to read {}: {}", path.display(), e),
                });
            }
        };

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr.headers().map_err(|e| TitanError::Data {
            reason: format!("{}: CSV header error: {}", path.display(), e),
        })?;

        let column = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };
        let date_col = column("date").ok_or_else(|| TitanError::Data {
            reason: format!("{}: missing date column", path.display()),
        })?;
        let price_col = PRICE_COLUMNS
            .iter()
            .find_map(|&name| column(name))
            .ok_or_else(|| TitanError::Data {
                reason: format!("{}: missing adj_close/close column", path.display()),
            })?;

        let mut closes = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| TitanError::Data {
                reason: format!("{}: CSV parse error: {}", path.display(), e),
            })?;

            let date_str = record.get(date_col).unwrap_or("").trim();
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|e| {
                TitanError::Data {
                    reason: format!("{}: invalid date {date_str:?}: {}", path.display(), e),
                }
            })?;

            let price_str = record.get(price_col).unwrap_or("").trim();
            if price_str.is_empty() {
                continue;
            }
            let price: f64 = price_str.parse().map_err(|e| TitanError::Data {
                reason: format!("{}: invalid price {price_str:?}: {}", path.display(), e),
            })?;

            closes.push((date, price));
        }

        closes.sort_by_key(|(date, _)| *date);
        Ok(closes)
    }
}

impl DataPort for CsvAdapter {
    fn fetch_closes(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<(NaiveDate, f64)>, TitanError> {
        let mut closes = self.read_closes(ticker)?;
        closes.retain(|(date, _)| *date >= start_date && *date <= end_date);
        Ok(closes)
    }

    fn get_data_range(
        &self,
        ticker: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, TitanError> {
        let closes = self.read_closes(ticker)?;
        Ok(match (closes.first(), closes.last()) {
            (Some((first, _)), Some((last, _))) => Some((*first, *last, closes.len())),
            _ => None,
        })
    }
}
