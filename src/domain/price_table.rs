//! Date-indexed table of adjusted closes.
//!
//! Rows are trading dates in strictly increasing order, columns are tickers in
//! a fixed order. Column order is significant: the ranker uses it to break
//! score ties.

use crate::domain::error::TitanError;
use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap};

/// One ticker's close series, as returned by a data provider.
#[derive(Debug, Clone, PartialEq)]
pub struct CloseSeries {
    pub ticker: String,
    pub closes: Vec<(NaiveDate, f64)>,
}

#[derive(Debug, Clone)]
pub struct PriceTable {
    dates: Vec<NaiveDate>,
    tickers: Vec<String>,
    rows: Vec<Vec<Option<f64>>>,
    date_index: HashMap<NaiveDate, usize>,
    ticker_index: HashMap<String, usize>,
}

fn clean(price: Option<f64>) -> Option<f64> {
    price.filter(|p| p.is_finite() && *p > 0.0)
}

impl PriceTable {
    /// Build a table from dense rows. Every row must have one cell per ticker.
    ///
    /// Non-finite and non-positive prices are stored as missing.
    pub fn new(
        dates: Vec<NaiveDate>,
        tickers: Vec<String>,
        rows: Vec<Vec<Option<f64>>>,
    ) -> Result<Self, TitanError> {
        if dates.len() != rows.len() {
            return Err(TitanError::Data {
                reason: format!("{} dates but {} rows", dates.len(), rows.len()),
            });
        }
        if let Some(w) = dates.windows(2).find(|w| w[0] >= w[1]) {
            return Err(TitanError::Data {
                reason: format!("dates not strictly increasing at {}", w[1]),
            });
        }

        let mut ticker_index = HashMap::with_capacity(tickers.len());
        for (i, t) in tickers.iter().enumerate() {
            if ticker_index.insert(t.clone(), i).is_some() {
                return Err(TitanError::Data {
                    reason: format!("duplicate ticker column {}", t),
                });
            }
        }

        let mut cleaned = Vec::with_capacity(rows.len());
        for (date, row) in dates.iter().zip(rows) {
            if row.len() != tickers.len() {
                return Err(TitanError::Data {
                    reason: format!(
                        "row {} has {} cells, expected {}",
                        date,
                        row.len(),
                        tickers.len()
                    ),
                });
            }
            cleaned.push(row.into_iter().map(clean).collect());
        }

        let date_index = dates.iter().enumerate().map(|(i, d)| (*d, i)).collect();

        Ok(Self {
            dates,
            tickers,
            rows: cleaned,
            date_index,
            ticker_index,
        })
    }

    /// Assemble a table from per-ticker series on the union of their dates.
    ///
    /// Columns keep the order of `series`. Tickers without a single usable
    /// price are dropped.
    pub fn from_series(series: Vec<CloseSeries>) -> Result<Self, TitanError> {
        let series: Vec<CloseSeries> = series
            .into_iter()
            .filter(|s| s.closes.iter().any(|(_, p)| clean(Some(*p)).is_some()))
            .collect();

        let timeline: BTreeSet<NaiveDate> = series
            .iter()
            .flat_map(|s| s.closes.iter().map(|(d, _)| *d))
            .collect();
        let dates: Vec<NaiveDate> = timeline.into_iter().collect();
        let position: HashMap<NaiveDate, usize> =
            dates.iter().enumerate().map(|(i, d)| (*d, i)).collect();

        let mut rows = vec![vec![None; series.len()]; dates.len()];
        for (col, s) in series.iter().enumerate() {
            for (date, price) in &s.closes {
                if let Some(&row) = position.get(date) {
                    rows[row][col] = Some(*price);
                }
            }
        }

        let tickers = series.into_iter().map(|s| s.ticker).collect();
        Self::new(dates, tickers, rows)
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    pub fn date_at(&self, row: usize) -> Option<NaiveDate> {
        self.dates.get(row).copied()
    }

    /// Exact row lookup; no nearest-date matching.
    pub fn row_index(&self, date: NaiveDate) -> Option<usize> {
        self.date_index.get(&date).copied()
    }

    pub fn column_index(&self, ticker: &str) -> Option<usize> {
        self.ticker_index.get(ticker).copied()
    }

    pub fn price(&self, row: usize, ticker: &str) -> Option<f64> {
        let col = self.column_index(ticker)?;
        self.rows.get(row)?.get(col).copied().flatten()
    }

    pub fn price_on(&self, date: NaiveDate, ticker: &str) -> Option<f64> {
        self.price(self.row_index(date)?, ticker)
    }

    /// Prices of one column over rows `start..=end`.
    pub fn column_window(&self, col: usize, start: usize, end: usize) -> Vec<Option<f64>> {
        self.rows[start..=end].iter().map(|row| row[col]).collect()
    }

    /// Every defined price on a row, keyed by ticker.
    pub fn price_map(&self, row: usize) -> HashMap<String, f64> {
        self.rows
            .get(row)
            .map(|cells| {
                self.tickers
                    .iter()
                    .zip(cells)
                    .filter_map(|(t, p)| p.map(|p| (t.clone(), p)))
                    .collect()
            })
            .unwrap_or_default()
    }
}
