#![allow(dead_code)]

use chrono::{Datelike, NaiveDate, Weekday};
use std::collections::HashMap;
use titan::domain::error::TitanError;
use titan::domain::price_table::{CloseSeries, PriceTable};
use titan::domain::strategy::StrategyConfig;
use titan::domain::universe::{Category, Universe};
use titan::ports::data_port::DataPort;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<(NaiveDate, f64)>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_closes(mut self, ticker: &str, closes: Vec<(NaiveDate, f64)>) -> Self {
        self.data.insert(ticker.to_string(), closes);
        self
    }

    pub fn with_error(mut self, ticker: &str, reason: &str) -> Self {
        self.errors.insert(ticker.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_closes(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<(NaiveDate, f64)>, TitanError> {
        if let Some(reason) = self.errors.get(ticker) {
            return Err(TitanError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(ticker)
            .map(|closes| {
                closes
                    .iter()
                    .copied()
                    .filter(|(d, _)| *d >= start_date && *d <= end_date)
                    .collect()
            })
            .unwrap_or_default())
    }

    fn get_data_range(
        &self,
        ticker: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, TitanError> {
        if let Some(reason) = self.errors.get(ticker) {
            return Err(TitanError::Data {
                reason: reason.clone(),
            });
        }
        match self.data.get(ticker) {
            Some(closes) if !closes.is_empty() => {
                let min = closes.iter().map(|c| c.0).min().unwrap();
                let max = closes.iter().map(|c| c.0).max().unwrap();
                Ok(Some((min, max, closes.len())))
            }
            _ => Ok(None),
        }
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// `count` weekdays starting at `start` (weekends skipped).
pub fn business_days(start: NaiveDate, count: usize) -> Vec<NaiveDate> {
    start
        .iter_days()
        .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
        .take(count)
        .collect()
}

/// Prices starting at `start_price`, multiplied by `odd` then `even`
/// factors alternately, so returns are non-constant.
pub fn alternating_prices(count: usize, start_price: f64, odd: f64, even: f64) -> Vec<f64> {
    let mut price = start_price;
    (0..count)
        .map(|i| {
            if i > 0 {
                price *= if i % 2 == 1 { odd } else { even };
            }
            price
        })
        .collect()
}

pub fn closes(dates: &[NaiveDate], prices: &[f64]) -> Vec<(NaiveDate, f64)> {
    dates.iter().copied().zip(prices.iter().copied()).collect()
}

pub fn table_from(dates: &[NaiveDate], columns: &[(&str, Vec<f64>)]) -> PriceTable {
    let series = columns
        .iter()
        .map(|(ticker, prices)| CloseSeries {
            ticker: ticker.to_string(),
            closes: closes(dates, prices),
        })
        .collect();
    PriceTable::from_series(series).unwrap()
}

pub fn universe(categories: &[(&str, &[&str])]) -> Universe {
    Universe::new(
        categories
            .iter()
            .map(|(name, tickers)| Category {
                name: name.to_string(),
                tickers: tickers.iter().map(|t| t.to_string()).collect(),
            })
            .collect(),
    )
}

pub fn short_strategy() -> StrategyConfig {
    StrategyConfig {
        lookback_momentum: 10,
        lookback_volatility: 5,
        top_n: 4,
        max_sector_weight: 0.5,
        stop_loss_pct: -0.07,
        rebalance_weekday: Weekday::Fri,
    }
}
