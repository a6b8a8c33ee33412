//! Portfolio state and equity tracking.

use chrono::NaiveDate;
use std::collections::HashMap;

use super::position::{Fill, Position};

#[derive(Debug, Clone, PartialEq)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    pub cash: f64,
    pub initial_capital: f64,
    pub positions: HashMap<String, Position>,
    pub fills: Vec<Fill>,
    pub total_commissions: f64,
    pub equity_curve: Vec<EquityPoint>,
}

impl Portfolio {
    pub fn new(initial_capital: f64) -> Self {
        Portfolio {
            cash: initial_capital,
            initial_capital,
            positions: HashMap::new(),
            fills: Vec::new(),
            total_commissions: 0.0,
            equity_curve: Vec::new(),
        }
    }

    pub fn add_position(&mut self, position: Position) {
        self.positions.insert(position.ticker.clone(), position);
    }

    pub fn get_position(&self, ticker: &str) -> Option<&Position> {
        self.positions.get(ticker)
    }

    pub fn has_position(&self, ticker: &str) -> bool {
        self.positions.contains_key(ticker)
    }

    pub fn remove_position(&mut self, ticker: &str) -> Option<Position> {
        self.positions.remove(ticker)
    }

    pub fn position_count(&self) -> usize {
        self.positions.len()
    }

    /// Append a fill and apply its cash flow and commission.
    pub fn record_fill(&mut self, fill: Fill) {
        self.cash += fill.cash_flow();
        self.total_commissions += fill.commission;
        self.fills.push(fill);
    }

    pub fn record_equity(&mut self, date: NaiveDate, equity: f64) {
        self.equity_curve.push(EquityPoint { date, equity });
    }

    /// Cash plus the market value of every priced holding. Holdings without a
    /// price in `price_map` contribute nothing.
    pub fn total_equity(&self, price_map: &HashMap<String, f64>) -> f64 {
        let position_value: f64 = self
            .positions
            .values()
            .filter_map(|pos| {
                price_map
                    .get(&pos.ticker)
                    .map(|&price| pos.market_value(price))
            })
            .sum();
        self.cash + position_value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::position::{FillReason, Side};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 12).unwrap()
    }

    fn sample_position(ticker: &str, quantity: u64) -> Position {
        Position {
            ticker: ticker.to_string(),
            quantity,
            entry_price: 100.0,
            entry_date: date(),
        }
    }

    #[test]
    fn new_portfolio() {
        let portfolio = Portfolio::new(100000.0);
        assert!((portfolio.cash - 100000.0).abs() < f64::EPSILON);
        assert!((portfolio.initial_capital - 100000.0).abs() < f64::EPSILON);
        assert!(portfolio.positions.is_empty());
        assert!(portfolio.fills.is_empty());
        assert_eq!(portfolio.total_commissions, 0.0);
        assert!(portfolio.equity_curve.is_empty());
    }

    #[test]
    fn add_get_remove_position() {
        let mut portfolio = Portfolio::new(100000.0);
        portfolio.add_position(sample_position("GLD", 100));

        assert!(portfolio.has_position("GLD"));
        assert_eq!(portfolio.get_position("GLD").unwrap().quantity, 100);
        assert_eq!(portfolio.position_count(), 1);

        assert!(portfolio.remove_position("GLD").is_some());
        assert!(!portfolio.has_position("GLD"));
        assert!(portfolio.remove_position("GLD").is_none());
    }

    #[test]
    fn add_position_replaces_existing() {
        let mut portfolio = Portfolio::new(100000.0);
        portfolio.add_position(sample_position("GLD", 100));
        portfolio.add_position(Position {
            entry_price: 120.0,
            ..sample_position("GLD", 40)
        });
        let pos = portfolio.get_position("GLD").unwrap();
        assert_eq!(pos.quantity, 40);
        assert!((pos.entry_price - 120.0).abs() < f64::EPSILON);
        assert_eq!(portfolio.position_count(), 1);
    }

    #[test]
    fn record_fill_updates_cash_and_commissions() {
        let mut portfolio = Portfolio::new(10000.0);
        portfolio.record_fill(Fill {
            date: date(),
            ticker: "GLD".into(),
            side: Side::Buy,
            reason: FillReason::Rebalance,
            quantity: 50,
            price: 100.0,
            commission: 2.5,
        });
        assert!((portfolio.cash - 4997.5).abs() < 1e-9);

        portfolio.record_fill(Fill {
            date: date(),
            ticker: "GLD".into(),
            side: Side::Sell,
            reason: FillReason::StopLoss,
            quantity: 50,
            price: 90.0,
            commission: 2.25,
        });
        assert!((portfolio.cash - (4997.5 + 4500.0 - 2.25)).abs() < 1e-9);
        assert!((portfolio.total_commissions - 4.75).abs() < 1e-12);
        assert_eq!(portfolio.fills.len(), 2);
    }

    #[test]
    fn record_equity() {
        let mut portfolio = Portfolio::new(100000.0);
        portfolio.record_equity(date(), 105000.0);
        assert_eq!(portfolio.equity_curve.len(), 1);
        assert_eq!(portfolio.equity_curve[0].date, date());
        assert!((portfolio.equity_curve[0].equity - 105000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn total_equity_no_positions() {
        let portfolio = Portfolio::new(100000.0);
        let equity = portfolio.total_equity(&HashMap::new());
        assert!((equity - 100000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn total_equity_uses_market_value() {
        let mut portfolio = Portfolio::new(50000.0);
        portfolio.add_position(sample_position("GLD", 100));
        portfolio.cash = 40000.0;

        let mut price_map = HashMap::new();
        price_map.insert("GLD".to_string(), 150.0);

        let equity = portfolio.total_equity(&price_map);
        assert!((equity - 55000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn total_equity_unpriced_holding_counts_zero() {
        let mut portfolio = Portfolio::new(50000.0);
        portfolio.add_position(sample_position("GLD", 100));
        portfolio.add_position(sample_position("SLV", 10));
        portfolio.cash = 30000.0;

        let mut price_map = HashMap::new();
        price_map.insert("SLV".to_string(), 20.0);

        let equity = portfolio.total_equity(&price_map);
        assert!((equity - 30200.0).abs() < f64::EPSILON);
    }
}
