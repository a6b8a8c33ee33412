//! Order execution and the commission model.
//!
//! Orders fill at the day's close with no slippage. Every fill is recorded on
//! the portfolio together with the commission it paid.

use chrono::NaiveDate;
use std::collections::HashMap;

use super::portfolio::Portfolio;
use super::position::{Fill, FillReason, Position, Side};

/// Tiered percentage commission with a floor and a ceiling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CommissionModel {
    pub rate: f64,
    pub min_commission: f64,
    pub max_pct: f64,
}

impl Default for CommissionModel {
    fn default() -> Self {
        CommissionModel {
            rate: 0.0005,
            min_commission: 1.0,
            max_pct: 0.005,
        }
    }
}

impl CommissionModel {
    /// min(max(|v| * rate, min_commission), |v| * max_pct)
    ///
    /// The ceiling is applied last, so it wins when it is below the floor.
    pub fn commission(&self, trade_value: f64) -> f64 {
        let notional = trade_value.abs();
        (notional * self.rate)
            .max(self.min_commission)
            .min(notional * self.max_pct)
    }

    /// Largest notional `v` with `v + commission(v) <= cash`.
    ///
    /// Either the floor-or-rate charge fits, which needs `v <= cash / (1 + rate)`
    /// and `v <= cash - min_commission`, or the ceiling charge fits, which needs
    /// `v <= cash / (1 + max_pct)`.
    pub fn affordable_notional(&self, cash: f64) -> f64 {
        if cash <= 0.0 {
            return 0.0;
        }
        let floor_or_rate = (cash / (1.0 + self.rate)).min(cash - self.min_commission);
        let ceiling = cash / (1.0 + self.max_pct);
        floor_or_rate.max(ceiling).max(0.0)
    }
}

/// Result of a buy attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryResult {
    Entered {
        quantity: u64,
        cost: f64,
        commission: f64,
    },
    InsufficientCapital,
}

/// Buy up to `target_notional` worth of whole shares at `price`.
///
/// Unlike a plain `floor(target / price)`, the quantity is capped at what the
/// cash balance covers once commission is added, so a buy never overdraws.
pub fn buy(
    portfolio: &mut Portfolio,
    ticker: &str,
    price: f64,
    target_notional: f64,
    date: NaiveDate,
    model: &CommissionModel,
) -> EntryResult {
    let wanted = (target_notional / price).floor().max(0.0) as u64;
    let fits = (model.affordable_notional(portfolio.cash) / price).floor().max(0.0) as u64;
    let mut quantity = wanted.min(fits);

    // rounding at the boundary
    if quantity > 0 {
        let cost = quantity as f64 * price;
        if cost + model.commission(cost) > portfolio.cash {
            quantity -= 1;
        }
    }

    if quantity == 0 {
        return EntryResult::InsufficientCapital;
    }

    let cost = quantity as f64 * price;
    let commission = model.commission(cost);

    portfolio.record_fill(Fill {
        date,
        ticker: ticker.to_string(),
        side: Side::Buy,
        reason: FillReason::Rebalance,
        quantity,
        price,
        commission,
    });
    portfolio.add_position(Position {
        ticker: ticker.to_string(),
        quantity,
        entry_price: price,
        entry_date: date,
    });

    EntryResult::Entered {
        quantity,
        cost,
        commission,
    }
}

/// Sell the whole position in `ticker` at `price`.
///
/// Returns `None` if nothing is held.
pub fn liquidate(
    portfolio: &mut Portfolio,
    ticker: &str,
    price: f64,
    date: NaiveDate,
    reason: FillReason,
    model: &CommissionModel,
) -> Option<Fill> {
    let position = portfolio.remove_position(ticker)?;
    let proceeds = position.market_value(price);
    let fill = Fill {
        date,
        ticker: position.ticker,
        side: Side::Sell,
        reason,
        quantity: position.quantity,
        price,
        commission: model.commission(proceeds),
    };
    portfolio.record_fill(fill.clone());
    Some(fill)
}

/// Liquidate every priced holding whose return since entry is at or below
/// `stop_loss_pct`. Holdings without a price today are left alone.
///
/// Returns the fills, one per exited position.
pub fn check_stop_losses(
    portfolio: &mut Portfolio,
    price_map: &HashMap<String, f64>,
    date: NaiveDate,
    stop_loss_pct: f64,
    model: &CommissionModel,
) -> Vec<Fill> {
    let mut triggered: Vec<(String, f64)> = portfolio
        .positions
        .values()
        .filter_map(|pos| {
            let price = *price_map.get(&pos.ticker)?;
            pos.should_stop_loss(price, stop_loss_pct)
                .then(|| (pos.ticker.clone(), price))
        })
        .collect();
    triggered.sort_by(|a, b| a.0.cmp(&b.0));

    triggered
        .into_iter()
        .filter_map(|(ticker, price)| {
            liquidate(portfolio, &ticker, price, date, FillReason::StopLoss, model)
        })
        .collect()
}
