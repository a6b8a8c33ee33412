//! Held positions and executed fills.

use chrono::NaiveDate;

/// A long holding of whole shares.
///
/// A rebalance that reselects a ticker opens a fresh position, so
/// `entry_price` is the price of the most recent buy, not of the first one.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub ticker: String,
    pub quantity: u64,
    pub entry_price: f64,
    pub entry_date: NaiveDate,
}

impl Position {
    pub fn market_value(&self, price: f64) -> f64 {
        self.quantity as f64 * price
    }

    pub fn return_since_entry(&self, price: f64) -> f64 {
        (price - self.entry_price) / self.entry_price
    }

    /// `threshold` is a negative fraction, e.g. -0.07.
    pub fn should_stop_loss(&self, price: f64, threshold: f64) -> bool {
        self.return_since_entry(price) <= threshold
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Buy,
    Sell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillReason {
    StopLoss,
    Rebalance,
}

/// One executed order.
#[derive(Debug, Clone, PartialEq)]
pub struct Fill {
    pub date: NaiveDate,
    pub ticker: String,
    pub side: Side,
    pub reason: FillReason,
    pub quantity: u64,
    pub price: f64,
    pub commission: f64,
}

impl Fill {
    pub fn notional(&self) -> f64 {
        self.quantity as f64 * self.price
    }

    /// Signed cash impact: proceeds net of commission for sells, total outlay
    /// (negative) for buys.
    pub fn cash_flow(&self) -> f64 {
        match self.side {
            Side::Sell => self.notional() - self.commission,
            Side::Buy => -(self.notional() + self.commission),
        }
    }
}
