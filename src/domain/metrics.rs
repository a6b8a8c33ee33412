//! Performance metrics over the portfolio value series.

use chrono::NaiveDate;

use super::backtest::BacktestResult;
use super::portfolio::EquityPoint;
use super::position::Position;
use super::stats::{pct_changes, sample_stddev};

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metrics {
    pub total_return: f64,
    pub annualized_return: f64,
    pub annualized_volatility: f64,
    pub sharpe_ratio: f64,
    /// Largest peak-to-trough decline as a non-positive fraction.
    pub max_drawdown: f64,
}

impl Metrics {
    pub fn compute(equity_curve: &[EquityPoint]) -> Self {
        let (Some(first), Some(last)) = (equity_curve.first(), equity_curve.last()) else {
            return Metrics::default();
        };

        let total_return = if first.equity > 0.0 {
            last.equity / first.equity - 1.0
        } else {
            0.0
        };

        let values: Vec<f64> = equity_curve.iter().map(|p| p.equity).collect();
        let returns = pct_changes(&values);

        let annualized_return = if returns.is_empty() {
            0.0
        } else {
            (1.0 + total_return).powf(TRADING_DAYS_PER_YEAR / returns.len() as f64) - 1.0
        };

        let annualized_volatility = sample_stddev(&returns)
            .map(|sd| sd * TRADING_DAYS_PER_YEAR.sqrt())
            .unwrap_or(0.0);

        let sharpe_ratio = if annualized_volatility > 0.0 {
            annualized_return / annualized_volatility
        } else {
            0.0
        };

        Metrics {
            total_return,
            annualized_return,
            annualized_volatility,
            sharpe_ratio,
            max_drawdown: compute_drawdown(&values),
        }
    }
}

fn compute_drawdown(values: &[f64]) -> f64 {
    let mut peak = f64::MIN;
    let mut max_dd = 0.0_f64;

    for &value in values {
        peak = peak.max(value);
        if peak > 0.0 {
            max_dd = max_dd.min(value / peak - 1.0);
        }
    }

    max_dd
}

/// Everything the report adapters render for a finished run.
#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceReport {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub initial_value: f64,
    pub final_value: f64,
    pub metrics: Metrics,
    pub total_commissions: f64,
    pub cash: f64,
    /// Holdings at the end of the run, sorted by ticker.
    pub holdings: Vec<Position>,
    pub fill_count: usize,
    pub stop_loss_exits: usize,
    pub rebalances: usize,
    pub written_off: Vec<Position>,
}

impl PerformanceReport {
    pub fn build(result: &BacktestResult) -> Self {
        let portfolio = &result.portfolio;
        let curve = &portfolio.equity_curve;

        let mut holdings: Vec<Position> = portfolio.positions.values().cloned().collect();
        holdings.sort_by(|a, b| a.ticker.cmp(&b.ticker));

        PerformanceReport {
            start_date: curve.first().map(|p| p.date),
            end_date: curve.last().map(|p| p.date),
            initial_value: portfolio.initial_capital,
            final_value: curve
                .last()
                .map(|p| p.equity)
                .unwrap_or(portfolio.initial_capital),
            metrics: Metrics::compute(curve),
            total_commissions: portfolio.total_commissions,
            cash: portfolio.cash,
            holdings,
            fill_count: portfolio.fills.len(),
            stop_loss_exits: result.stop_loss_exits,
            rebalances: result.rebalances,
            written_off: result.written_off.clone(),
        }
    }
}
