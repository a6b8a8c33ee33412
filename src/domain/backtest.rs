//! Backtest configuration and the day-by-day simulation engine.
//!
//! Each simulated date runs three passes in order: stop-loss exits, the
//! weekly rebalance, then valuation. The first `lookback_momentum` dates only
//! provide history. The next date trades like any other but records the
//! starting capital instead of its closing valuation.

use chrono::{Datelike, Duration, NaiveDate};

use super::config_validation::{validate_backtest, validate_strategy};
use super::error::TitanError;
use super::execution::{self, CommissionModel, EntryResult};
use super::portfolio::Portfolio;
use super::position::{Fill, FillReason, Position};
use super::price_table::PriceTable;
use super::ranking::Ranker;
use super::strategy::StrategyConfig;
use super::universe::Universe;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub initial_capital: f64,
    pub commission: CommissionModel,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            initial_capital: 100_000.0,
            commission: CommissionModel::default(),
        }
    }
}

/// Date range of price history to load for a run.
#[derive(Debug, Clone, PartialEq)]
pub struct DataWindow {
    pub end_date: NaiveDate,
    /// Overrides the horizon-derived start when set.
    pub start_date: Option<NaiveDate>,
    pub horizon_years: u32,
}

impl DataWindow {
    /// Calendar-day padding on top of the momentum lookback.
    pub const WARMUP_PADDING_DAYS: i64 = 30;

    /// First date to request: `end - (365 * horizon + lookback + 30)` days
    /// unless an explicit start date is configured.
    pub fn start(&self, lookback_momentum: usize) -> NaiveDate {
        if let Some(start) = self.start_date {
            return start;
        }
        let days = 365 * i64::from(self.horizon_years)
            + lookback_momentum as i64
            + Self::WARMUP_PADDING_DAYS;
        self.end_date - Duration::days(days)
    }
}

/// What happened on one simulated date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DayOutcome {
    pub stop_loss_exits: usize,
    pub rebalanced: bool,
    pub equity: f64,
}

#[derive(Debug, Clone)]
pub struct BacktestResult {
    pub portfolio: Portfolio,
    pub rebalances: usize,
    pub stop_loss_exits: usize,
    /// Holdings dropped at a rebalance because they had no price to sell at.
    pub written_off: Vec<Position>,
}

pub struct Backtest<'a> {
    table: &'a PriceTable,
    ranker: Ranker<'a>,
    strategy: &'a StrategyConfig,
    commission: CommissionModel,
    portfolio: Portfolio,
    initial_capital: f64,
    seed_row: usize,
    next_row: usize,
    rebalances: usize,
    stop_loss_exits: usize,
    written_off: Vec<Position>,
}

impl<'a> Backtest<'a> {
    /// Validate the configuration. Fails with `InsufficientData` when the
    /// table has no row past the momentum lookback.
    pub fn new(
        table: &'a PriceTable,
        universe: &'a Universe,
        strategy: &'a StrategyConfig,
        config: &BacktestConfig,
    ) -> Result<Self, TitanError> {
        validate_strategy(strategy)?;
        validate_backtest(config)?;

        let seed_row = strategy.lookback_momentum;
        if table.date_at(seed_row).is_none() {
            return Err(TitanError::InsufficientData {
                rows: table.len(),
                minimum: seed_row,
            });
        }

        Ok(Backtest {
            table,
            ranker: Ranker::new(strategy, universe),
            strategy,
            commission: config.commission,
            portfolio: Portfolio::new(config.initial_capital),
            initial_capital: config.initial_capital,
            seed_row,
            next_row: seed_row,
            rebalances: 0,
            stop_loss_exits: 0,
            written_off: Vec::new(),
        })
    }

    pub fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }

    /// Date the next call to [`Backtest::step`] will simulate.
    pub fn next_date(&self) -> Option<NaiveDate> {
        self.table.date_at(self.next_row)
    }

    /// Simulate one date. Returns `None` once the table is exhausted.
    pub fn step(&mut self) -> Option<(NaiveDate, DayOutcome)> {
        let row = self.next_row;
        let date = self.table.date_at(row)?;
        self.next_row += 1;

        let price_map = self.table.price_map(row);

        let stopped = execution::check_stop_losses(
            &mut self.portfolio,
            &price_map,
            date,
            self.strategy.stop_loss_pct,
            &self.commission,
        );
        for fill in &stopped {
            tracing::info!(
                %date,
                ticker = %fill.ticker,
                price = fill.price,
                quantity = fill.quantity,
                "stop-loss exit"
            );
        }
        self.stop_loss_exits += stopped.len();

        let rebalanced =
            date.weekday() == self.strategy.rebalance_weekday && self.rebalance(row, date);

        // the value series opens at the starting capital
        let equity = if row == self.seed_row {
            self.initial_capital
        } else {
            self.portfolio.total_equity(&price_map)
        };
        self.portfolio.record_equity(date, equity);

        Some((
            date,
            DayOutcome {
                stop_loss_exits: stopped.len(),
                rebalanced,
                equity,
            },
        ))
    }

    /// Sell everything and buy the new allocation. Returns false, leaving
    /// holdings untouched, when the ranker selects nothing.
    fn rebalance(&mut self, row: usize, date: NaiveDate) -> bool {
        let allocation = self.ranker.rank_row(row, self.table);
        if allocation.is_empty() {
            tracing::debug!(%date, "no eligible assets, holdings kept");
            return false;
        }

        let mut held: Vec<String> = self.portfolio.positions.keys().cloned().collect();
        held.sort();
        for ticker in held {
            match self.table.price(row, &ticker) {
                Some(price) => {
                    execution::liquidate(
                        &mut self.portfolio,
                        &ticker,
                        price,
                        date,
                        FillReason::Rebalance,
                        &self.commission,
                    );
                }
                None => {
                    if let Some(position) = self.portfolio.remove_position(&ticker) {
                        tracing::warn!(%date, %ticker, "no price at rebalance, position written off");
                        self.written_off.push(position);
                    }
                }
            }
        }

        let equity = self.portfolio.cash;
        let mut bought = 0usize;
        for entry in allocation.entries() {
            let Some(price) = self.table.price(row, &entry.ticker) else {
                continue;
            };
            let result = execution::buy(
                &mut self.portfolio,
                &entry.ticker,
                price,
                equity * entry.weight,
                date,
                &self.commission,
            );
            if let EntryResult::Entered { .. } = result {
                bought += 1;
            }
        }

        self.rebalances += 1;
        tracing::debug!(
            %date,
            selected = allocation.len(),
            bought,
            cash = self.portfolio.cash,
            "rebalanced"
        );
        true
    }

    pub fn run(mut self) -> BacktestResult {
        while self.step().is_some() {}
        BacktestResult {
            portfolio: self.portfolio,
            rebalances: self.rebalances,
            stop_loss_exits: self.stop_loss_exits,
            written_off: self.written_off,
        }
    }
}

/// Run the whole simulation over `table`.
pub fn run_backtest(
    table: &PriceTable,
    universe: &Universe,
    strategy: &StrategyConfig,
    config: &BacktestConfig,
) -> Result<BacktestResult, TitanError> {
    Ok(Backtest::new(table, universe, strategy, config)?.run())
}

impl BacktestResult {
    pub fn fills_for<'r>(&'r self, ticker: &'r str) -> impl Iterator<Item = &'r Fill> + 'r {
        self.portfolio
            .fills
            .iter()
            .filter(move |f| f.ticker == ticker)
    }
}
