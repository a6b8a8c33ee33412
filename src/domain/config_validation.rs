//! Configuration validation.
//!
//! Typed configs are checked once before any run; every rejection is a
//! [`TitanError::ConfigInvalid`] naming the offending key.

use crate::domain::backtest::{BacktestConfig, DataWindow};
use crate::domain::error::TitanError;
use crate::domain::execution::CommissionModel;
use crate::domain::strategy::StrategyConfig;

pub fn validate_strategy(config: &StrategyConfig) -> Result<(), TitanError> {
    validate_lookbacks(config)?;
    validate_top_n(config)?;
    validate_sector_weight(config)?;
    validate_stop_loss(config)?;
    Ok(())
}

pub fn validate_backtest(config: &BacktestConfig) -> Result<(), TitanError> {
    validate_initial_capital(config)?;
    validate_commission(&config.commission)?;
    Ok(())
}

pub fn validate_data_window(window: &DataWindow) -> Result<(), TitanError> {
    if window
        .start_date
        .is_some_and(|start| start >= window.end_date)
    {
        return Err(TitanError::invalid(
            "backtest",
            "start_date",
            "start_date must be before end_date",
        ));
    }
    if window.start_date.is_none() && window.horizon_years == 0 {
        return Err(TitanError::invalid(
            "backtest",
            "horizon_years",
            "horizon_years must be at least 1",
        ));
    }
    Ok(())
}

fn validate_lookbacks(config: &StrategyConfig) -> Result<(), TitanError> {
    if config.lookback_momentum == 0 {
        return Err(TitanError::invalid(
            "strategy",
            "lookback_momentum",
            "lookback_momentum must be at least 1",
        ));
    }
    if config.lookback_volatility < 2 {
        return Err(TitanError::invalid(
            "strategy",
            "lookback_volatility",
            "lookback_volatility must be at least 2",
        ));
    }
    if config.lookback_volatility > config.lookback_momentum {
        return Err(TitanError::invalid(
            "strategy",
            "lookback_volatility",
            "lookback_volatility must not exceed lookback_momentum",
        ));
    }
    Ok(())
}

fn validate_top_n(config: &StrategyConfig) -> Result<(), TitanError> {
    if config.top_n == 0 {
        return Err(TitanError::invalid(
            "strategy",
            "top_n",
            "top_n must be at least 1",
        ));
    }
    Ok(())
}

fn validate_sector_weight(config: &StrategyConfig) -> Result<(), TitanError> {
    let value = config.max_sector_weight;
    if !(value > 0.0 && value <= 1.0) {
        return Err(TitanError::invalid(
            "strategy",
            "max_sector_weight",
            "max_sector_weight must be in (0, 1]",
        ));
    }
    Ok(())
}

fn validate_stop_loss(config: &StrategyConfig) -> Result<(), TitanError> {
    let value = config.stop_loss_pct;
    if !(value > -1.0 && value < 0.0) {
        return Err(TitanError::invalid(
            "strategy",
            "stop_loss_pct",
            "stop_loss_pct must be in (-1, 0)",
        ));
    }
    Ok(())
}

fn validate_initial_capital(config: &BacktestConfig) -> Result<(), TitanError> {
    if !(config.initial_capital.is_finite() && config.initial_capital > 0.0) {
        return Err(TitanError::invalid(
            "backtest",
            "initial_capital",
            "initial_capital must be positive",
        ));
    }
    Ok(())
}

fn validate_commission(model: &CommissionModel) -> Result<(), TitanError> {
    for (key, value) in [
        ("rate", model.rate),
        ("min_commission", model.min_commission),
        ("max_pct", model.max_pct),
    ] {
        if !(value.is_finite() && value >= 0.0) {
            return Err(TitanError::invalid(
                "commission",
                key,
                format!("{key} must be non-negative"),
            ));
        }
    }
    Ok(())
}
