//! Core domain types and logic.

pub mod stats;
pub mod price_table;
pub mod position;
pub mod portfolio;
pub mod execution;
pub mod strategy;
pub mod universe;
pub mod ranking;
pub mod backtest;
pub mod metrics;
pub mod config_validation;
pub mod error;
