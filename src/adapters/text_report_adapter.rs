//! Plain-text report adapter implementing ReportPort.
//!
//! Renders a fixed-width summary of a finished run.

use std::io::Write;

use crate::domain::error::TitanError;
use crate::domain::metrics::PerformanceReport;
use crate::ports::report_port::ReportPort;

const RULE: &str = "============================================================";

#[derive(Debug, Default)]
pub struct TextReportAdapter;

impl TextReportAdapter {
    pub fn new() -> Self {
        Self
    }
}

fn pct(value: f64) -> String {
    format!("{:.2}%", value * 100.0)
}

fn money(value: f64) -> String {
    format!("${value:.2}")
}

impl ReportPort for TextReportAdapter {
    fn write(&self, report: &PerformanceReport, out: &mut dyn Write) -> Result<(), TitanError> {
        let m = &report.metrics;

        writeln!(out, "{RULE}")?;
        writeln!(out, "BACKTEST RESULTS")?;
        writeln!(out, "{RULE}")?;
        match (report.start_date, report.end_date) {
            (Some(start), Some(end)) => writeln!(out, "{:<24}{start} to {end}", "Period:")?,
            _ => writeln!(out, "{:<24}n/a", "Period:")?,
        }
        writeln!(out, "{:<24}{:>16}", "Initial Capital:", money(report.initial_value))?;
        writeln!(out, "{:<24}{:>16}", "Final Value:", money(report.final_value))?;
        writeln!(out, "{:<24}{:>16}", "Total Return:", pct(m.total_return))?;
        writeln!(out, "{:<24}{:>16}", "Annualized Return:", pct(m.annualized_return))?;
        writeln!(out, "{:<24}{:>16}", "Annualized Volatility:", pct(m.annualized_volatility))?;
        writeln!(out, "{:<24}{:>16.2}", "Sharpe Ratio:", m.sharpe_ratio)?;
        writeln!(out, "{:<24}{:>16}", "Max Drawdown:", pct(m.max_drawdown))?;
        writeln!(out, "{:<24}{:>16}", "Total Commissions:", money(report.total_commissions))?;
        writeln!(out, "{:<24}{:>16}", "Cash:", money(report.cash))?;
        writeln!(out, "{:<24}{:>16}", "Rebalances:", report.rebalances)?;
        writeln!(out, "{:<24}{:>16}", "Fills:", report.fill_count)?;
        writeln!(out, "{:<24}{:>16}", "Stop-Loss Exits:", report.stop_loss_exits)?;
        writeln!(out, "{:<24}{:>16}", "Active Holdings:", report.holdings.len())?;

        if !report.holdings.is_empty() {
            writeln!(out)?;
            writeln!(out, "{:<10}{:>10}{:>14}  {}", "Ticker", "Shares", "Entry", "Since")?;
            for pos in &report.holdings {
                writeln!(
                    out,
                    "{:<10}{:>10}{:>14.2}  {}",
                    pos.ticker, pos.quantity, pos.entry_price, pos.entry_date
                )?;
            }
        }

        if !report.written_off.is_empty() {
            writeln!(out)?;
            writeln!(out, "Written off (no price at rebalance):")?;
            for pos in &report.written_off {
                writeln!(out, "  {} x{} from {}", pos.ticker, pos.quantity, pos.entry_date)?;
            }
        }

        writeln!(out, "{RULE}")?;
        Ok(())
    }
}
