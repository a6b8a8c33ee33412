//! Report output port trait.

use crate::domain::error::TitanError;
use crate::domain::metrics::PerformanceReport;
use std::io::Write;

/// Port for rendering a finished backtest.
pub trait ReportPort {
    fn write(&self, report: &PerformanceReport, out: &mut dyn Write) -> Result<(), TitanError>;
}
