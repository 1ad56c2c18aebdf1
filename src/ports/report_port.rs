//! Report output port.

use crate::domain::batch::{BatchReport, TickerRow};
use crate::domain::error::TesterError;
use crate::domain::strategy::StrategyKind;

pub trait ReportPort {
    /// Write the per-ticker results table. Returns the path written.
    fn write_results(
        &self,
        report: &BatchReport,
        strategy: StrategyKind,
    ) -> Result<String, TesterError>;

    /// Write the trade log and equity curve of one ticker for plotting.
    /// Returns the artifact path recorded in the results table.
    fn write_artifacts(&self, row: &TickerRow) -> Result<String, TesterError>;
}
