//! Price data access port.

use crate::domain::error::TesterError;
use crate::domain::ohlcv::PriceBar;

/// Source of per-ticker price history. Implementations are shared across
/// batch worker threads.
pub trait DataPort: Send + Sync {
    /// All bars for `ticker`, oldest first.
    fn fetch_bars(&self, ticker: &str) -> Result<Vec<PriceBar>, TesterError>;

    /// Tickers available from this source, sorted.
    fn list_tickers(&self) -> Result<Vec<String>, TesterError>;
}
