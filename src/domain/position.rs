//! Open position and closed trade records.

use chrono::NaiveDateTime;

#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub entry_price: f64,
    pub size: f64,
    pub stop_loss: Option<f64>,
    pub open_bar_index: usize,
    pub entry_time: NaiveDateTime,
}

impl Position {
    pub fn market_value(&self, price: f64) -> f64 {
        self.size * price
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.size * (price - self.entry_price)
    }

    /// True when the bar's low reached the stop.
    pub fn should_stop_loss(&self, low: f64) -> bool {
        match self.stop_loss {
            Some(stop) => low <= stop,
            None => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    Signal,
    StopLoss,
    /// Closed at the last bar for accounting.
    EndOfData,
}

impl std::fmt::Display for ExitReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExitReason::Signal => write!(f, "signal"),
            ExitReason::StopLoss => write!(f, "stop_loss"),
            ExitReason::EndOfData => write!(f, "end_of_data"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub entry_bar_index: usize,
    pub exit_bar_index: usize,
    pub entry_time: NaiveDateTime,
    pub exit_time: NaiveDateTime,
    pub entry_price: f64,
    pub exit_price: f64,
    pub size: f64,
    pub pnl: f64,
    pub pnl_pct: f64,
    pub duration_bars: usize,
    pub exit_reason: ExitReason,
}

impl Trade {
    pub fn from_position(
        position: &Position,
        exit_price: f64,
        exit_bar_index: usize,
        exit_time: NaiveDateTime,
        exit_reason: ExitReason,
    ) -> Self {
        Trade {
            entry_bar_index: position.open_bar_index,
            exit_bar_index,
            entry_time: position.entry_time,
            exit_time,
            entry_price: position.entry_price,
            exit_price,
            size: position.size,
            pnl: position.unrealized_pnl(exit_price),
            pnl_pct: (exit_price / position.entry_price - 1.0) * 100.0,
            duration_bars: exit_bar_index.saturating_sub(position.open_bar_index),
            exit_reason,
        }
    }
}
