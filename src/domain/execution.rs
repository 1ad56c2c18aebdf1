//! Order execution against a simulation state.
//!
//! Fills happen at the bar close (entries, signal exits, end-of-data exits)
//! or at the stop price (stop-loss exits). No commission or slippage is
//! modelled.

use super::ohlcv::PriceBar;
use super::position::{ExitReason, Position, Trade};
use super::state::SimulationState;
use super::strategy::Sizing;

/// Result of an entry attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryResult {
    Entered {
        state: SimulationState,
        size: f64,
        execution_price: f64,
        cost: f64,
    },
    AlreadyOpen,
    ZeroSize,
    InsufficientCapital {
        required: f64,
        available: f64,
    },
}

/// Units requested by `sizing` at `price` given `cash`.
pub fn resolve_size(sizing: Sizing, cash: f64, price: f64) -> f64 {
    match sizing {
        Sizing::Units(units) => units,
        Sizing::AllCash => {
            if price > 0.0 {
                (cash / price).floor()
            } else {
                0.0
            }
        }
    }
}

/// Open a long position at the bar close.
///
/// Rejected when a position is already open, when the size resolves to
/// zero units, or when the cost exceeds available cash.
pub fn enter_long(
    state: &SimulationState,
    bar: &PriceBar,
    bar_index: usize,
    sizing: Sizing,
    stop_loss: Option<f64>,
) -> EntryResult {
    if state.has_position() {
        return EntryResult::AlreadyOpen;
    }

    let execution_price = bar.close;
    let size = resolve_size(sizing, state.cash, execution_price);
    if !(size > 0.0) {
        return EntryResult::ZeroSize;
    }

    let cost = size * execution_price;
    if cost > state.cash {
        return EntryResult::InsufficientCapital {
            required: cost,
            available: state.cash,
        };
    }

    let position = Position {
        entry_price: execution_price,
        size,
        stop_loss,
        open_bar_index: bar_index,
        entry_time: bar.timestamp,
    };

    EntryResult::Entered {
        state: state.with_position(position, state.cash - cost),
        size,
        execution_price,
        cost,
    }
}

/// Close the open position at `exit_price`. Returns `None` when flat.
pub fn exit_position(
    state: &SimulationState,
    bar: &PriceBar,
    bar_index: usize,
    exit_price: f64,
    reason: ExitReason,
) -> Option<(SimulationState, Trade)> {
    let position = state.position.as_ref()?;
    let proceeds = position.market_value(exit_price);
    let trade = Trade::from_position(position, exit_price, bar_index, bar.timestamp, reason);
    Some((state.flat(state.cash + proceeds), trade))
}

/// Close the position at its stop price if the bar's low breached it.
pub fn check_stop_loss(
    state: &SimulationState,
    bar: &PriceBar,
    bar_index: usize,
) -> Option<(SimulationState, Trade)> {
    let position = state.position.as_ref()?;
    let stop = position.stop_loss?;
    if !position.should_stop_loss(bar.low) {
        return None;
    }
    exit_position(state, bar, bar_index, stop, ExitReason::StopLoss)
}
