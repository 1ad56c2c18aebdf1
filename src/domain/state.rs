//! Per-step simulation state and equity tracking.
//!
//! The simulator never mutates a state in place: every step takes the
//! previous `SimulationState` and returns the next one.

use chrono::NaiveDateTime;

use super::position::Position;

#[derive(Debug, Clone, PartialEq)]
pub struct EquityPoint {
    pub timestamp: NaiveDateTime,
    pub equity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationState {
    pub cash: f64,
    pub position: Option<Position>,
    pub bar_index: usize,
}

impl SimulationState {
    pub fn new(initial_cash: f64) -> Self {
        SimulationState {
            cash: initial_cash,
            position: None,
            bar_index: 0,
        }
    }

    pub fn has_position(&self) -> bool {
        self.position.is_some()
    }

    /// Cash plus the open position marked at `price`.
    pub fn equity(&self, price: f64) -> f64 {
        let position_value = self
            .position
            .as_ref()
            .map(|pos| pos.market_value(price))
            .unwrap_or(0.0);
        self.cash + position_value
    }

    pub fn with_position(&self, position: Position, cash: f64) -> Self {
        SimulationState {
            cash,
            position: Some(position),
            bar_index: self.bar_index,
        }
    }

    pub fn flat(&self, cash: f64) -> Self {
        SimulationState {
            cash,
            position: None,
            bar_index: self.bar_index,
        }
    }

    pub fn at_bar(&self, bar_index: usize) -> Self {
        SimulationState {
            bar_index,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_position(size: f64) -> Position {
        Position {
            entry_price: 100.0,
            size,
            stop_loss: None,
            open_bar_index: 0,
            entry_time: NaiveDate::from_ymd_opt(2024, 1, 15)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        }
    }

    #[test]
    fn new_state() {
        let state = SimulationState::new(10_000.0);
        assert!((state.cash - 10_000.0).abs() < f64::EPSILON);
        assert!(!state.has_position());
        assert_eq!(state.bar_index, 0);
    }

    #[test]
    fn equity_without_position_is_cash() {
        let state = SimulationState::new(10_000.0);
        assert!((state.equity(123.0) - 10_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn equity_marks_position_to_market() {
        let state = SimulationState::new(10_000.0).with_position(sample_position(50.0), 5_000.0);
        assert!(state.has_position());
        assert!((state.equity(110.0) - 10_500.0).abs() < f64::EPSILON);
    }

    #[test]
    fn flat_clears_position_and_keeps_bar() {
        let state = SimulationState::new(10_000.0)
            .at_bar(7)
            .with_position(sample_position(1.0), 9_900.0);
        let next = state.flat(10_050.0);
        assert!(!next.has_position());
        assert_eq!(next.bar_index, 7);
        assert!((next.cash - 10_050.0).abs() < f64::EPSILON);
        // previous state untouched
        assert!(state.has_position());
    }
}
