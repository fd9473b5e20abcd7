use std::collections::HashMap;

use crate::learning::state::State;
use crate::simulation_engine::vehicle::{Action, ACTION_COUNT};

/// Tabular action values: one row of 4 entries per visited state.
/// Rows are created lazily on first access and persist across trials
/// within a run; a missing row is never an error.
pub struct QTable {
    rows: HashMap<State, [f64; ACTION_COUNT]>,
    /// Value new rows start at. Optimistic (positive) initialization
    /// drives systematic early exploration; zero leaves exploration to
    /// the epsilon schedule alone.
    initial_q: f64,
}

impl QTable {
    pub fn new(initial_q: f64) -> Self {
        Self {
            rows: HashMap::new(),
            initial_q,
        }
    }

    pub fn row_mut(&mut self, state: State) -> &mut [f64; ACTION_COUNT] {
        let initial_q = self.initial_q;
        self.rows.entry(state).or_insert([initial_q; ACTION_COUNT])
    }

    /// Best value achievable from `state`, creating the row if absent.
    pub fn max_value(&mut self, state: State) -> f64 {
        self.row_mut(state)
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Greedy action for `state`. Ties break toward the lowest action
    /// index so tests stay reproducible.
    pub fn greedy_action(&mut self, state: State) -> Action {
        let row = self.row_mut(state);
        let mut best = 0;
        for (index, value) in row.iter().enumerate() {
            if *value > row[best] {
                best = index;
            }
        }
        Action::ALL[best]
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
