// agent.rs
//
// The tabular Q-learning agent. Action selection is epsilon-greedy
// with a per-trial epsilon drawn from a pure schedule; value updates
// are one-step-delayed: the transition recorded at tick t-1 is
// finalized once the state at tick t is known, because only then is
// max Q(s', a') available.

use log::debug;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::learning::q_table::QTable;
use crate::learning::state::{State, StateVariant};
use crate::simulation_engine::vehicle::{Action, ACTION_COUNT};
use crate::simulation_engine::world::Percept;

/// Exploration-rate schedule: a pure function of the trial index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EpsilonSchedule {
    Constant(f64),
    /// `start - step * trial`, clamped at `floor`.
    Linear { start: f64, step: f64, floor: f64 },
    /// `start * rate^trial`, clamped at `floor`.
    Multiplicative { start: f64, rate: f64, floor: f64 },
}

impl EpsilonSchedule {
    pub fn epsilon(&self, trial: u32) -> f64 {
        match *self {
            EpsilonSchedule::Constant(value) => value,
            EpsilonSchedule::Linear { start, step, floor } => {
                (start - step * f64::from(trial)).max(floor)
            }
            EpsilonSchedule::Multiplicative { start, rate, floor } => {
                (start * rate.powi(trial as i32)).max(floor)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Learning rate.
    pub alpha: f64,
    /// Discount factor.
    pub gamma: f64,
    /// Value Q-table rows start at.
    pub initial_q: f64,
    pub epsilon: EpsilonSchedule,
    pub state_variant: StateVariant,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            alpha: 0.2,
            gamma: 0.5,
            initial_q: 0.0,
            epsilon: EpsilonSchedule::Linear {
                start: 1.0,
                step: 0.01,
                floor: 0.0,
            },
            state_variant: StateVariant::LightOncoming,
        }
    }
}

/// The (state, action, reward) triple of the immediately preceding
/// tick. Only one slot is ever needed.
#[derive(Debug, Clone, Copy)]
pub struct Transition {
    pub state: State,
    pub action: Action,
    pub reward: f64,
}

pub struct QLearningAgent {
    config: AgentConfig,
    q: QTable,
    prev: Option<Transition>,
    epsilon: f64,
    rng: SmallRng,
}

impl QLearningAgent {
    pub fn new(config: AgentConfig, seed: u64) -> Self {
        Self {
            q: QTable::new(config.initial_q),
            config,
            prev: None,
            epsilon: 0.0,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Prepares for a new trial: clears the pending transition and
    /// recomputes epsilon for `trial`. The Q-table is deliberately
    /// untouched; learning accumulates across trials.
    pub fn reset(&mut self, trial: u32) {
        self.prev = None;
        self.epsilon = self.config.epsilon.epsilon(trial);
        debug!("agent reset for trial {} with epsilon {:.3}", trial, self.epsilon);
    }

    /// Builds the Markov-state key for this tick's percept and
    /// waypoint under the configured abstraction variant.
    pub fn state_for(&self, percept: &Percept, waypoint: Action) -> State {
        State::from_percept(percept, waypoint, self.config.state_variant)
    }

    /// Finalizes the previous tick's transition now that this tick's
    /// state is known:
    /// `Q[s][a] <- (1-a)*Q[s][a] + a*(r + g*max(Q[s']))`.
    /// A no-op on the first tick of a trial.
    pub fn learn(&mut self, current_state: State) {
        if let Some(prev) = self.prev.take() {
            let future = self.q.max_value(current_state);
            let target = prev.reward + self.config.gamma * future;
            let entry = &mut self.q.row_mut(prev.state)[prev.action.index()];
            *entry = (1.0 - self.config.alpha) * *entry + self.config.alpha * target;
        }
    }

    /// Epsilon-greedy selection: uniform over the 4 actions with
    /// probability epsilon, greedy (lowest index on ties) otherwise.
    pub fn select_action(&mut self, state: State) -> Action {
        if self.rng.random::<f64>() < self.epsilon {
            Action::ALL[self.rng.random_range(0..ACTION_COUNT)]
        } else {
            self.q.greedy_action(state)
        }
    }

    /// Records this tick's transition for the next `learn` call.
    pub fn remember(&mut self, state: State, action: Action, reward: f64) {
        self.prev = Some(Transition {
            state,
            action,
            reward,
        });
    }

    /// Terminal update: the arrival reward has no future step to defer
    /// to, so the pending transition is folded in immediately with no
    /// discounted term.
    pub fn learn_terminal(&mut self) {
        if let Some(prev) = self.prev.take() {
            let entry = &mut self.q.row_mut(prev.state)[prev.action.index()];
            *entry = (1.0 - self.config.alpha) * *entry + self.config.alpha * prev.reward;
        }
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn pending_transition(&self) -> Option<&Transition> {
        self.prev.as_ref()
    }

    pub fn q_table(&self) -> &QTable {
        &self.q
    }

    pub fn q_table_mut(&mut self) -> &mut QTable {
        &mut self.q
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }
}
