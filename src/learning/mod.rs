// learning/mod.rs
pub mod agent;
pub mod q_table;
pub mod state;

pub use agent::{AgentConfig, EpsilonSchedule, QLearningAgent, Transition};
pub use q_table::QTable;
pub use state::{State, StateVariant};
