//! gridcab: a discrete-time grid-world traffic simulator in which a
//! tabular Q-learning agent learns to reach a destination before a
//! deadline while obeying right-of-way rules.
//!
//! The tick loop is single-threaded and fully sequential:
//! `sense -> select_action -> apply -> learn`, driven by
//! [`trial_runner::TrialRunner`]. The world and the route planner are
//! passive services; the Q-table lives in the agent and accumulates
//! across trials.

pub mod config;
pub mod error;
pub mod events;
pub mod learning;
pub mod report;
pub mod route_planner;
pub mod simulation_engine;
pub mod trial_runner;
