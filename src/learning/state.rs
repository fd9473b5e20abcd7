use serde::{Deserialize, Serialize};

use crate::simulation_engine::intersection::LightPhase;
use crate::simulation_engine::vehicle::Action;
use crate::simulation_engine::world::Percept;

/// Which percept fields participate in the Markov state. Coarser
/// variants give a denser table (fewer rows, faster to fill), finer
/// ones separate situations the coarse key would conflate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StateVariant {
    /// Light phase only. No waypoint, so the policy can at best learn
    /// when to move at all.
    LightOnly,
    /// Light, oncoming intent, and the planner waypoint. The variant
    /// the original experiments settled on.
    LightOncoming,
    /// Adds the left-slot intent, needed to separate right-on-red
    /// situations.
    LightOncomingLeft,
}

/// The agent's Markov-state key. Fields not selected by the active
/// `StateVariant` are normalized to `None`, so an identical
/// percept+waypoint pair always hashes to the same table row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct State {
    pub light: LightPhase,
    pub oncoming: Option<Action>,
    pub left: Option<Action>,
    pub waypoint: Option<Action>,
}

impl State {
    pub fn from_percept(percept: &Percept, waypoint: Action, variant: StateVariant) -> Self {
        match variant {
            StateVariant::LightOnly => State {
                light: percept.light,
                oncoming: None,
                left: None,
                waypoint: None,
            },
            StateVariant::LightOncoming => State {
                light: percept.light,
                oncoming: percept.oncoming,
                left: None,
                waypoint: Some(waypoint),
            },
            StateVariant::LightOncomingLeft => State {
                light: percept.light,
                oncoming: percept.oncoming,
                left: percept.left,
                waypoint: Some(waypoint),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn percept() -> Percept {
        Percept {
            light: LightPhase::Green,
            oncoming: Some(Action::Forward),
            left: Some(Action::Right),
            right: Some(Action::Left),
        }
    }

    #[test]
    fn same_percept_and_waypoint_give_equal_keys() {
        let a = State::from_percept(&percept(), Action::Forward, StateVariant::LightOncoming);
        let b = State::from_percept(&percept(), Action::Forward, StateVariant::LightOncoming);
        assert_eq!(a, b);
    }

    #[test]
    fn unused_fields_are_normalized() {
        let state = State::from_percept(&percept(), Action::Forward, StateVariant::LightOncoming);
        assert_eq!(state.left, None);
        let state = State::from_percept(&percept(), Action::Forward, StateVariant::LightOnly);
        assert_eq!(state.oncoming, None);
        assert_eq!(state.waypoint, None);
    }

    #[test]
    fn finer_variant_keeps_left_slot() {
        let state =
            State::from_percept(&percept(), Action::Right, StateVariant::LightOncomingLeft);
        assert_eq!(state.left, Some(Action::Right));
        assert_eq!(state.waypoint, Some(Action::Right));
    }
}
