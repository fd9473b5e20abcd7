// trial_runner.rs
//
// Drives N trials of the tick loop: sample a trip, reset world and
// agent, then sense -> select -> apply -> learn until the primary
// arrives or runs out of time. Outcomes come back as a lazy iterator;
// the Q-table persists across trials inside the agent.

use log::{info, warn};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::thread;
use std::time::Duration;

use crate::config::SimConfig;
use crate::error::SimError;
use crate::events::{EventSink, TickRecord, TrialRecord};
use crate::learning::QLearningAgent;
use crate::route_planner::RoutePlanner;
use crate::simulation_engine::intersection::IntersectionId;
use crate::simulation_engine::vehicle::{Action, Heading};
use crate::simulation_engine::world::GridWorld;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrialResult {
    /// Destination reached; `deadline_remaining` is negative when the
    /// vehicle arrived late with enforcement off.
    Arrived { deadline_remaining: i32 },
    TimedOut,
}

#[derive(Debug, Clone)]
pub struct TrialOutcome {
    pub trial: u32,
    pub result: TrialResult,
    pub deadline_at_start: i32,
    pub steps_used: u32,
    /// Ticks whose action was legal and matched the planner waypoint.
    pub optimal_moves: u32,
    pub reward_sum: f64,
}

impl TrialOutcome {
    pub fn arrived(&self) -> bool {
        matches!(self.result, TrialResult::Arrived { .. })
    }

    /// Arrived with deadline to spare.
    pub fn arrived_on_time(&self) -> bool {
        matches!(
            self.result,
            TrialResult::Arrived {
                deadline_remaining
            } if deadline_remaining >= 0
        )
    }
}

impl From<&TrialOutcome> for TrialRecord {
    fn from(outcome: &TrialOutcome) -> Self {
        let label = match outcome.result {
            TrialResult::Arrived { deadline_remaining } if deadline_remaining >= 0 => "arrived",
            TrialResult::Arrived { .. } => "arrived_late",
            TrialResult::TimedOut => "timed_out",
        };
        TrialRecord {
            trial: outcome.trial,
            outcome: label.to_string(),
            deadline_at_start: outcome.deadline_at_start,
            steps_used: outcome.steps_used,
            optimal_moves: outcome.optimal_moves,
            reward_sum: outcome.reward_sum,
        }
    }
}

pub struct TrialRunner {
    world: GridWorld,
    planner: RoutePlanner,
    agent: QLearningAgent,
    sink: Box<dyn EventSink>,
    enforce_deadline: bool,
    min_trip_distance: i32,
    hard_time_limit: i32,
    tick_delay: Duration,
    rng: SmallRng,
}

impl TrialRunner {
    pub fn new(config: &SimConfig, sink: Box<dyn EventSink>) -> Result<Self, SimError> {
        config.validate()?;
        Ok(Self {
            world: GridWorld::new(config.world.clone(), config.seed),
            planner: RoutePlanner::new(),
            agent: QLearningAgent::new(config.agent, config.seed.wrapping_add(1)),
            sink,
            enforce_deadline: config.enforce_deadline,
            min_trip_distance: config.min_trip_distance,
            hard_time_limit: config.hard_time_limit,
            tick_delay: Duration::from_millis(config.tick_delay_ms),
            rng: SmallRng::seed_from_u64(config.seed.wrapping_add(2)),
        })
    }

    /// Runs `n_trials` trials as a lazy, finite, non-restartable
    /// sequence of outcomes. Consumes the runner.
    pub fn run(self, n_trials: u32) -> Trials {
        Trials {
            runner: self,
            next_trial: 0,
            n_trials,
        }
    }

    /// Runs one trial over an explicit trip. Fails fast on an invalid
    /// destination; callers sampling trips reroll on that error.
    pub fn run_trip(
        &mut self,
        trial: u32,
        start: IntersectionId,
        heading: Heading,
        destination: IntersectionId,
    ) -> Result<TrialOutcome, SimError> {
        self.planner.route_to(self.world.grid(), start, destination)?;
        self.world.reset(start, heading, destination);
        self.agent.reset(trial);

        let deadline_at_start = self.world.deadline();
        let mut steps_used = 0u32;
        let mut optimal_moves = 0u32;
        let mut reward_sum = 0.0;

        let result = loop {
            if self.enforce_deadline {
                // Terminal state must be detected before another tick
                // is issued; reaching this with no time left is a bug
                // in the loop below, not a world condition.
                assert!(
                    self.world.deadline() > 0 || self.world.primary_at_destination(),
                    "tick issued after the deadline was exhausted"
                );
            }

            let waypoint = self
                .planner
                .next_waypoint(self.world.primary_position(), self.world.primary_heading());
            let percept = self.world.sense_primary();
            let state = self.agent.state_for(&percept, waypoint);
            self.agent.learn(state);

            let action = self.agent.select_action(state);
            let legal = percept.allows(action);
            let outcome = self.world.apply(action, waypoint);

            reward_sum += outcome.reward;
            if legal && action == waypoint && action != Action::Stay {
                optimal_moves += 1;
            }
            self.sink.record_tick(&TickRecord {
                trial,
                step: steps_used,
                state,
                action,
                reward: outcome.reward,
            });
            steps_used += 1;
            self.agent.remember(state, action, outcome.reward);

            if outcome.arrived {
                self.agent.learn_terminal();
                break TrialResult::Arrived {
                    deadline_remaining: self.world.deadline(),
                };
            }
            if self.world.deadline() <= self.hard_time_limit {
                warn!("trial {} hit the hard time limit", trial);
                break TrialResult::TimedOut;
            }
            if self.enforce_deadline && self.world.deadline() <= 0 {
                break TrialResult::TimedOut;
            }
            if !self.tick_delay.is_zero() {
                thread::sleep(self.tick_delay);
            }
        };

        let outcome = TrialOutcome {
            trial,
            result,
            deadline_at_start,
            steps_used,
            optimal_moves,
            reward_sum,
        };
        self.sink.record_trial(&TrialRecord::from(&outcome));
        Ok(outcome)
    }

    fn run_sampled_trial(&mut self, trial: u32) -> TrialOutcome {
        loop {
            let (start, heading, destination) = self.sample_trip();
            match self.run_trip(trial, start, heading, destination) {
                Ok(outcome) => return outcome,
                // Invalid destination is non-fatal to the run; reroll.
                Err(e) => info!("trial {}: rerolling trip ({})", trial, e),
            }
        }
    }

    /// Samples a start/heading/destination with at least the
    /// configured Manhattan distance between the endpoints.
    fn sample_trip(&mut self) -> (IntersectionId, Heading, IntersectionId) {
        const HEADINGS: [Heading; 4] =
            [Heading::North, Heading::East, Heading::South, Heading::West];
        let grid = self.world.grid();
        let (width, height) = (grid.width, grid.height);
        loop {
            let start = IntersectionId(
                self.rng.random_range(0..width),
                self.rng.random_range(0..height),
            );
            let destination = IntersectionId(
                self.rng.random_range(0..width),
                self.rng.random_range(0..height),
            );
            if self.world.grid().manhattan_distance(start, destination) < self.min_trip_distance {
                continue;
            }
            let heading = HEADINGS[self.rng.random_range(0..HEADINGS.len())];
            return (start, heading, destination);
        }
    }

    pub fn agent(&self) -> &QLearningAgent {
        &self.agent
    }

    pub fn world(&self) -> &GridWorld {
        &self.world
    }
}

/// Lazy trial sequence produced by [`TrialRunner::run`]. Finite and
/// non-restartable: it owns the runner and yields each trial's
/// outcome as it completes.
pub struct Trials {
    runner: TrialRunner,
    next_trial: u32,
    n_trials: u32,
}

impl Iterator for Trials {
    type Item = TrialOutcome;

    fn next(&mut self) -> Option<TrialOutcome> {
        if self.next_trial >= self.n_trials {
            return None;
        }
        let trial = self.next_trial;
        self.next_trial += 1;
        Some(self.runner.run_sampled_trial(trial))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.n_trials - self.next_trial) as usize;
        (remaining, Some(remaining))
    }
}

impl Trials {
    /// Access to the (partially) trained agent, e.g. to inspect the
    /// Q-table mid-run.
    pub fn runner(&self) -> &TrialRunner {
        &self.runner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::NullSink;
    use crate::learning::EpsilonSchedule;

    /// Agent that never explores and has nothing learned: greedy on an
    /// all-zero row always picks `Stay`, so it never moves.
    fn stay_put_config() -> SimConfig {
        let mut config = SimConfig::default();
        config.world.dummy_count = 0;
        config.world.deadline_scale = 1;
        config.min_trip_distance = 1;
        config.agent.epsilon = EpsilonSchedule::Constant(0.0);
        config.agent.initial_q = 0.0;
        config
    }

    fn runner(config: &SimConfig) -> TrialRunner {
        TrialRunner::new(config, Box::new(NullSink)).unwrap()
    }

    #[test]
    fn deadline_five_times_out_after_exactly_five_ticks() {
        let mut runner = runner(&stay_put_config());
        let outcome = runner
            .run_trip(0, IntersectionId(0, 0), Heading::East, IntersectionId(5, 0))
            .unwrap();
        assert_eq!(outcome.result, TrialResult::TimedOut);
        assert_eq!(outcome.deadline_at_start, 5);
        assert_eq!(outcome.steps_used, 5);
        assert_eq!(outcome.optimal_moves, 0);
    }

    #[test]
    fn disabled_enforcement_runs_to_the_hard_floor() {
        let mut config = stay_put_config();
        config.enforce_deadline = false;
        config.hard_time_limit = -10;
        let mut runner = runner(&config);
        let outcome = runner
            .run_trip(0, IntersectionId(0, 0), Heading::East, IntersectionId(4, 0))
            .unwrap();
        assert_eq!(outcome.result, TrialResult::TimedOut);
        assert_eq!(outcome.deadline_at_start, 4);
        // 4 regular ticks plus 10 more down to the floor.
        assert_eq!(outcome.steps_used, 14);
    }

    #[test]
    fn invalid_destination_is_reported_not_fatal() {
        let mut runner = runner(&stay_put_config());
        let err = runner
            .run_trip(0, IntersectionId(0, 0), Heading::East, IntersectionId(0, 0))
            .unwrap_err();
        assert!(matches!(err, SimError::InvalidDestination { .. }));
        // The runner is still usable afterwards.
        let outcome = runner
            .run_trip(0, IntersectionId(0, 0), Heading::East, IntersectionId(3, 0))
            .unwrap();
        assert_eq!(outcome.deadline_at_start, 3);
    }

    #[test]
    fn run_yields_exactly_n_outcomes_with_sequential_indices() {
        let config = SimConfig::default();
        let outcomes: Vec<TrialOutcome> = runner(&config).run(5).collect();
        assert_eq!(outcomes.len(), 5);
        for (index, outcome) in outcomes.iter().enumerate() {
            assert_eq!(outcome.trial, index as u32);
            assert!(
                outcome.deadline_at_start
                    >= config.min_trip_distance * config.world.deadline_scale
            );
        }
    }

    #[test]
    fn trial_record_labels_outcomes() {
        let outcome = TrialOutcome {
            trial: 3,
            result: TrialResult::Arrived {
                deadline_remaining: -2,
            },
            deadline_at_start: 10,
            steps_used: 12,
            optimal_moves: 9,
            reward_sum: 20.0,
        };
        assert!(outcome.arrived());
        assert!(!outcome.arrived_on_time());
        let record = TrialRecord::from(&outcome);
        assert_eq!(record.outcome, "arrived_late");
    }

    #[test]
    fn misconfiguration_aborts_construction() {
        let mut config = SimConfig::default();
        config.min_trip_distance = 99;
        assert!(TrialRunner::new(&config, Box::new(NullSink)).is_err());
    }
}
