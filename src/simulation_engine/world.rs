// world.rs
//
// The tick-driven world model: one learning (primary) vehicle, a
// configurable number of scripted dummy vehicles, and a grid of
// two-phase lights. The world exposes sensing, the right-of-way rule
// table, and reward assignment; everything advances in a fixed order
// inside `apply` so a seeded run is reproducible.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::simulation_engine::grid::TrafficGrid;
use crate::simulation_engine::intersection::{IntersectionId, LightPhase};
use crate::simulation_engine::vehicle::{Action, Heading, Vehicle, VehicleKind};

/// What a vehicle senses at its own intersection: the light phase for
/// its heading, and the committed action of any conflicting vehicle
/// simultaneously present, by relative approach direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Percept {
    pub light: LightPhase,
    pub oncoming: Option<Action>,
    pub left: Option<Action>,
    pub right: Option<Action>,
}

impl Percept {
    /// The right-of-way rule table. Any policy may still pick an
    /// illegal action; `apply` penalizes it instead of correcting it.
    pub fn allows(&self, action: Action) -> bool {
        match action {
            Action::Stay => true,
            Action::Forward => self.light == LightPhase::Green,
            Action::Right => {
                self.light == LightPhase::Green || self.left != Some(Action::Forward)
            }
            Action::Left => {
                self.light == LightPhase::Green
                    && !matches!(self.oncoming, Some(Action::Forward) | Some(Action::Right))
            }
        }
    }

    /// All collision-free actions under this percept.
    pub fn legal_moves(&self) -> Vec<Action> {
        Action::ALL
            .iter()
            .copied()
            .filter(|action| self.allows(*action))
            .collect()
    }
}

/// Scalar rewards handed out by `apply`. The defaults follow the
/// original constants; alternate tables are a configuration variant.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardTable {
    /// Added when the primary vehicle reaches its destination.
    pub arrival: f64,
    /// Legal move matching the planner's suggested heading.
    pub matched_waypoint: f64,
    /// Legal move that ignores the planner's suggestion.
    pub off_route: f64,
    /// Staying put.
    pub stay: f64,
    /// Action forbidden by the right-of-way rules; the vehicle does
    /// not move.
    pub illegal: f64,
}

impl Default for RewardTable {
    fn default() -> Self {
        Self {
            arrival: 10.0,
            matched_waypoint: 2.0,
            off_route: -0.5,
            stay: 0.0,
            illegal: -1.0,
        }
    }
}

/// Static world parameters, part of the run configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub width: i8,
    pub height: i8,
    /// Scripted vehicles sharing the grid with the primary.
    pub dummy_count: usize,
    /// Deadline = Manhattan distance from start to destination times
    /// this factor.
    pub deadline_scale: i32,
    pub rewards: RewardTable,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 8,
            height: 6,
            dummy_count: 3,
            deadline_scale: 5,
            rewards: RewardTable::default(),
        }
    }
}

/// Result of one `apply` call.
#[derive(Debug, Clone, Copy)]
pub struct StepOutcome {
    pub reward: f64,
    pub arrived: bool,
    pub moved: bool,
}

pub struct GridWorld {
    pub(crate) grid: TrafficGrid,
    /// Index 0 is always the primary vehicle.
    pub(crate) vehicles: Vec<Vehicle>,
    pub(crate) destination: IntersectionId,
    pub(crate) deadline: i32,
    config: WorldConfig,
    rng: SmallRng,
    tick: u32,
}

impl GridWorld {
    pub fn new(config: WorldConfig, seed: u64) -> Self {
        let mut rng = SmallRng::seed_from_u64(seed);
        let grid = TrafficGrid::new(config.width, config.height, &mut rng);
        let start = IntersectionId(0, 0);
        let primary = Vehicle::new(0, VehicleKind::Primary, start, Heading::North, Action::Stay);
        Self {
            grid,
            vehicles: vec![primary],
            destination: start,
            deadline: 0,
            config,
            rng,
            tick: 0,
        }
    }

    /// Starts a new trial: places the primary at `start`, respawns the
    /// dummy traffic, re-randomizes light phases, and re-derives the
    /// deadline from the trip's Manhattan distance.
    pub fn reset(&mut self, start: IntersectionId, heading: Heading, destination: IntersectionId) {
        self.grid.randomize_lights(&mut self.rng);
        self.vehicles.clear();
        self.vehicles.push(Vehicle::new(
            0,
            VehicleKind::Primary,
            start,
            heading,
            Action::Stay,
        ));
        for id in 1..=self.config.dummy_count as u64 {
            let position = self.grid.wrap(
                self.rng.random_range(0..self.config.width),
                self.rng.random_range(0..self.config.height),
            );
            let heading = self.random_heading();
            let intent = self.random_intent();
            self.vehicles
                .push(Vehicle::new(id, VehicleKind::Dummy, position, heading, intent));
        }
        self.destination = destination;
        self.deadline = self.grid.manhattan_distance(start, destination) * self.config.deadline_scale;
        self.tick = 0;
    }

    /// Percept for the primary vehicle. No side effects.
    pub fn sense_primary(&self) -> Percept {
        self.sense(0)
    }

    fn sense(&self, index: usize) -> Percept {
        let me = &self.vehicles[index];
        let light = self
            .grid
            .get_intersection(&me.position)
            .map(|i| i.phase_for(me.heading))
            .unwrap_or(LightPhase::Red);

        let mut oncoming = None;
        let mut left = None;
        let mut right = None;
        for (i, other) in self.vehicles.iter().enumerate() {
            if i == index || other.position != me.position || other.heading == me.heading {
                continue;
            }
            let slot = if other.heading == me.heading.reverse() {
                &mut oncoming
            } else if other.heading == me.heading.left() {
                // A vehicle traveling toward my left approaches from my
                // right-hand side.
                &mut right
            } else {
                &mut left
            };
            // Forward intent is the one the rule table cares about, so
            // it wins when two vehicles share a slot.
            if slot.is_none() || other.intent == Action::Forward {
                *slot = Some(other.intent);
            }
        }

        Percept {
            light,
            oncoming,
            left,
            right,
        }
    }

    /// Executes one tick. Order is fixed: the primary's action is
    /// evaluated and moved first (for reward attribution), then every
    /// dummy advances by its committed intent, then the lights advance
    /// and the deadline drops by one.
    ///
    /// `waypoint` is the planner's suggestion for this tick, used for
    /// reward assignment only.
    pub fn apply(&mut self, action: Action, waypoint: Action) -> StepOutcome {
        // Arrival without movement: the trial may start on its
        // destination, and the first tick must report the terminal
        // reward untouched.
        if self.vehicles[0].position == self.destination {
            return StepOutcome {
                reward: self.config.rewards.arrival,
                arrived: true,
                moved: false,
            };
        }

        let percept = self.sense_primary();
        let legal = percept.allows(action);
        let mut moved = false;
        let mut reward = if !legal {
            self.config.rewards.illegal
        } else if action == Action::Stay {
            self.config.rewards.stay
        } else {
            self.move_vehicle(0, action);
            moved = true;
            if action == waypoint {
                self.config.rewards.matched_waypoint
            } else {
                self.config.rewards.off_route
            }
        };

        let arrived = self.vehicles[0].position == self.destination;
        if arrived {
            reward += self.config.rewards.arrival;
        }

        for index in 1..self.vehicles.len() {
            let percept = self.sense(index);
            let intent = self.vehicles[index].intent;
            if percept.allows(intent) {
                self.move_vehicle(index, intent);
            }
            self.vehicles[index].intent = self.random_intent();
        }

        self.grid.advance_lights();
        self.deadline -= 1;
        self.tick += 1;

        StepOutcome {
            reward,
            arrived,
            moved,
        }
    }

    fn move_vehicle(&mut self, index: usize, action: Action) {
        let vehicle = &self.vehicles[index];
        let heading = action.apply_to(vehicle.heading);
        let (dx, dy) = heading.delta();
        let position = self
            .grid
            .wrap(vehicle.position.0 + dx, vehicle.position.1 + dy);
        let vehicle = &mut self.vehicles[index];
        vehicle.heading = heading;
        vehicle.position = position;
    }

    fn random_heading(&mut self) -> Heading {
        const HEADINGS: [Heading; 4] =
            [Heading::North, Heading::East, Heading::South, Heading::West];
        HEADINGS[self.rng.random_range(0..HEADINGS.len())]
    }

    fn random_intent(&mut self) -> Action {
        Action::MOVES[self.rng.random_range(0..Action::MOVES.len())]
    }

    pub fn grid(&self) -> &TrafficGrid {
        &self.grid
    }

    /// Read-only vehicle snapshot for display surfaces.
    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    pub fn primary_position(&self) -> IntersectionId {
        self.vehicles[0].position
    }

    pub fn primary_heading(&self) -> Heading {
        self.vehicles[0].heading
    }

    pub fn primary_at_destination(&self) -> bool {
        self.vehicles[0].position == self.destination
    }

    pub fn destination(&self) -> IntersectionId {
        self.destination
    }

    /// Steps remaining in the current trial. May go negative when
    /// deadline enforcement is off.
    pub fn deadline(&self) -> i32 {
        self.deadline
    }

    pub fn tick(&self) -> u32 {
        self.tick
    }
}
