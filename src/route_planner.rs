// route_planner.rs
//
// Single-hop route hinting: given the current position and heading,
// suggest the next heading toward the active destination ignoring
// traffic entirely. The suggestion is Manhattan-optimal: the larger
// axis distance is reduced first, with east-west winning ties.

use crate::error::SimError;
use crate::simulation_engine::grid::TrafficGrid;
use crate::simulation_engine::intersection::IntersectionId;
use crate::simulation_engine::vehicle::{Action, Heading};

pub struct RoutePlanner {
    destination: Option<IntersectionId>,
}

impl RoutePlanner {
    pub fn new() -> Self {
        Self { destination: None }
    }

    /// Sets the active destination for the trip starting at `start`.
    pub fn route_to(
        &mut self,
        grid: &TrafficGrid,
        start: IntersectionId,
        destination: IntersectionId,
    ) -> Result<(), SimError> {
        if !grid.contains(destination) {
            return Err(SimError::InvalidDestination {
                destination,
                reason: "outside the grid",
            });
        }
        if destination == start {
            return Err(SimError::InvalidDestination {
                destination,
                reason: "equal to the trip start",
            });
        }
        self.destination = Some(destination);
        Ok(())
    }

    pub fn destination(&self) -> Option<IntersectionId> {
        self.destination
    }

    /// The single best next action toward the destination, as a pure
    /// function of (position, heading). `Stay` when no destination is
    /// set or the vehicle already stands on it.
    pub fn next_waypoint(&self, position: IntersectionId, heading: Heading) -> Action {
        let destination = match self.destination {
            Some(destination) => destination,
            None => return Action::Stay,
        };
        let dx = destination.0 - position.0;
        let dy = destination.1 - position.1;
        if dx == 0 && dy == 0 {
            return Action::Stay;
        }

        // Reduce the larger axis distance first; east-west before
        // north-south on ties.
        let desired = if dx.abs() >= dy.abs() {
            if dx > 0 {
                Heading::East
            } else {
                Heading::West
            }
        } else if dy > 0 {
            Heading::South
        } else {
            Heading::North
        };

        if desired == heading {
            Action::Forward
        } else if desired == heading.right() {
            Action::Right
        } else {
            // Covers both a left turn and a full reversal; a U-turn is
            // two lefts.
            Action::Left
        }
    }
}

impl Default for RoutePlanner {
    fn default() -> Self {
        Self::new()
    }
}
