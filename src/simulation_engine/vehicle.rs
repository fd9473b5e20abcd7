use serde::{Deserialize, Serialize};

use crate::simulation_engine::intersection::IntersectionId;

/// Compass heading of a vehicle. The y axis grows southward, so
/// `North` moves toward smaller y values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Heading {
    North,
    East,
    South,
    West,
}

impl Heading {
    /// Unit step for this heading as (dx, dy).
    pub fn delta(self) -> (i8, i8) {
        match self {
            Heading::North => (0, -1),
            Heading::East => (1, 0),
            Heading::South => (0, 1),
            Heading::West => (-1, 0),
        }
    }

    pub fn left(self) -> Heading {
        match self {
            Heading::North => Heading::West,
            Heading::West => Heading::South,
            Heading::South => Heading::East,
            Heading::East => Heading::North,
        }
    }

    pub fn right(self) -> Heading {
        match self {
            Heading::North => Heading::East,
            Heading::East => Heading::South,
            Heading::South => Heading::West,
            Heading::West => Heading::North,
        }
    }

    pub fn reverse(self) -> Heading {
        self.left().left()
    }

    pub fn is_vertical(self) -> bool {
        matches!(self, Heading::North | Heading::South)
    }
}

/// An action a vehicle can take at an intersection. The order is
/// fixed: Q-table rows are indexed by `Action::index`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Stay,
    Forward,
    Left,
    Right,
}

pub const ACTION_COUNT: usize = 4;

impl Action {
    pub const ALL: [Action; ACTION_COUNT] =
        [Action::Stay, Action::Forward, Action::Left, Action::Right];

    /// The three actions that actually move a vehicle.
    pub const MOVES: [Action; 3] = [Action::Forward, Action::Left, Action::Right];

    pub fn index(self) -> usize {
        match self {
            Action::Stay => 0,
            Action::Forward => 1,
            Action::Left => 2,
            Action::Right => 3,
        }
    }

    /// The heading a vehicle ends up with after taking this action.
    pub fn apply_to(self, heading: Heading) -> Heading {
        match self {
            Action::Stay | Action::Forward => heading,
            Action::Left => heading.left(),
            Action::Right => heading.right(),
        }
    }
}

/// Distinguishes the single learning vehicle from scripted traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VehicleKind {
    Primary,
    Dummy,
}

/// A vehicle traveling through the grid.
#[derive(Debug, Clone)]
pub struct Vehicle {
    pub id: u64,
    pub kind: VehicleKind,
    pub position: IntersectionId,
    pub heading: Heading,
    /// The action this vehicle has committed to for the upcoming tick.
    /// This is what other vehicles sense as the conflicting intent.
    pub intent: Action,
}

impl Vehicle {
    pub fn new(
        id: u64,
        kind: VehicleKind,
        position: IntersectionId,
        heading: Heading,
        intent: Action,
    ) -> Self {
        Self {
            id,
            kind,
            position,
            heading,
            intent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_indices_match_all_order() {
        for (i, action) in Action::ALL.iter().enumerate() {
            assert_eq!(action.index(), i);
        }
    }

    #[test]
    fn heading_rotations_are_consistent() {
        for heading in [Heading::North, Heading::East, Heading::South, Heading::West] {
            assert_eq!(heading.left().right(), heading);
            assert_eq!(heading.reverse().reverse(), heading);
            assert_ne!(heading.left(), heading.right());
        }
    }

    #[test]
    fn turning_changes_heading() {
        assert_eq!(Action::Left.apply_to(Heading::North), Heading::West);
        assert_eq!(Action::Right.apply_to(Heading::North), Heading::East);
        assert_eq!(Action::Forward.apply_to(Heading::South), Heading::South);
    }
}
