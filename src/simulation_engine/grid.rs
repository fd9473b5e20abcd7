use rand::rngs::SmallRng;
use rand::Rng;
use std::collections::HashMap;

use crate::simulation_engine::intersection::{Intersection, IntersectionId};

/// The traffic grid: a `width` x `height` lattice of signalled
/// intersections. Movement wraps at the edges, so every heading is
/// always drivable; distances for planning and deadlines stay plain
/// Manhattan (no wrap shortcut).
pub struct TrafficGrid {
    pub width: i8,
    pub height: i8,
    /// All intersections by their (x, y) ID.
    pub intersections: HashMap<IntersectionId, Intersection>,
}

impl TrafficGrid {
    /// Builds the grid, drawing each intersection's light cycle length
    /// from 3..=5 ticks and a random initial open axis.
    pub fn new(width: i8, height: i8, rng: &mut SmallRng) -> Self {
        let mut intersections = HashMap::new();
        for x in 0..width {
            for y in 0..height {
                let period = rng.random_range(3..=5);
                let ns_open = rng.random_bool(0.5);
                let intersection = Intersection::new(x, y, ns_open, period);
                intersections.insert(intersection.id, intersection);
            }
        }
        TrafficGrid {
            width,
            height,
            intersections,
        }
    }

    pub fn contains(&self, id: IntersectionId) -> bool {
        id.0 >= 0 && id.0 < self.width && id.1 >= 0 && id.1 < self.height
    }

    /// Wraps raw coordinates back onto the grid.
    pub fn wrap(&self, x: i8, y: i8) -> IntersectionId {
        IntersectionId(x.rem_euclid(self.width), y.rem_euclid(self.height))
    }

    pub fn manhattan_distance(&self, a: IntersectionId, b: IntersectionId) -> i32 {
        (i32::from(a.0) - i32::from(b.0)).abs() + (i32::from(a.1) - i32::from(b.1)).abs()
    }

    pub fn get_intersection(&self, id: &IntersectionId) -> Option<&Intersection> {
        self.intersections.get(id)
    }

    /// Advances every light by one tick.
    pub fn advance_lights(&mut self) {
        for intersection in self.intersections.values_mut() {
            intersection.advance();
        }
    }

    /// Re-randomizes every light's open axis and restarts its cycle.
    /// Called at trial reset. Iterates in coordinate order so a fixed
    /// seed always produces the same phases.
    pub fn randomize_lights(&mut self, rng: &mut SmallRng) {
        for x in 0..self.width {
            for y in 0..self.height {
                if let Some(intersection) = self.intersections.get_mut(&IntersectionId(x, y)) {
                    intersection.ns_open = rng.random_bool(0.5);
                    intersection.countdown = intersection.period;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn grid() -> TrafficGrid {
        let mut rng = SmallRng::seed_from_u64(7);
        TrafficGrid::new(8, 6, &mut rng)
    }

    #[test]
    fn builds_every_intersection() {
        let grid = grid();
        assert_eq!(grid.intersections.len(), 48);
        assert!(grid.contains(IntersectionId(0, 0)));
        assert!(grid.contains(IntersectionId(7, 5)));
        assert!(!grid.contains(IntersectionId(8, 0)));
        assert!(!grid.contains(IntersectionId(0, -1)));
    }

    #[test]
    fn wrap_folds_coordinates_onto_grid() {
        let grid = grid();
        assert_eq!(grid.wrap(8, 0), IntersectionId(0, 0));
        assert_eq!(grid.wrap(-1, 3), IntersectionId(7, 3));
        assert_eq!(grid.wrap(2, 6), IntersectionId(2, 0));
        assert_eq!(grid.wrap(2, -1), IntersectionId(2, 5));
    }

    #[test]
    fn manhattan_distance_ignores_wrap() {
        let grid = grid();
        let a = IntersectionId(0, 0);
        let b = IntersectionId(7, 5);
        assert_eq!(grid.manhattan_distance(a, b), 12);
        assert_eq!(grid.manhattan_distance(b, a), 12);
        assert_eq!(grid.manhattan_distance(a, a), 0);
    }

    #[test]
    fn light_periods_stay_in_range() {
        let grid = grid();
        for intersection in grid.intersections.values() {
            assert!((3..=5).contains(&intersection.period));
        }
    }
}
