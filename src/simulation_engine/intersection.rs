use serde::{Deserialize, Serialize};

use crate::simulation_engine::vehicle::Heading;

/// Unique identifier for an intersection using (x, y) grid coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IntersectionId(pub i8, pub i8);

/// The light phase as seen by one vehicle for its own heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LightPhase {
    Green,
    Red,
}

/// A traffic intersection (node). Each intersection carries a single
/// two-phase light: when `ns_open` is true, north/south traffic sees
/// green and east/west traffic sees red, and vice versa. The light
/// flips on a fixed per-intersection cycle.
#[derive(Debug, Clone)]
pub struct Intersection {
    /// Unique identifier for the intersection.
    pub id: IntersectionId,
    /// True when the north/south axis currently has green.
    pub ns_open: bool,
    /// Ticks between phase flips.
    pub period: u8,
    /// Ticks remaining until the next flip.
    pub countdown: u8,
}

impl Intersection {
    pub fn new(x: i8, y: i8, ns_open: bool, period: u8) -> Self {
        Self {
            id: IntersectionId(x, y),
            ns_open,
            period,
            countdown: period,
        }
    }

    /// The phase a vehicle with the given heading sees at this
    /// intersection. Cross traffic always sees the opposite phase.
    pub fn phase_for(&self, heading: Heading) -> LightPhase {
        if heading.is_vertical() == self.ns_open {
            LightPhase::Green
        } else {
            LightPhase::Red
        }
    }

    /// Advances the light by one tick, flipping the open axis when the
    /// cycle countdown reaches zero.
    pub fn advance(&mut self) {
        self.countdown -= 1;
        if self.countdown == 0 {
            self.ns_open = !self.ns_open;
            self.countdown = self.period;
        }
    }
}
