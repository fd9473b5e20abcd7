use std::error::Error;
use std::fmt;

use crate::simulation_engine::intersection::IntersectionId;

/// Errors surfaced by the simulation core. Per-tick trouble (illegal
/// actions, missing Q-table rows) is never an error; only setup-level
/// problems are.
#[derive(Debug, Clone, PartialEq)]
pub enum SimError {
    /// Destination off-grid or equal to the trip start. Fatal to that
    /// trial's setup, not to the run: the runner rerolls.
    InvalidDestination {
        destination: IntersectionId,
        reason: &'static str,
    },
    /// Misconfiguration that makes the run impossible.
    Config(String),
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::InvalidDestination {
                destination,
                reason,
            } => write!(
                f,
                "invalid destination {:?}: {}",
                destination, reason
            ),
            SimError::Config(message) => write!(f, "configuration error: {}", message),
        }
    }
}

impl Error for SimError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_destination() {
        let err = SimError::InvalidDestination {
            destination: IntersectionId(9, 0),
            reason: "outside the grid",
        };
        let text = err.to_string();
        assert!(text.contains("IntersectionId(9, 0)"));
        assert!(text.contains("outside the grid"));
    }
}
