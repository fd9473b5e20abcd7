use serde::{Deserialize, Serialize};
use std::fs;

use crate::error::SimError;
use crate::learning::AgentConfig;
use crate::simulation_engine::world::WorldConfig;

/// Full run configuration with documented defaults. Loadable from a
/// JSON file; the binary's flags override individual fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub world: WorldConfig,
    pub agent: AgentConfig,
    /// Trials per run.
    pub n_trials: u32,
    /// Seed for world dynamics, trip sampling, and exploration.
    pub seed: u64,
    /// When false, a deadline of 0 only marks the trial failed for
    /// scoring; the hard time limit still ends it.
    pub enforce_deadline: bool,
    /// Minimum Manhattan distance between sampled start and
    /// destination.
    pub min_trip_distance: i32,
    /// Deadline floor that ends a runaway trial even with enforcement
    /// off.
    pub hard_time_limit: i32,
    /// Wall-clock pacing between ticks, for watching a run. Zero
    /// (the default) is a no-op, which headless and test runs rely on.
    pub tick_delay_ms: u64,
    pub report_csv: Option<String>,
    pub learning_curve_png: Option<String>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            world: WorldConfig::default(),
            agent: AgentConfig::default(),
            n_trials: 100,
            seed: 42,
            enforce_deadline: true,
            min_trip_distance: 4,
            hard_time_limit: -100,
            tick_delay_ms: 0,
            report_csv: Some("trial_report.csv".to_string()),
            learning_curve_png: Some("learning_curve.png".to_string()),
        }
    }
}

impl SimConfig {
    pub fn from_file(path: &str) -> Result<Self, SimError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| SimError::Config(format!("cannot read {}: {}", path, e)))?;
        serde_json::from_str(&contents)
            .map_err(|e| SimError::Config(format!("cannot parse {}: {}", path, e)))
    }

    /// Sanity checks that would otherwise starve trip sampling or
    /// break the tick loop.
    pub fn validate(&self) -> Result<(), SimError> {
        if self.world.width < 2 || self.world.height < 2 {
            return Err(SimError::Config(format!(
                "grid {}x{} is too small",
                self.world.width, self.world.height
            )));
        }
        let max_distance =
            i32::from(self.world.width - 1) + i32::from(self.world.height - 1);
        if self.min_trip_distance < 1 || self.min_trip_distance > max_distance {
            return Err(SimError::Config(format!(
                "min_trip_distance {} is unreachable on a {}x{} grid",
                self.min_trip_distance, self.world.width, self.world.height
            )));
        }
        if !(0.0..=1.0).contains(&self.agent.alpha) || !(0.0..=1.0).contains(&self.agent.gamma) {
            return Err(SimError::Config(
                "alpha and gamma must lie in [0, 1]".to_string(),
            ));
        }
        if self.world.deadline_scale < 1 {
            return Err(SimError::Config("deadline_scale must be >= 1".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(SimConfig::default().validate().is_ok());
    }

    #[test]
    fn unreachable_trip_distance_is_rejected() {
        let mut config = SimConfig::default();
        config.min_trip_distance = 100;
        assert!(matches!(config.validate(), Err(SimError::Config(_))));
    }

    #[test]
    fn alpha_outside_unit_interval_is_rejected() {
        let mut config = SimConfig::default();
        config.agent.alpha = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn round_trips_through_json() {
        let config = SimConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: SimConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.n_trials, config.n_trials);
        assert_eq!(parsed.min_trip_distance, config.min_trip_distance);
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let parsed: SimConfig = serde_json::from_str(r#"{"n_trials": 7}"#).unwrap();
        assert_eq!(parsed.n_trials, 7);
        assert_eq!(parsed.seed, SimConfig::default().seed);
        assert!(parsed.enforce_deadline);
    }
}
