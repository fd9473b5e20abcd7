// report.rs
//
// End-of-run artifacts: the per-trial CSV table, a learning-curve
// chart of reward sums, and a printable summary.

use plotters::prelude::*;
use std::error::Error;
use std::fmt;

use crate::events::TrialRecord;
use crate::trial_runner::TrialOutcome;

const MOVING_AVERAGE_WINDOW: usize = 10;

/// Writes one CSV row per trial.
pub fn write_trial_report(filename: &str, outcomes: &[TrialOutcome]) -> Result<(), Box<dyn Error>> {
    let mut wtr = csv::Writer::from_path(filename)?;
    for outcome in outcomes {
        wtr.serialize(TrialRecord::from(outcome))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Renders per-trial reward sums with a moving average overlaid.
pub fn render_learning_curve(
    filename: &str,
    outcomes: &[TrialOutcome],
) -> Result<(), Box<dyn Error>> {
    if outcomes.is_empty() {
        return Ok(());
    }

    let rewards: Vec<f64> = outcomes.iter().map(|o| o.reward_sum).collect();
    let min_reward = rewards.iter().cloned().fold(f64::INFINITY, f64::min);
    let max_reward = rewards.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let margin = ((max_reward - min_reward) * 0.05).max(1.0);

    let backend = BitMapBackend::new(filename, (900, 600));
    let root = backend.into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Reward per trial", ("sans-serif", 24))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(
            0..outcomes.len(),
            (min_reward - margin)..(max_reward + margin),
        )?;
    chart
        .configure_mesh()
        .x_desc("Trial")
        .y_desc("Reward sum")
        .draw()?;

    chart
        .draw_series(LineSeries::new(
            rewards.iter().enumerate().map(|(i, r)| (i, *r)),
            &BLUE.mix(0.4),
        ))?
        .label("reward sum")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 16, y)], &BLUE));

    let averaged: Vec<(usize, f64)> = moving_average(&rewards, MOVING_AVERAGE_WINDOW);
    chart
        .draw_series(LineSeries::new(averaged, &RED))?
        .label("moving average")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 16, y)], &RED));

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;
    root.present()?;
    Ok(())
}

fn moving_average(values: &[f64], window: usize) -> Vec<(usize, f64)> {
    if values.len() < window {
        return Vec::new();
    }
    (window - 1..values.len())
        .map(|end| {
            let slice = &values[end + 1 - window..=end];
            (end, slice.iter().sum::<f64>() / window as f64)
        })
        .collect()
}

/// Aggregate statistics over a finished run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub trials: usize,
    pub arrived: usize,
    pub arrived_on_time: usize,
    /// On-time arrivals over the final window (up to 50 trials),
    /// where a trained policy should be visible.
    pub recent_on_time: usize,
    pub recent_window: usize,
    pub mean_steps: f64,
    pub mean_reward_sum: f64,
}

impl RunSummary {
    pub fn from_outcomes(outcomes: &[TrialOutcome]) -> Self {
        let trials = outcomes.len();
        let arrived = outcomes.iter().filter(|o| o.arrived()).count();
        let arrived_on_time = outcomes.iter().filter(|o| o.arrived_on_time()).count();
        let recent_window = trials.min(50);
        let recent = &outcomes[trials - recent_window..];
        let recent_on_time = recent.iter().filter(|o| o.arrived_on_time()).count();
        let mean = |f: fn(&TrialOutcome) -> f64| {
            if trials == 0 {
                0.0
            } else {
                outcomes.iter().map(f).sum::<f64>() / trials as f64
            }
        };
        Self {
            trials,
            arrived,
            arrived_on_time,
            recent_on_time,
            recent_window,
            mean_steps: mean(|o| f64::from(o.steps_used)),
            mean_reward_sum: mean(|o| o.reward_sum),
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Trials: {} ({} arrived, {} on time)",
            self.trials, self.arrived, self.arrived_on_time
        )?;
        writeln!(
            f,
            "Last {} trials: {} on time",
            self.recent_window, self.recent_on_time
        )?;
        write!(
            f,
            "Mean steps: {:.1}, mean reward sum: {:.1}",
            self.mean_steps, self.mean_reward_sum
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trial_runner::TrialResult;

    fn outcome(trial: u32, result: TrialResult, reward_sum: f64) -> TrialOutcome {
        TrialOutcome {
            trial,
            result,
            deadline_at_start: 20,
            steps_used: 10,
            optimal_moves: 5,
            reward_sum,
        }
    }

    #[test]
    fn trial_report_writes_one_row_per_outcome() {
        let path = std::env::temp_dir().join("gridcab_trial_report_test.csv");
        let path = path.to_str().unwrap().to_string();
        let _ = std::fs::remove_file(&path);

        let outcomes = vec![
            outcome(0, TrialResult::TimedOut, -5.0),
            outcome(1, TrialResult::Arrived { deadline_remaining: 3 }, 24.0),
        ];
        write_trial_report(&path, &outcomes).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 3);
        assert!(contents.contains("timed_out"));
        assert!(contents.contains("arrived"));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn moving_average_smooths_a_ramp() {
        let values = [0.0, 1.0, 2.0, 3.0, 4.0];
        let averaged = moving_average(&values, 3);
        assert_eq!(averaged, vec![(2, 1.0), (3, 2.0), (4, 3.0)]);
    }

    #[test]
    fn moving_average_needs_a_full_window() {
        assert!(moving_average(&[1.0, 2.0], 3).is_empty());
    }

    #[test]
    fn summary_counts_on_time_arrivals_separately() {
        let outcomes = vec![
            outcome(0, TrialResult::TimedOut, -5.0),
            outcome(1, TrialResult::Arrived { deadline_remaining: -1 }, 8.0),
            outcome(2, TrialResult::Arrived { deadline_remaining: 3 }, 24.0),
        ];
        let summary = RunSummary::from_outcomes(&outcomes);
        assert_eq!(summary.trials, 3);
        assert_eq!(summary.arrived, 2);
        assert_eq!(summary.arrived_on_time, 1);
        assert_eq!(summary.recent_window, 3);
        assert_eq!(summary.mean_reward_sum, 9.0);
    }
}
