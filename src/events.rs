// events.rs
//
// Structured per-tick and per-trial records plus the sink they flow
// into. The core drives whatever sink it is handed and never assumes
// a particular one exists.

use log::{debug, info};
use serde::Serialize;
use std::error::Error;
use std::fs::OpenOptions;
use std::path::Path;

use crate::learning::State;
use crate::simulation_engine::vehicle::Action;

#[derive(Debug, Clone, Serialize)]
pub struct TickRecord {
    pub trial: u32,
    pub step: u32,
    pub state: State,
    pub action: Action,
    pub reward: f64,
}

/// Flat per-trial record, CSV-friendly.
#[derive(Debug, Clone, Serialize)]
pub struct TrialRecord {
    pub trial: u32,
    pub outcome: String,
    pub deadline_at_start: i32,
    pub steps_used: u32,
    pub optimal_moves: u32,
    pub reward_sum: f64,
}

pub trait EventSink {
    fn record_tick(&mut self, record: &TickRecord);
    fn record_trial(&mut self, record: &TrialRecord);
}

/// Discards everything. The headless/test default.
pub struct NullSink;

impl EventSink for NullSink {
    fn record_tick(&mut self, _record: &TickRecord) {}
    fn record_trial(&mut self, _record: &TrialRecord) {}
}

/// Forwards records to the `log` facade: ticks at debug, trials at
/// info.
pub struct LogSink;

impl EventSink for LogSink {
    fn record_tick(&mut self, record: &TickRecord) {
        debug!(
            "trial {} step {}: state = {:?}, action = {:?}, reward = {}",
            record.trial, record.step, record.state, record.action, record.reward
        );
    }

    fn record_trial(&mut self, record: &TrialRecord) {
        info!(
            "trial {}: {} (deadline {}, {} steps, {} optimal, reward sum {:.1})",
            record.trial,
            record.outcome,
            record.deadline_at_start,
            record.steps_used,
            record.optimal_moves,
            record.reward_sum
        );
    }
}

/// Appends per-trial records to a CSV file, writing the header only
/// when the file is new. Ticks are ignored.
pub struct CsvTrialSink {
    writer: csv::Writer<std::fs::File>,
}

impl CsvTrialSink {
    pub fn open(filename: &str) -> Result<Self, Box<dyn Error>> {
        let file_exists = Path::new(filename).exists();
        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(filename)?;
        let writer = csv::WriterBuilder::new()
            .has_headers(!file_exists)
            .from_writer(file);
        Ok(Self { writer })
    }
}

impl EventSink for CsvTrialSink {
    fn record_tick(&mut self, _record: &TickRecord) {}

    fn record_trial(&mut self, record: &TrialRecord) {
        if let Err(e) = self.writer.serialize(record) {
            eprintln!("Error logging trial record: {}", e);
        } else if let Err(e) = self.writer.flush() {
            eprintln!("Error flushing trial record: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation_engine::intersection::LightPhase;
    use std::fs;

    #[test]
    fn csv_sink_appends_rows_with_a_single_header() {
        let path = std::env::temp_dir().join("gridcab_csv_sink_test.csv");
        let path = path.to_str().unwrap().to_string();
        let _ = fs::remove_file(&path);

        let record = TrialRecord {
            trial: 0,
            outcome: "arrived".to_string(),
            deadline_at_start: 20,
            steps_used: 6,
            optimal_moves: 5,
            reward_sum: 21.0,
        };
        {
            let mut sink = CsvTrialSink::open(&path).unwrap();
            sink.record_trial(&record);
        }
        {
            let mut sink = CsvTrialSink::open(&path).unwrap();
            sink.record_trial(&record);
        }

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents.matches("outcome").count(), 1);
        assert_eq!(contents.matches("arrived").count(), 2);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn null_sink_accepts_records() {
        let mut sink = NullSink;
        sink.record_tick(&TickRecord {
            trial: 0,
            step: 0,
            state: State {
                light: LightPhase::Green,
                oncoming: None,
                left: None,
                waypoint: Some(Action::Forward),
            },
            action: Action::Forward,
            reward: 2.0,
        });
        sink.record_trial(&TrialRecord {
            trial: 0,
            outcome: "arrived".to_string(),
            deadline_at_start: 20,
            steps_used: 6,
            optimal_moves: 5,
            reward_sum: 21.0,
        });
    }
}
