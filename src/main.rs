// main.rs
//
// CLI entry point: load the run configuration (JSON file plus flag
// overrides), run the trials, then print the summary and write the
// report artifacts.

use std::env;
use std::process;

use gridcab::config::SimConfig;
use gridcab::events::LogSink;
use gridcab::report::{render_learning_curve, write_trial_report, RunSummary};
use gridcab::trial_runner::{TrialOutcome, TrialRunner};

fn parse_args() -> Result<SimConfig, String> {
    let mut config: Option<SimConfig> = None;
    let mut trials: Option<u32> = None;
    let mut seed: Option<u64> = None;
    let mut no_deadline = false;

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--trials" => {
                let value = args.next().ok_or("--trials needs a value")?;
                trials = Some(value.parse().map_err(|_| format!("bad trial count: {}", value))?);
            }
            "--seed" => {
                let value = args.next().ok_or("--seed needs a value")?;
                seed = Some(value.parse().map_err(|_| format!("bad seed: {}", value))?);
            }
            "--no-deadline" => no_deadline = true,
            "--help" | "-h" => {
                return Err(
                    "usage: gridcab [config.json] [--trials N] [--seed S] [--no-deadline]"
                        .to_string(),
                )
            }
            path if !path.starts_with('-') => {
                config = Some(SimConfig::from_file(path).map_err(|e| e.to_string())?);
            }
            other => return Err(format!("unknown flag: {}", other)),
        }
    }

    let mut config = config.unwrap_or_default();
    if let Some(trials) = trials {
        config.n_trials = trials;
    }
    if let Some(seed) = seed {
        config.seed = seed;
    }
    if no_deadline {
        config.enforce_deadline = false;
    }
    Ok(config)
}

fn main() {
    env_logger::init();

    let config = match parse_args() {
        Ok(config) => config,
        Err(message) => {
            eprintln!("{}", message);
            process::exit(1);
        }
    };

    let runner = match TrialRunner::new(&config, Box::new(LogSink)) {
        Ok(runner) => runner,
        Err(e) => {
            eprintln!("cannot start run: {}", e);
            process::exit(1);
        }
    };

    let outcomes: Vec<TrialOutcome> = runner.run(config.n_trials).collect();

    let summary = RunSummary::from_outcomes(&outcomes);
    println!("{}", summary);

    if let Some(path) = &config.report_csv {
        if let Err(e) = write_trial_report(path, &outcomes) {
            eprintln!("Error writing trial report: {}", e);
        } else {
            println!("Trial report saved to {}", path);
        }
    }
    if let Some(path) = &config.learning_curve_png {
        if let Err(e) = render_learning_curve(path, &outcomes) {
            eprintln!("Error rendering learning curve: {}", e);
        } else {
            println!("Learning curve saved to {}", path);
        }
    }
}
