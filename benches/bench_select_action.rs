// benches/bench_select_action.rs

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use gridcab::learning::{AgentConfig, EpsilonSchedule, QLearningAgent, State};
use gridcab::simulation_engine::intersection::LightPhase;
use gridcab::simulation_engine::vehicle::Action;

fn bench_select_action(c: &mut Criterion) {
    let config = AgentConfig {
        epsilon: EpsilonSchedule::Constant(0.05),
        ..AgentConfig::default()
    };
    let mut agent = QLearningAgent::new(config, 1);
    agent.reset(0);

    let state = State {
        light: LightPhase::Green,
        oncoming: None,
        left: None,
        waypoint: Some(Action::Forward),
    };
    agent.q_table_mut().row_mut(state)[Action::Forward.index()] = 2.0;

    c.bench_function("select_action", |b| {
        b.iter(|| agent.select_action(black_box(state)))
    });
}

criterion_group!(benches, bench_select_action);
criterion_main!(benches);
