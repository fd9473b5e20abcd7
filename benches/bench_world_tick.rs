// benches/bench_world_tick.rs

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use gridcab::simulation_engine::intersection::IntersectionId;
use gridcab::simulation_engine::vehicle::{Action, Heading};
use gridcab::simulation_engine::world::{GridWorld, WorldConfig};

fn bench_world_tick(c: &mut Criterion) {
    let config = WorldConfig {
        dummy_count: 3,
        ..WorldConfig::default()
    };
    let mut world = GridWorld::new(config, 1);
    let start = IntersectionId(0, 0);
    let destination = IntersectionId(7, 5);
    world.reset(start, Heading::East, destination);

    c.bench_function("world_tick", |b| {
        b.iter(|| {
            let outcome = world.apply(black_box(Action::Forward), Action::Forward);
            if outcome.arrived {
                world.reset(start, Heading::East, destination);
            }
            outcome.reward
        })
    });
}

criterion_group!(benches, bench_world_tick);
criterion_main!(benches);
