use std::hint::black_box;
use std::time::Instant;

use criterion::{criterion_group, criterion_main, Criterion, Throughput};

use trackvis::kinematics::update;
use trackvis::{
    seed, Direction, Line, Simulation, SimulatorConfig, SpeedMultiplier, Train, TrainClass, TrackSimulator,
};

fn paused() -> SimulatorConfig {
    SimulatorConfig {
        start_playing: false,
        ..SimulatorConfig::default()
    }
}

// A busier line than the reference pair: 64 trains spread over both lines.
fn crowded_trains() -> Vec<Train> {
    (0..64u32)
        .map(|i| {
            let up = i % 2 == 0;
            Train::builder()
                .id(format!("bench{i}"))
                .name(format!("Bench {i}"))
                .class(TrainClass::Passenger)
                .line(if up { Line::Up } else { Line::Down })
                .position(f64::from(i) * 1.5)
                .speed(40.0 + f64::from(i))
                .direction(if up { Direction::Forward } else { Direction::Backward })
                .build()
                .unwrap()
        })
        .collect()
}

fn bench_update_single(c: &mut Criterion) {
    let topology = seed::reference_topology();
    let train = seed::initial_trains().remove(0);

    c.bench_function("kinematics/update_single", |b| {
        b.iter(|| update(black_box(&train), &topology, 1, SpeedMultiplier::Normal));
    });
}

fn bench_simulation_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("simulation_tick");

    group.throughput(Throughput::Elements(2));
    group.bench_function("reference", |b| {
        b.iter_custom(|iters| {
            // Fresh state per sample so trains do not sit pinned at the ends.
            let mut sim = Simulation::reference(&paused()).unwrap();
            let start = Instant::now();
            for _ in 0..iters {
                black_box(sim.tick());
            }
            start.elapsed()
        });
    });

    group.throughput(Throughput::Elements(64));
    group.bench_function("crowded_64", |b| {
        b.iter_custom(|iters| {
            let trains = crowded_trains();
            let mut sim =
                Simulation::new(seed::reference_topology(), trains.clone(), trains, &paused()).unwrap();
            let start = Instant::now();
            for _ in 0..iters {
                black_box(sim.tick());
            }
            start.elapsed()
        });
    });

    group.finish();
}

fn bench_worker_roundtrip(c: &mut Criterion) {
    let mut group = c.benchmark_group("worker");
    group.throughput(Throughput::Elements(1));

    group.bench_function("step_and_snapshot", |b| {
        b.iter_custom(|iters| {
            let sim = TrackSimulator::reference(&paused()).unwrap();
            let start = Instant::now();
            for _ in 0..iters {
                sim.step(1).unwrap();
                black_box(sim.trains().unwrap());
            }
            let elapsed = start.elapsed();
            sim.shutdown();
            elapsed
        });
    });

    group.finish();
}

criterion_group!(tick, bench_update_single, bench_simulation_tick, bench_worker_roundtrip);
criterion_main!(tick);
