// ─────────────────────────────────────────────────────────────────────
// SCPN Plasma Guard — Control Step Benchmark
// © 1998–2026 Miroslav Šotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────

use criterion::{criterion_group, criterion_main, Criterion};
use plasma_control::scenario::{ReferenceScenario, ShotController};
use plasma_control::shot::run_shot;
use plasma_control::system::PlasmaControlSystem;
use plasma_types::config::MachineConfig;
use plasma_types::state::ControlActuators;
use std::hint::black_box;

fn bench_control_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("control_step");
    let cfg = MachineConfig::default();

    group.bench_function("idle_single_step", |b| {
        b.iter_batched(
            || PlasmaControlSystem::new(cfg.clone()).expect("valid config"),
            |mut system| {
                let idle = ControlActuators::idle(&system.config().actuators);
                let report = system.step(&idle, 1e-4).expect("step should succeed");
                black_box(report.state.mhd_activity_level);
            },
            criterion::BatchSize::SmallInput,
        )
    });

    group.bench_function("reference_1000_steps", |b| {
        b.iter_batched(
            || {
                (
                    PlasmaControlSystem::new(cfg.clone()).expect("valid config"),
                    ReferenceScenario::new(&cfg).expect("valid scenario"),
                )
            },
            |(mut system, mut controller)| {
                for _ in 0..1000 {
                    let act = controller.actuate(&system.context(), 1e-4);
                    system.step(&act, 1e-4).expect("step should succeed");
                }
                black_box(system.state().plasma_current);
            },
            criterion::BatchSize::SmallInput,
        )
    });

    group.bench_function("reference_shot_1s", |b| {
        b.iter_batched(
            || {
                (
                    PlasmaControlSystem::new(cfg.clone()).expect("valid config"),
                    ReferenceScenario::new(&cfg).expect("valid scenario"),
                )
            },
            |(mut system, mut controller)| {
                let report =
                    run_shot(&mut system, 1.0, 1e-3, &mut controller).expect("shot should run");
                black_box(report.steps);
            },
            criterion::BatchSize::SmallInput,
        )
    });

    group.finish();
}

criterion_group!(benches, bench_control_step);
criterion_main!(benches);
