//! Criterion micro-benchmarks for stream scheduling and dispatch.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use polyplan::prelude::*;
use polyplan_bench::{random_mixture, reference_config};

/// Benchmark: schedule a 20-polymer catalog on 4 streams.
fn bench_schedule_4_streams(c: &mut Criterion) {
    let mixture = random_mixture(reference_config(true, 4).unwrap(), 20, 50).unwrap();

    c.bench_function("schedule_random_mixture_4_streams", |b| {
        b.iter(|| {
            let plan = mixture.schedule().unwrap();
            black_box(plan.makespan());
        });
    });
}

/// Benchmark: check a finished plan against its catalog.
fn bench_validate(c: &mut Criterion) {
    let mixture = random_mixture(reference_config(true, 4).unwrap(), 20, 50).unwrap();
    let plan = mixture.schedule().unwrap();

    c.bench_function("validate_random_mixture", |b| {
        b.iter(|| {
            plan.validate(black_box(mixture.catalog())).unwrap();
        });
    });
}

/// Benchmark: dispatch every job of a 4-stream plan to a no-op stepper.
fn bench_dispatch_noop(c: &mut Criterion) {
    let mixture = random_mixture(reference_config(true, 4).unwrap(), 5, 20).unwrap();
    let plan = mixture.schedule().unwrap();
    let stepper = |job: &StreamJob| {
        black_box(job.len());
        Ok::<(), String>(())
    };

    c.bench_function("dispatch_noop_4_streams", |b| {
        b.iter(|| run_plan(&plan, &stepper).unwrap());
    });
}

criterion_group!(
    benches,
    bench_schedule_4_streams,
    bench_validate,
    bench_dispatch_noop
);
criterion_main!(benches);
