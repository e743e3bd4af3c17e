//! Benchmarks for the coalescing operator.
//!
//! Run with: cargo bench -p rxsched-runtime --bench coalesce_bench

use std::cell::Cell;
use std::hint::black_box;
use std::rc::Rc;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use rxsched_core::{ClockSource, MicrotaskQueue};
use rxsched_runtime::{
    CoalesceConfig, ScopeKey, Subject, coalesce, coalesce_by, unpatched_duration_selector,
};

fn bench_single_scope_burst(c: &mut Criterion) {
    let mut group = c.benchmark_group("coalesce/single_scope");
    for burst in [1usize, 16, 256] {
        group.bench_with_input(BenchmarkId::from_parameter(burst), &burst, |b, &burst| {
            let queue = MicrotaskQueue::new();
            let clock = ClockSource::new(Rc::new(queue.clone()));
            let op = coalesce(
                unpatched_duration_selector(&clock),
                CoalesceConfig::new(ScopeKey::from_raw(1)),
            );
            let subject = Subject::new();
            let emitted = Rc::new(Cell::new(0u64));
            let e = Rc::clone(&emitted);
            let _sub = subject
                .as_stream()
                .pipe(&op)
                .subscribe_next(move |v: usize| e.set(e.get() + v as u64));

            b.iter(|| {
                for i in 0..burst {
                    subject.next(black_box(i));
                }
                queue.run_until_idle();
            });
            black_box(emitted.get());
        });
    }
    group.finish();
}

fn bench_many_scopes(c: &mut Criterion) {
    let mut group = c.benchmark_group("coalesce/many_scopes");
    for scopes in [4u64, 64] {
        group.bench_with_input(BenchmarkId::from_parameter(scopes), &scopes, |b, &scopes| {
            let queue = MicrotaskQueue::new();
            let clock = ClockSource::new(Rc::new(queue.clone()));
            let op = coalesce_by(unpatched_duration_selector(&clock), |v: &(u64, u64)| {
                ScopeKey::from_raw(v.0)
            });
            let subject = Subject::new();
            let _sub = subject.as_stream().pipe(&op).subscribe_next(|v| {
                black_box(v);
            });

            b.iter(|| {
                for round in 0..4 {
                    for scope in 0..scopes {
                        subject.next((scope, round));
                    }
                }
                queue.run_until_idle();
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_single_scope_burst, bench_many_scopes);
criterion_main!(benches);
