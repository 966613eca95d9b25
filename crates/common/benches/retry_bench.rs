//! Retry primitive benchmarks
//!
//! Benchmarks for backoff delay calculation and policy decisions, the two
//! hot paths consulted between transport attempts.
//!
//! Run with: `cargo bench --bench retry_bench -p folio-common`

use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use folio_common::retry::policies::PredicateRetry;
use folio_common::{BackoffStrategy, RetryOptions, RetryPolicy};

fn bench_backoff_calculation(c: &mut Criterion) {
    let mut group = c.benchmark_group("backoff_calculation");

    let strategies = [
        ("fixed", BackoffStrategy::Fixed(Duration::from_millis(100))),
        (
            "linear",
            BackoffStrategy::Linear {
                initial_delay: Duration::from_millis(100),
                increment: Duration::from_millis(50),
            },
        ),
        (
            "exponential",
            BackoffStrategy::Exponential {
                initial_delay: Duration::from_millis(100),
                base: 2.0,
                max_delay: Duration::from_secs(30),
            },
        ),
    ];

    for (name, strategy) in strategies {
        group.bench_with_input(BenchmarkId::from_parameter(name), &strategy, |b, strategy| {
            b.iter(|| {
                for attempt in 0..8u32 {
                    black_box(strategy.calculate_delay(black_box(attempt)));
                }
            });
        });
    }

    group.finish();
}

fn bench_policy_decisions(c: &mut Criterion) {
    let mut group = c.benchmark_group("policy_decisions");

    group.bench_function("predicate_retry", |b| {
        let policy = PredicateRetry::new(|error: &u16, _attempt| {
            matches!(error, 500 | 502 | 503 | 504)
        });
        b.iter(|| {
            for status in [200u16, 404, 500, 503] {
                black_box(policy.should_retry(black_box(&status), 0));
            }
        });
    });

    group.bench_function("options_delay_schedule", |b| {
        let options = RetryOptions::default();
        b.iter(|| {
            for attempt in 0..options.attempts() {
                black_box(options.delay_for(black_box(attempt)));
            }
        });
    });

    group.finish();
}

criterion_group!(benches, bench_backoff_calculation, bench_policy_decisions);
criterion_main!(benches);
