use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;
use std::thread;
use tracing::Level;
use tracing_chat_alert::{FingerprintKey, LogRecord, MdcKeys, ThrottleFilter};

fn record(req: usize) -> LogRecord {
    LogRecord::new(Level::ERROR, "bench::handler", "request failed")
        .with_property("tenant", "acme")
        .with_property("route", "/checkout")
        .with_property("req", format!("r{}", req))
}

/// Benchmark fingerprint extraction
fn bench_fingerprint(c: &mut Criterion) {
    let mut group = c.benchmark_group("fingerprint");
    let record = record(7);

    for keys in ["", "tenant", "tenant,route,req"] {
        let mdc_keys = MdcKeys::parse(keys);
        group.bench_with_input(BenchmarkId::from_parameter(mdc_keys.len()), &mdc_keys, |b, keys| {
            b.iter(|| FingerprintKey::of(black_box(&record), keys))
        });
    }

    group.finish();
}

/// Benchmark single-threaded decisions, duplicate-heavy and unique-heavy
fn bench_decide(c: &mut Criterion) {
    let mut group = c.benchmark_group("decide");
    group.throughput(Throughput::Elements(1));

    let duplicates = ThrottleFilter::builder().with_mdc_keys("tenant").build();
    let duplicate = record(0);
    group.bench_function("duplicate", |b| {
        b.iter(|| duplicates.decide(black_box(&duplicate)))
    });

    let unique = ThrottleFilter::builder()
        .with_mdc_keys("req")
        .with_removal_threshold(10_000)
        .build();
    let records: Vec<_> = (0..10_000).map(record).collect();
    let mut next = 0;
    group.bench_function("unique_with_sweeps", |b| {
        b.iter(|| {
            next = (next + 1) % records.len();
            unique.decide(black_box(&records[next]))
        })
    });

    let warn = LogRecord::new(Level::WARN, "bench::handler", "slow request");
    group.bench_function("non_error", |b| b.iter(|| duplicates.decide(black_box(&warn))));

    group.finish();
}

/// Benchmark concurrent decisions
fn bench_concurrent(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent");

    for threads in [2, 4, 8] {
        group.throughput(Throughput::Elements(threads as u64 * 1_000));
        group.bench_with_input(BenchmarkId::from_parameter(threads), &threads, |b, &threads| {
            let filter = Arc::new(ThrottleFilter::builder().with_mdc_keys("req").build());
            b.iter(|| {
                let handles: Vec<_> = (0..threads)
                    .map(|t| {
                        let filter = Arc::clone(&filter);
                        thread::spawn(move || {
                            for i in 0..1_000 {
                                black_box(filter.decide(&record(t * 1_000 + i)));
                            }
                        })
                    })
                    .collect();
                for handle in handles {
                    handle.join().unwrap();
                }
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_fingerprint, bench_decide, bench_concurrent);
criterion_main!(benches);
