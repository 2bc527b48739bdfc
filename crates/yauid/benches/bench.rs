use core::hint::black_box;
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use std::{
    sync::{
        Arc, Barrier,
        atomic::{AtomicU64, Ordering},
    },
    thread::scope,
    time::Instant,
};
use yauid::{Generator, Key, SharedGenerator, TimeSource, compute_range_by_timestamp};

const TS: u64 = 1_405_124_592;

// Keys generated per benchmark iteration (in total for multi-threaded).
const TOTAL_KEYS: usize = 4096;

/// Moves forward one second per iteration so a second never runs out of
/// sequence numbers.
#[derive(Clone)]
struct SteppedMockTime {
    secs: Arc<AtomicU64>,
}

impl SteppedMockTime {
    fn new() -> Self {
        Self {
            secs: Arc::new(AtomicU64::new(TS)),
        }
    }

    fn step(&self) {
        self.secs.fetch_add(1, Ordering::Relaxed);
    }
}

impl TimeSource for SteppedMockTime {
    fn current_secs(&self) -> u64 {
        self.secs.load(Ordering::Relaxed)
    }
}

fn benchmark_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec");
    group.throughput(Throughput::Elements(1));

    group.bench_function("from_components", |b| {
        b.iter(|| Key::from_components(black_box(TS), black_box(12), black_box(77)));
    });
    group.bench_function("decode", |b| {
        let key = Key::from_components(TS, 12, 77);
        b.iter(|| {
            let key = black_box(key);
            (key.timestamp(), key.node_id(), key.sequence())
        });
    });
    group.bench_function("range", |b| {
        b.iter(|| compute_range_by_timestamp(black_box(TS), Some(TS + 60), Some(1), None));
    });

    group.finish();
}

fn benchmark_sequential(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let time = SteppedMockTime::new();
    let mut generator = Generator::open_with_time(dir.path().join("key"), None, time.clone())
        .unwrap()
        .with_node_id(12)
        .unwrap();

    let mut group = c.benchmark_group("file/sequential");
    group.throughput(Throughput::Elements(TOTAL_KEYS as u64));
    group.bench_function(format!("elems/{TOTAL_KEYS}"), |b| {
        b.iter_custom(|iters| {
            let start = Instant::now();
            for _ in 0..iters {
                time.step();
                for _ in 0..TOTAL_KEYS {
                    black_box(generator.get_key_once().unwrap());
                }
            }
            start.elapsed()
        });
    });
    group.finish();
}

fn benchmark_contended(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("key");
    let time = SteppedMockTime::new();
    let shared = SharedGenerator::new(
        Generator::open_with_time(&path, None, time.clone())
            .unwrap()
            .with_node_id(12)
            .unwrap(),
    );

    let mut group = c.benchmark_group("file/contended");
    for thread_count in [1, 2, 4, 8] {
        let keys_per_thread = TOTAL_KEYS / thread_count;
        group.throughput(Throughput::Elements(TOTAL_KEYS as u64));

        // One handle (and file description) per thread.
        group.bench_function(format!("independent/threads/{thread_count}"), |b| {
            let mut generators: Vec<_> = (0..thread_count)
                .map(|_| {
                    Generator::open_with_time(&path, None, time.clone())
                        .unwrap()
                        .with_node_id(12)
                        .unwrap()
                })
                .collect();
            b.iter_custom(|iters| {
                let start = Instant::now();
                for _ in 0..iters {
                    time.step();
                    let barrier = Barrier::new(thread_count);
                    scope(|s| {
                        for generator in &mut generators {
                            let barrier = &barrier;
                            s.spawn(move || {
                                barrier.wait();
                                for _ in 0..keys_per_thread {
                                    black_box(generator.get_key_once().unwrap());
                                }
                            });
                        }
                    });
                }
                start.elapsed()
            });
        });

        // One handle behind a mutex.
        group.bench_function(format!("shared/threads/{thread_count}"), |b| {
            b.iter_custom(|iters| {
                let start = Instant::now();
                for _ in 0..iters {
                    time.step();
                    let barrier = Barrier::new(thread_count);
                    scope(|s| {
                        for _ in 0..thread_count {
                            let shared = shared.clone();
                            let barrier = &barrier;
                            s.spawn(move || {
                                barrier.wait();
                                for _ in 0..keys_per_thread {
                                    black_box(shared.get_key_once().unwrap());
                                }
                            });
                        }
                    });
                }
                start.elapsed()
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    benchmark_codec,
    benchmark_sequential,
    benchmark_contended
);
criterion_main!(benches);
