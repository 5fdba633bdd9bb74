use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use pktcore::{Ring, RingConfig, SyncMode};
use std::{sync::Arc, thread};

fn benchmark_single_threaded_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("Ring_SingleThreaded");

    for capacity in [1024, 4096, 16384].iter() {
        group.throughput(Throughput::Elements(*capacity as u64));
        group.bench_with_input(
            BenchmarkId::new("enqueue_dequeue_u64", capacity),
            capacity,
            |b, &capacity| {
                let ring: Ring<u64> = Ring::new(capacity, SyncMode::Single).unwrap();

                b.iter(|| {
                    for i in 0..capacity {
                        ring.enqueue(i as u64).unwrap();
                    }
                    for _ in 0..capacity {
                        ring.dequeue().unwrap();
                    }
                });
            },
        );
    }

    group.finish();
}

fn benchmark_burst_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("Ring_Burst");
    let capacity = 4096;

    for burst in [1usize, 8, 32, 128].iter() {
        group.throughput(Throughput::Elements(capacity as u64));
        group.bench_with_input(BenchmarkId::new("burst", burst), burst, |b, &burst| {
            let ring: Ring<u64> = Ring::new(capacity, SyncMode::Single).unwrap();
            let items: Vec<u64> = (0..burst as u64).collect();
            let mut out = vec![0u64; burst];

            b.iter(|| {
                let mut moved = 0;
                while moved < capacity {
                    ring.enqueue_burst(&items);
                    moved += ring.dequeue_burst(&mut out).count;
                }
            });
        });
    }

    group.finish();
}

fn benchmark_single_vs_multi_mode(c: &mut Criterion) {
    let mut group = c.benchmark_group("Ring_SyncMode");
    let capacity = 1024;
    group.throughput(Throughput::Elements(capacity as u64));

    for (label, mode) in [("single", SyncMode::Single), ("multi", SyncMode::Multi)] {
        group.bench_function(label, |b| {
            let ring: Ring<u64> =
                Ring::with_config(RingConfig::new(label).with_capacity(capacity).with_mode(mode))
                    .unwrap();
            let items: Vec<u64> = (0..32).collect();
            let mut out = [0u64; 32];

            b.iter(|| {
                for _ in 0..capacity / 32 {
                    ring.enqueue_bulk(&items).unwrap();
                }
                for _ in 0..capacity / 32 {
                    ring.dequeue_bulk(&mut out).unwrap();
                }
            });
        });
    }

    group.finish();
}

fn benchmark_contention_scenarios(c: &mut Criterion) {
    let mut group = c.benchmark_group("Ring_Contention");
    let batch = 10_000u64;
    group.throughput(Throughput::Elements(batch));

    for producers in [1usize, 2, 4].iter() {
        group.bench_with_input(
            BenchmarkId::new("mp_producers", producers),
            producers,
            |b, &producers| {
                let ring: Arc<Ring<u64>> = Arc::new(
                    Ring::with_config(
                        RingConfig::new("contention")
                            .with_capacity(1024)
                            .with_producer(SyncMode::Multi)
                            .with_consumer(SyncMode::Single),
                    )
                    .unwrap(),
                );

                b.iter(|| {
                    let per_producer = batch / producers as u64;
                    let handles: Vec<_> = (0..producers)
                        .map(|_| {
                            let ring = Arc::clone(&ring);
                            thread::spawn(move || {
                                for i in 0..per_producer {
                                    while ring.enqueue(i).is_err() {
                                        thread::yield_now();
                                    }
                                }
                            })
                        })
                        .collect();

                    let mut received = 0u64;
                    let mut out = [0u64; 64];
                    while received < per_producer * producers as u64 {
                        received += ring.dequeue_burst(&mut out).count as u64;
                    }

                    for handle in handles {
                        handle.join().unwrap();
                    }
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_single_threaded_throughput,
    benchmark_burst_sizes,
    benchmark_single_vs_multi_mode,
    benchmark_contention_scenarios
);
criterion_main!(benches);
