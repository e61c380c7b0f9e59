//! Throughput Benchmark for flintkv
//!
//! Measures the storage and queue cores under various workloads.

use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use flintkv::queue::LifoStack;
use flintkv::storage::{SetCondition, Store};
use std::sync::Arc;
use std::thread;

/// Benchmark SET operations
fn bench_set(c: &mut Criterion) {
    let store = Arc::new(Store::new());

    let mut group = c.benchmark_group("set");
    group.throughput(Throughput::Elements(1));

    group.bench_function("set_small", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let key = format!("key:{i}");
            store
                .set(&key, Bytes::from("small_value"), None, SetCondition::Always)
                .unwrap();
            i += 1;
        });
    });

    group.bench_function("set_large", |b| {
        let mut i = 0u64;
        let value = Bytes::from("x".repeat(64 * 1024)); // 64KB value
        b.iter(|| {
            let key = format!("key:{i}");
            store
                .set(&key, value.clone(), None, SetCondition::Always)
                .unwrap();
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark GET operations
fn bench_get(c: &mut Criterion) {
    let store = Arc::new(Store::new());

    // Pre-populate with data
    for i in 0..100_000 {
        store
            .set(
                &format!("key:{i}"),
                Bytes::from(format!("value:{i}")),
                None,
                SetCondition::Always,
            )
            .unwrap();
    }

    let mut group = c.benchmark_group("get");
    group.throughput(Throughput::Elements(1));

    group.bench_function("get_existing", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let key = format!("key:{}", i % 100_000);
            black_box(store.get(&key));
            i += 1;
        });
    });

    group.bench_function("get_missing", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let key = format!("missing:{i}");
            black_box(store.get(&key));
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark queue push/pop without contention
fn bench_queue(c: &mut Criterion) {
    let store = Arc::new(Store::new());

    let mut group = c.benchmark_group("queue");
    group.throughput(Throughput::Elements(1));

    group.bench_function("push", |b| {
        b.iter(|| {
            store.queue_push("bench", Bytes::from("payload"));
        });
    });

    group.bench_function("push_pop", |b| {
        b.iter(|| {
            store.queue_push("bench2", Bytes::from("payload"));
            black_box(store.queue_pop("bench2").unwrap());
        });
    });

    group.finish();
}

/// Benchmark the raw stack under thread contention, where the elimination
/// fast path earns its keep.
fn bench_contended_stack(c: &mut Criterion) {
    let mut group = c.benchmark_group("contended_stack");

    for threads in [2usize, 4, 8] {
        group.throughput(Throughput::Elements((threads * 1_000) as u64));
        group.bench_function(format!("push_pop_{threads}_threads"), |b| {
            b.iter(|| {
                let stack = Arc::new(LifoStack::new());
                let mut handles = Vec::new();

                for _ in 0..threads / 2 {
                    let producer = Arc::clone(&stack);
                    handles.push(thread::spawn(move || {
                        for i in 0..2_000u64 {
                            producer.push(i);
                        }
                    }));
                    let consumer = Arc::clone(&stack);
                    handles.push(thread::spawn(move || {
                        let mut popped = 0;
                        while popped < 2_000 {
                            if consumer.pop().is_some() {
                                popped += 1;
                            }
                        }
                    }));
                }

                for handle in handles {
                    handle.join().unwrap();
                }
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_set,
    bench_get,
    bench_queue,
    bench_contended_stack
);
criterion_main!(benches);
