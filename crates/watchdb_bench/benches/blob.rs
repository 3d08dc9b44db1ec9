//! Blob protocol benchmarks.

use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;
use watchdb_bench::random_data;
use watchdb_blob::BlobDispatcher;
use watchdb_core::{DatabaseId, EffectRouter, RecordStore, StoreConfig};
use watchdb_protocol::BlobCommand;

fn insert_frame(token: u16, size: usize) -> Bytes {
    BlobCommand::Insert {
        token,
        database: DatabaseId::App.as_u8(),
        key: Bytes::from_static(b"bench-key"),
        value: Bytes::from(random_data(size)),
    }
    .encode()
    .unwrap()
}

/// Benchmark frame decoding.
fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("blob_decode");

    for size in [16, 256, 4096].iter() {
        let frame = insert_frame(1, *size);
        group.throughput(Throughput::Bytes(frame.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &frame, |b, frame| {
            b.iter(|| {
                let decoded = BlobCommand::decode_bytes(black_box(frame.clone())).unwrap();
                black_box(decoded);
            });
        });
    }
    group.finish();
}

/// Benchmark frame dispatch end to end, including the store write.
fn bench_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("blob_dispatch");

    for size in [16, 256, 4096].iter() {
        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let config = StoreConfig::default().sync_on_write(false);
            let store = Arc::new(RecordStore::open_in_memory(config).unwrap());
            let dispatcher = BlobDispatcher::new(store, Arc::new(EffectRouter::new()));
            let frame = insert_frame(7, size);

            b.iter(|| {
                let response = dispatcher.handle_bytes(black_box(frame.clone()));
                black_box(response);
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_decode, bench_dispatch);
criterion_main!(benches);
