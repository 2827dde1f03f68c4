use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use vfhash_core::{digest_bytes, hash_device_file};
use vfhash_device::{Device, MemoryDevice, MountTable};

fn table_with(path: &str, data: Vec<u8>) -> MountTable {
    let device = Arc::new(MemoryDevice::new());
    device.insert(path, data);
    MountTable::new()
        .with("platform:/", device as Arc<dyn Device>)
        .unwrap()
}

fn bench_digest_bytes(c: &mut Criterion) {
    let data = vec![0u8; 1024 * 10]; // 10KB

    c.bench_function("digest_bytes_10kb", |b| {
        b.iter(|| digest_bytes(black_box(&data)))
    });
}

fn bench_device_hash(c: &mut Criterion) {
    let table = table_with("platform:/bench.bin", vec![7u8; 1024 * 1024]); // 1MB

    c.bench_function("device_hash_1mb_64k_chunks", |b| {
        b.iter(|| hash_device_file(&table, black_box("platform:/bench.bin"), 64 * 1024))
    });
}

fn bench_device_hash_small_chunks(c: &mut Criterion) {
    let table = table_with("platform:/bench.bin", vec![7u8; 1024 * 1024]); // 1MB

    c.bench_function("device_hash_1mb_4k_chunks", |b| {
        b.iter(|| hash_device_file(&table, black_box("platform:/bench.bin"), 4 * 1024))
    });
}

criterion_group!(
    benches,
    bench_digest_bytes,
    bench_device_hash,
    bench_device_hash_small_chunks
);
criterion_main!(benches);
