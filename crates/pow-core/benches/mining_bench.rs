//! Mining performance benchmarks
//!
//! Measures hashing throughput of the header encoder and compares the
//! sequential and multithreaded searches.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use pow_core::{derive_target, mine, HeaderEncoder, HeaderFields, MiningConfig, ParallelMiner};

fn bench_header() -> HeaderFields {
    HeaderFields::new([0x11; 32], [0x22; 32], 1_700_000_000, 12)
}

fn bench_encode_and_hash(c: &mut Criterion) {
    let header = bench_header();
    let mut group = c.benchmark_group("header_hashing");
    group.throughput(Throughput::Elements(1));

    group.bench_function("encode_fresh", |b| {
        b.iter(|| header.hash(black_box(42)))
    });

    group.bench_function("encoder_reused", |b| {
        let mut encoder = HeaderEncoder::new(&header);
        b.iter(|| encoder.hash(black_box(42)))
    });

    group.finish();
}

fn bench_mining(c: &mut Criterion) {
    let header = bench_header();
    let target = derive_target(header.difficulty).unwrap();
    let mut group = c.benchmark_group("mining");
    group.sample_size(10);

    group.bench_function("sequential", |b| {
        b.iter(|| mine(black_box(&header), &target, 10_000_000).unwrap())
    });

    for workers in [2usize, 4, 8] {
        let config = MiningConfig::default()
            .with_workers(workers)
            .with_max_nonce(10_000_000);
        let miner = ParallelMiner::new(config).unwrap();
        group.bench_with_input(BenchmarkId::new("parallel", workers), &miner, |b, miner| {
            b.iter(|| miner.mine(black_box(&header), &target).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_encode_and_hash, bench_mining);
criterion_main!(benches);
