//! # Proof-of-Work and Crypto Benchmarks
//!
//! ```bash
//! cargo bench --package bm-tests --bench pow_benchmarks
//! cargo bench --package bm-tests --bench pow_benchmarks -- pow/trial
//! ```
//!
//! | Group | Measures |
//! |-------|----------|
//! | pow | initial hash, single trial, full solve at easy difficulty |
//! | ecies | encrypt and decrypt of typical msg plaintexts |
//! | address | encode and parse of a v4 address |

use bm_01_address::NetworkAddress;
use bm_02_pow::{initial_hash, trial_value, PowConfig, PowEngine, PowParameters};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::Rng;
use shared_crypto::{decrypt, encrypt, KeyPair};
use std::time::Duration;

const NOW: u64 = 1_700_000_000;

fn random_bytes(len: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..len).map(|_| rng.gen()).collect()
}

fn bench_pow(c: &mut Criterion) {
    let mut group = c.benchmark_group("pow");

    for size in [256usize, 4096, 65_536] {
        let payload = random_bytes(size);
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("initial_hash", size), &payload, |b, p| {
            b.iter(|| initial_hash(black_box(p)))
        });
    }

    let hash = initial_hash(&random_bytes(512));
    group.throughput(Throughput::Elements(1));
    group.bench_function("trial", |b| {
        let mut nonce = 0u64;
        b.iter(|| {
            nonce = nonce.wrapping_add(1);
            trial_value(black_box(nonce), &hash)
        })
    });

    group.measurement_time(Duration::from_secs(10));
    for threads in [1usize, 4] {
        let engine = PowEngine::new(PowConfig {
            threads,
            ..PowConfig::default()
        });
        let payload = random_bytes(300);
        group.bench_with_input(BenchmarkId::new("solve_easy", threads), &payload, |b, p| {
            b.iter(|| {
                engine
                    .solve(black_box(p), NOW + 3600, PowParameters::new(10, 100), NOW)
                    .unwrap()
            })
        });
    }

    group.finish();
}

fn bench_ecies(c: &mut Criterion) {
    let mut group = c.benchmark_group("ecies");
    let keys = KeyPair::generate();

    for size in [128usize, 2048, 16_384] {
        let plaintext = random_bytes(size);
        let ciphertext = encrypt(keys.public_key(), &plaintext).unwrap();
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("encrypt", size), &plaintext, |b, p| {
            b.iter(|| encrypt(keys.public_key(), black_box(p)).unwrap())
        });
        group.bench_with_input(BenchmarkId::new("decrypt", size), &ciphertext, |b, ct| {
            b.iter(|| decrypt(keys.private_key(), black_box(ct)).unwrap())
        });
    }

    group.finish();
}

fn bench_address(c: &mut Criterion) {
    let mut group = c.benchmark_group("address");
    let mut ripe = [0u8; 20];
    ripe[2..].copy_from_slice(&random_bytes(18));
    let address = NetworkAddress::new(4, 1, ripe).unwrap();
    let encoded = address.encode();

    group.bench_function("encode", |b| b.iter(|| black_box(&address).encode()));
    group.bench_function("parse", |b| {
        b.iter(|| NetworkAddress::parse(black_box(&encoded)).unwrap())
    });
    group.finish();
}

criterion_group!(benches, bench_pow, bench_ecies, bench_address);
criterion_main!(benches);
