//! # BESS-PAS Benchmarks
//!
//! | Group | Operation |
//! |-------|-----------|
//! | pas-01 | Auth hash generation and constant-time check |
//! | pas-03 | Entry hashing, append, full chain verification |
//! | pas-04 | Batch creation (units, QR labels, Manufactured entries) |
//! | pas-05 | Public verification of a QR payload |

use criterion::{
    black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput,
};
use std::time::Duration;

use pas_01_serial_generator::{SerialGenerator, SerialGeneratorApi};
use pas_03_ledger_chain::{compute_entry_hash, LedgerChainApi};
use pas_05_verification::{ScanContext, VerificationApi};
use pas_tests::fixtures::{qr_payload, shop, Stack, TEST_SECRET};
use shared_crypto::AuthSecret;
use shared_types::{ItemId, LedgerAction};

// ============================================================================
// PAS-01: Serial authentication
// ============================================================================

fn bench_auth_hash(c: &mut Criterion) {
    let mut group = c.benchmark_group("pas-01-auth-hash");
    let generator = SerialGenerator::new(AuthSecret::from_bytes(TEST_SECRET));
    let serial = "BATCH-20260112-0001-0001";
    let nonce = "9f".repeat(16);
    let hash = generator.derive_auth_hash(serial, &nonce).unwrap();

    group.bench_function("generate", |b| {
        b.iter(|| black_box(generator.derive_auth_hash(black_box(serial), &nonce).unwrap()))
    });
    group.bench_function("verify", |b| {
        b.iter(|| black_box(generator.verify_auth_hash(serial, &nonce, black_box(&hash))))
    });
    group.finish();
}

// ============================================================================
// PAS-03: Ledger chain
// ============================================================================

/// A unit whose chain holds `length` entries.
fn chain_of(stack: &Stack, length: usize) -> ItemId {
    let product = stack.register_product("Bench Product");
    let summary = stack.create_batch(product, 1);
    let item_id = stack.units(summary.batch_id)[0].item_id;
    for _ in 1..length {
        stack
            .ledger
            .append(&shop(), item_id, LedgerAction::Stored, "Aisle 1")
            .unwrap();
    }
    item_id
}

fn bench_ledger(c: &mut Criterion) {
    let mut group = c.benchmark_group("pas-03-ledger");
    group.measurement_time(Duration::from_secs(5));

    let stack = Stack::in_memory();
    let item_id = chain_of(&stack, 1);
    let entry = stack.ledger.entries(item_id).unwrap().remove(0);
    group.bench_function("entry_hash", |b| {
        b.iter(|| black_box(compute_entry_hash(black_box(&entry))))
    });

    group.bench_function("append", |b| {
        b.iter(|| {
            stack
                .ledger
                .append(&shop(), item_id, LedgerAction::Stored, "Aisle 1")
                .unwrap()
        })
    });

    for length in [10usize, 100, 1_000] {
        let stack = Stack::in_memory();
        let item_id = chain_of(&stack, length);
        group.throughput(Throughput::Elements(length as u64));
        group.bench_with_input(BenchmarkId::new("verify_chain", length), &item_id, |b, id| {
            b.iter(|| {
                let result = stack.ledger.verify_chain(*id).unwrap();
                assert!(result.valid);
                black_box(result)
            })
        });
    }
    group.finish();
}

// ============================================================================
// PAS-04: Batch creation
// ============================================================================

fn bench_batch_creation(c: &mut Criterion) {
    let mut group = c.benchmark_group("pas-04-create-batch");
    group.sample_size(10);
    group.measurement_time(Duration::from_secs(10));

    for quantity in [10u32, 100] {
        group.throughput(Throughput::Elements(u64::from(quantity)));
        group.bench_with_input(BenchmarkId::from_parameter(quantity), &quantity, |b, &qty| {
            // A fresh stack per batch keeps the daily counter from running out.
            b.iter_batched(
                || {
                    let stack = Stack::in_memory();
                    let product = stack.register_product("Bench Product");
                    (stack, product)
                },
                |(stack, product)| black_box(stack.create_batch(product, qty)),
                BatchSize::PerIteration,
            )
        });
    }
    group.finish();
}

// ============================================================================
// PAS-05: Verification
// ============================================================================

fn bench_verification(c: &mut Criterion) {
    let mut group = c.benchmark_group("pas-05-verify");

    let stack = Stack::in_memory();
    let product = stack.register_product("Bench Product");
    let summary = stack.create_batch(product, 10);
    let payload = qr_payload(&stack.units(summary.batch_id)[3]);
    let context = ScanContext::anonymous(None);

    group.bench_function("unit_qr_payload", |b| {
        b.iter(|| {
            let report = stack.verification.verify(black_box(&payload), None, &context);
            assert!(report.verified);
            black_box(report)
        })
    });
    group.bench_function("batch_code", |b| {
        b.iter(|| black_box(stack.verification.verify(&summary.batch_number, None, &context)))
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_auth_hash,
    bench_ledger,
    bench_batch_creation,
    bench_verification,
);
criterion_main!(benches);
