// Canonical encoding benchmarks.
//
// Covers transaction encoding and id derivation, strict decoding of a
// signed envelope, address codec round trips, and group id computation at
// the group size limit.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use algosig::crypto::Keypair;
use algosig::identity::Address;
use algosig::transaction::{
    compute_group_id, sign_transaction, SignedTransaction, Transaction, TransactionBuilder,
    TransactionType,
};

fn payment(sender: Address, amount: u64) -> Transaction {
    TransactionBuilder::new(TransactionType::Payment)
        .sender(sender)
        .receiver(Address::new([9u8; 32]))
        .amount(amount)
        .fee(1_000)
        .first_valid(100)
        .last_valid(1_100)
        .genesis_id("testnet-v1.0")
        .genesis_hash([7u8; 32])
        .note(b"benchmark".to_vec())
        .build()
        .unwrap()
}

fn bench_encode_transaction(c: &mut Criterion) {
    let txn = payment(Address::new([1u8; 32]), 5_000_000);

    c.bench_function("encoding/transaction_to_bytes", |b| {
        b.iter(|| txn.to_bytes().unwrap());
    });
    c.bench_function("encoding/transaction_id", |b| {
        b.iter(|| txn.id().unwrap());
    });
}

fn bench_decode_signed(c: &mut Criterion) {
    let keypair = Keypair::from_seed(&[1u8; 32]);
    let bytes = sign_transaction(&payment(keypair.address(), 5_000_000), &keypair)
        .unwrap()
        .to_bytes()
        .unwrap();

    c.bench_function("encoding/signed_from_bytes", |b| {
        b.iter(|| SignedTransaction::from_bytes(&bytes).unwrap());
    });
}

fn bench_address_codec(c: &mut Criterion) {
    let address = Keypair::from_seed(&[1u8; 32]).address();
    let text = address.to_string();

    c.bench_function("address/encode", |b| {
        b.iter(|| address.encode());
    });
    c.bench_function("address/decode", |b| {
        b.iter(|| Address::decode(&text).unwrap());
    });
}

fn bench_group_id(c: &mut Criterion) {
    let mut group = c.benchmark_group("encoding/group_id");

    for size in [2usize, 8, 16] {
        let txns: Vec<Transaction> = (0..size)
            .map(|i| payment(Address::new([1u8; 32]), i as u64 + 1))
            .collect();

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &txns, |b, txns| {
            b.iter(|| compute_group_id(txns).unwrap());
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_encode_transaction,
    bench_decode_signed,
    bench_address_codec,
    bench_group_id,
);
criterion_main!(benches);
