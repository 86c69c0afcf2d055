// Signing & verification benchmarks.
//
// Covers single-key transaction signing and verification, multisig
// finalize at several member counts, and logic-signature delegation.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use algosig::crypto::{sign, verify, Keypair};
use algosig::logicsig::LogicSigAuth;
use algosig::multisig::{MultisigMetadata, MultisigSignatureSet};
use algosig::transaction::{
    bytes_to_sign, sign_transaction, Transaction, TransactionBuilder, TransactionType,
};

fn payment(sender: &Keypair) -> Transaction {
    TransactionBuilder::new(TransactionType::Payment)
        .sender(sender.address())
        .receiver(Keypair::from_seed(&[2u8; 32]).address())
        .amount(5_000_000)
        .fee(1_000)
        .first_valid(100)
        .last_valid(1_100)
        .genesis_id("testnet-v1.0")
        .genesis_hash([7u8; 32])
        .build()
        .unwrap()
}

fn bench_sign_message(c: &mut Criterion) {
    let keypair = Keypair::from_seed(&[1u8; 32]);
    let message = b"TXpayment of 5 units from alice to bob";

    c.bench_function("ed25519/sign_message", |b| {
        b.iter(|| sign(&keypair, message));
    });
}

fn bench_verify_signature(c: &mut Criterion) {
    let keypair = Keypair::from_seed(&[1u8; 32]);
    let message = b"TXpayment of 5 units from alice to bob";
    let signature = sign(&keypair, message);
    let public_key = keypair.public_key();

    c.bench_function("ed25519/verify_signature", |b| {
        b.iter(|| verify(&public_key, message, &signature));
    });
}

fn bench_sign_transaction(c: &mut Criterion) {
    let keypair = Keypair::from_seed(&[1u8; 32]);
    let txn = payment(&keypair);

    c.bench_function("transaction/sign", |b| {
        b.iter(|| sign_transaction(&txn, &keypair).unwrap());
    });
}

fn bench_verify_transaction(c: &mut Criterion) {
    let keypair = Keypair::from_seed(&[1u8; 32]);
    let signed = sign_transaction(&payment(&keypair), &keypair).unwrap();

    c.bench_function("transaction/verify", |b| {
        b.iter(|| signed.verify().unwrap());
    });
}

fn bench_multisig_finalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("multisig/finalize");

    for size in [2usize, 5, 10] {
        let keys: Vec<Keypair> = (0..size)
            .map(|i| Keypair::from_seed(&[i as u8 + 1; 32]))
            .collect();
        let threshold = (size / 2 + 1) as u8;
        let metadata =
            MultisigMetadata::new(1, threshold, keys.iter().map(Keypair::public_key).collect())
                .unwrap();
        let message = bytes_to_sign(&payment(&keys[0])).unwrap();
        let set = keys
            .iter()
            .fold(MultisigSignatureSet::new(metadata), |set, kp| {
                set.sign(&message, kp).unwrap()
            });

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &set, |b, set| {
            b.iter(|| set.finalize(&message).unwrap());
        });
    }

    group.finish();
}

fn bench_logic_sig_delegation(c: &mut Criterion) {
    let keypair = Keypair::from_seed(&[1u8; 32]);
    let program = vec![0x01, 0x20, 0x01, 0x01, 0x22];

    c.bench_function("logicsig/delegate_single", |b| {
        b.iter(|| LogicSigAuth::build_delegated_single(program.clone(), &keypair).unwrap());
    });
}

criterion_group!(
    benches,
    bench_sign_message,
    bench_verify_signature,
    bench_sign_transaction,
    bench_verify_transaction,
    bench_multisig_finalize,
    bench_logic_sig_delegation,
);
criterion_main!(benches);
