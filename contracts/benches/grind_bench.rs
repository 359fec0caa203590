// Proof-of-work benchmarks for faucet disbursements.
//
// Covers the per-attempt cost (canonical bytes + double SHA-256), the
// validator-side target check, and whole grinds at a fixed start nonce for
// pools of increasing input count.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use ccpool_contracts::grinder::{grind, meets_target};
use ccpool_contracts::FaucetRecord;
use ccpool_protocol::config::{EVAL_FAUCET, FAUCET_PAYOUT, GRIND_MAX_ATTEMPTS};
use ccpool_protocol::crypto::LedgerKeypair;
use ccpool_protocol::transaction::{OutPoint, Transaction, TransactionBuilder, TxId};
use ccpool_protocol::Address;

fn template(inputs: usize) -> Transaction {
    let payee = Address::from_public_key(&LedgerKeypair::from_seed(&[7u8; 32]).public_key());
    (0..inputs)
        .fold(TransactionBuilder::new(), |builder, i| {
            builder.contract_input(OutPoint::new(TxId::from_bytes([i as u8; 32]), 0), EVAL_FAUCET)
        })
        .pay(payee, FAUCET_PAYOUT)
        .annotation(FaucetRecord::Get { nonce: 0 }.encode())
        .build()
}

fn bench_txid(c: &mut Criterion) {
    let tx = template(1);
    c.bench_function("grind/txid", |b| {
        b.iter(|| tx.txid());
    });
}

fn bench_target_check(c: &mut Criterion) {
    let txid = template(1).txid();
    c.bench_function("grind/meets_target", |b| {
        b.iter(|| meets_target(&txid));
    });
}

fn bench_full_grind(c: &mut Criterion) {
    let mut group = c.benchmark_group("grind/full");
    group.sample_size(10);

    for inputs in [1usize, 8, 60] {
        let tx = template(inputs);
        group.throughput(Throughput::Elements(inputs as u64));
        group.bench_with_input(BenchmarkId::from_parameter(inputs), &tx, |b, tx| {
            b.iter(|| grind(tx.clone(), 0, GRIND_MAX_ATTEMPTS));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_txid, bench_target_check, bench_full_grind);
criterion_main!(benches);
