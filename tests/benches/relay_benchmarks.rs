//! # Hit Relay Benchmarks
//!
//! | Path | Target |
//! |------|--------|
//! | recordHit calldata encoding | < 1µs |
//! | EIP-1559 signing (RLP + secp256k1) | < 1ms |
//! | getGlobalTopScores decoding (100 rows) | < 100µs |
//! | Identity pool acquire/release (50 identities, warm cache) | < 10µs |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use relay_core::domain::abi::{decode_top_scores, returns};
use relay_core::testing::{identity, MockLedger, MockTimeSource, MOCK_CHAIN_ID};
use relay_core::{
    Address, Eip1559Fees, FeeStrategy, HitTracker, IdentityPool, Points, RelayConfig, MAX_POINTS,
    RelayRequest, TimeSource, TopScore, TransactionRequest, U256,
};
use std::sync::Arc;

fn request() -> RelayRequest {
    RelayRequest::new(
        Address([0xaa; 20]),
        Points::new(MAX_POINTS as i128).expect("bound is valid"),
    )
}

fn bench_encoding(c: &mut Criterion) {
    let contract = HitTracker::new(Address([0x80; 20]));
    let request = request();

    c.bench_function("abi_encode_record_hit", |b| {
        b.iter(|| black_box(contract.record_hit(black_box(&request))))
    });

    let rows: Vec<TopScore> = (0..100u64)
        .map(|i| TopScore {
            player: Address([i as u8; 20]),
            score: U256::from(i),
            timestamp: U256::from(1_700_000_000 + i),
        })
        .collect();
    let encoded = returns::top_scores(&rows);
    c.bench_function("abi_decode_top_scores_100", |b| {
        b.iter(|| black_box(decode_top_scores(black_box(&encoded))))
    });
}

fn bench_signing(c: &mut Criterion) {
    let signer = identity(7);
    let call = HitTracker::new(Address([0x80; 20])).record_hit(&request());
    let tx = TransactionRequest {
        to: call.to,
        data: call.data,
        nonce: 42,
        gas_limit: 120_000,
        fees: FeeStrategy::Dynamic(Eip1559Fees {
            max_fee_per_gas: U256::from(30_000_000_000u64),
            max_priority_fee_per_gas: U256::from(1_000_000_000u64),
        }),
    };

    c.bench_function("sign_eip1559_record_hit", |b| {
        b.iter(|| black_box(tx.sign(MOCK_CHAIN_ID, &signer)))
    });
}

fn bench_pool(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .expect("runtime");
    let mut group = c.benchmark_group("identity_pool");

    for size in [1u8, 10, 50] {
        let ledger = Arc::new(MockLedger::new());
        let clock: Arc<dyn TimeSource> = Arc::new(MockTimeSource::new(0));
        let pool = IdentityPool::new(
            (1..=size).map(identity).collect(),
            ledger,
            clock,
            &RelayConfig::default(),
        );
        // Warm the balance cache.
        runtime.block_on(async {
            for _ in 0..size {
                drop(pool.acquire().await);
            }
        });

        group.bench_with_input(BenchmarkId::new("acquire_release", size), &pool, |b, pool| {
            b.iter(|| runtime.block_on(async { black_box(pool.acquire().await) }))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_encoding, bench_signing, bench_pool);
criterion_main!(benches);
