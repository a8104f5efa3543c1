//! In-memory test doubles for the outbound ports.
//!
//! `MockLedger` behaves like a tiny HitTracker deployment: submitted
//! `recordHit` calls update the scoreboard, `addAuthorizedRelayer` calls
//! update the authorized set, and view calls are answered from that state.

use crate::domain::abi::{functions, returns, selector};
use crate::domain::{
    Address, CallRequest, Eip1559Fees, LedgerError, Receipt, SigningIdentity, Timestamp,
    TopScore, TransactionRequest, TxHash, U256,
};
use crate::ports::{LedgerClient, TimeSource};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Chain id the mock signs with.
pub const MOCK_CHAIN_ID: u64 = 31_337;

/// Deterministic identity for tests. `n` must be non-zero.
pub fn identity(n: u8) -> SigningIdentity {
    let mut key = [0u8; 32];
    key[0] = 0x11;
    key[31] = n;
    SigningIdentity::from_bytes(&key).expect("test key is a valid scalar")
}

/// One transaction accepted by [`MockLedger::submit`].
#[derive(Clone, Debug)]
pub struct Submission {
    pub signer: Address,
    pub tx: TransactionRequest,
    pub hash: TxHash,
}

struct MockState {
    balances: HashMap<Address, Result<U256, LedgerError>>,
    default_balance: U256,
    balance_calls: HashMap<Address, usize>,
    nonces: HashMap<Address, u64>,
    nonce_error: Option<LedgerError>,
    gas_estimate: Result<u64, LedgerError>,
    fees: Result<Option<Eip1559Fees>, LedgerError>,
    gas_price: Result<U256, LedgerError>,
    submit_failures: HashMap<Address, LedgerError>,
    reverting: HashSet<Address>,
    submissions: Vec<Submission>,
    submit_attempts: usize,
    receipts: HashMap<TxHash, (Address, bool)>,
    confirmation_delay: Duration,
    signer_delays: HashMap<Address, Duration>,
    confirmation_error: Option<LedgerError>,
    in_flight: HashSet<Address>,
    overlaps: usize,
    authorized: HashSet<Address>,
    total_hits: U256,
    scores: HashMap<Address, U256>,
    hits: HashMap<Address, Vec<U256>>,
    top_scores: Vec<TopScore>,
    call_error: Option<LedgerError>,
}

/// Scriptable in-memory ledger.
pub struct MockLedger {
    state: Mutex<MockState>,
}

impl Default for MockLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl MockLedger {
    /// Every address starts with 1 native unit and nonce 0.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                balances: HashMap::new(),
                default_balance: U256::exp10(18),
                balance_calls: HashMap::new(),
                nonces: HashMap::new(),
                nonce_error: None,
                gas_estimate: Ok(100_000),
                fees: Ok(Some(Eip1559Fees {
                    max_fee_per_gas: U256::from(30_000_000_000u64),
                    max_priority_fee_per_gas: U256::from(1_000_000_000u64),
                })),
                gas_price: Ok(U256::from(20_000_000_000u64)),
                submit_failures: HashMap::new(),
                reverting: HashSet::new(),
                submissions: Vec::new(),
                submit_attempts: 0,
                receipts: HashMap::new(),
                confirmation_delay: Duration::ZERO,
                signer_delays: HashMap::new(),
                confirmation_error: None,
                in_flight: HashSet::new(),
                overlaps: 0,
                authorized: HashSet::new(),
                total_hits: U256::zero(),
                scores: HashMap::new(),
                hits: HashMap::new(),
                top_scores: Vec::new(),
                call_error: None,
            }),
        }
    }

    pub fn set_balance(&self, address: Address, balance: U256) {
        self.state.lock().balances.insert(address, Ok(balance));
    }

    pub fn fail_balance(&self, address: Address, error: LedgerError) {
        self.state.lock().balances.insert(address, Err(error));
    }

    /// Number of balance queries made for `address`.
    pub fn balance_calls(&self, address: &Address) -> usize {
        self.state
            .lock()
            .balance_calls
            .get(address)
            .copied()
            .unwrap_or(0)
    }

    pub fn set_nonce(&self, address: Address, nonce: u64) {
        self.state.lock().nonces.insert(address, nonce);
    }

    pub fn fail_nonce(&self, error: LedgerError) {
        self.state.lock().nonce_error = Some(error);
    }

    pub fn set_gas_estimate(&self, estimate: Result<u64, LedgerError>) {
        self.state.lock().gas_estimate = estimate;
    }

    pub fn set_fees(&self, fees: Result<Option<Eip1559Fees>, LedgerError>) {
        self.state.lock().fees = fees;
    }

    pub fn set_gas_price(&self, price: Result<U256, LedgerError>) {
        self.state.lock().gas_price = price;
    }

    /// Every submission signed by `address` fails with `error`.
    pub fn fail_submissions_from(&self, address: Address, error: LedgerError) {
        self.state.lock().submit_failures.insert(address, error);
    }

    pub fn clear_submission_failures(&self) {
        self.state.lock().submit_failures.clear();
    }

    /// Transactions signed by `address` are included but revert.
    pub fn revert_from(&self, address: Address) {
        self.state.lock().reverting.insert(address);
    }

    pub fn set_confirmation_delay(&self, delay: Duration) {
        self.state.lock().confirmation_delay = delay;
    }

    /// Extra confirmation delay for transactions signed by `address`.
    pub fn set_confirmation_delay_for(&self, address: Address, delay: Duration) {
        self.state.lock().signer_delays.insert(address, delay);
    }

    pub fn fail_confirmations(&self, error: LedgerError) {
        self.state.lock().confirmation_error = Some(error);
    }

    pub fn fail_calls(&self, error: LedgerError) {
        self.state.lock().call_error = Some(error);
    }

    pub fn authorize(&self, address: Address) {
        self.state.lock().authorized.insert(address);
    }

    pub fn is_authorized(&self, address: &Address) -> bool {
        self.state.lock().authorized.contains(address)
    }

    pub fn set_top_scores(&self, rows: Vec<TopScore>) {
        self.state.lock().top_scores = rows;
    }

    pub fn submissions(&self) -> Vec<Submission> {
        self.state.lock().submissions.clone()
    }

    pub fn submission_count(&self) -> usize {
        self.state.lock().submissions.len()
    }

    /// Every call to `submit`, including rejected ones.
    pub fn submit_attempts(&self) -> usize {
        self.state.lock().submit_attempts
    }

    /// Submissions that happened while the same signer still had one in flight.
    pub fn overlapping_submissions(&self) -> usize {
        self.state.lock().overlaps
    }

    pub fn total_hits(&self) -> U256 {
        self.state.lock().total_hits
    }

    fn apply(state: &mut MockState, tx: &TransactionRequest) {
        if tx.data.len() < 4 {
            return;
        }
        let (sel, args) = tx.data.split_at(4);
        if sel == selector(functions::RECORD_HIT) && args.len() >= 64 {
            let player = address_arg(args);
            let points = U256::from_big_endian(&args[32..64]);
            state.total_hits = state.total_hits + U256::one();
            let score = state.scores.entry(player).or_insert_with(U256::zero);
            *score = *score + points;
            state.hits.entry(player).or_default().push(points);
        } else if sel == selector(functions::ADD_AUTHORIZED_RELAYER) && args.len() >= 32 {
            state.authorized.insert(address_arg(args));
        }
    }
}

fn address_arg(args: &[u8]) -> Address {
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&args[12..32]);
    Address(bytes)
}

/// Clears the in-flight mark when confirmation ends, including on timeout.
struct InFlightGuard<'a> {
    state: &'a Mutex<MockState>,
    signer: Option<Address>,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if let Some(signer) = self.signer {
            self.state.lock().in_flight.remove(&signer);
        }
    }
}

#[async_trait]
impl LedgerClient for MockLedger {
    async fn get_balance(&self, address: &Address) -> Result<U256, LedgerError> {
        let mut state = self.state.lock();
        *state.balance_calls.entry(*address).or_insert(0) += 1;
        match state.balances.get(address) {
            Some(result) => result.clone(),
            None => Ok(state.default_balance),
        }
    }

    async fn get_pending_nonce(&self, address: &Address) -> Result<u64, LedgerError> {
        let state = self.state.lock();
        if let Some(err) = &state.nonce_error {
            return Err(err.clone());
        }
        Ok(state.nonces.get(address).copied().unwrap_or(0))
    }

    async fn estimate_gas(&self, _call: &CallRequest) -> Result<u64, LedgerError> {
        self.state.lock().gas_estimate.clone()
    }

    async fn estimate_fees(&self) -> Result<Option<Eip1559Fees>, LedgerError> {
        self.state.lock().fees.clone()
    }

    async fn gas_price(&self) -> Result<U256, LedgerError> {
        self.state.lock().gas_price.clone()
    }

    async fn submit(
        &self,
        signer: &SigningIdentity,
        tx: TransactionRequest,
    ) -> Result<TxHash, LedgerError> {
        let from = signer.address();
        let signed = tx.sign(MOCK_CHAIN_ID, signer)?;

        let mut state = self.state.lock();
        state.submit_attempts += 1;
        if !state.in_flight.insert(from) {
            state.overlaps += 1;
        }
        if let Some(err) = state.submit_failures.get(&from).cloned() {
            state.in_flight.remove(&from);
            return Err(err);
        }

        let success = !state.reverting.contains(&from);
        if success {
            Self::apply(&mut state, &tx);
        }
        state.nonces.insert(from, tx.nonce + 1);
        state.receipts.insert(signed.hash, (from, success));
        state.submissions.push(Submission {
            signer: from,
            tx,
            hash: signed.hash,
        });
        Ok(signed.hash)
    }

    async fn wait_for_confirmation(&self, hash: &TxHash) -> Result<Receipt, LedgerError> {
        let (signer, success, delay, error) = {
            let state = self.state.lock();
            let (signer, success) = state
                .receipts
                .get(hash)
                .copied()
                .ok_or_else(|| LedgerError::MissingResult(format!("receipt {hash}")))?;
            (
                signer,
                success,
                state.confirmation_delay
                    + state.signer_delays.get(&signer).copied().unwrap_or_default(),
                state.confirmation_error.clone(),
            )
        };
        let _guard = InFlightGuard {
            state: &self.state,
            signer: Some(signer),
        };

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if let Some(err) = error {
            return Err(err);
        }
        Ok(Receipt {
            tx_hash: *hash,
            block_number: 1,
            success,
            gas_used: 50_000,
        })
    }

    async fn call(&self, call: &CallRequest) -> Result<Vec<u8>, LedgerError> {
        let state = self.state.lock();
        if let Some(err) = &state.call_error {
            return Err(err.clone());
        }
        if call.data.len() < 4 {
            return Err(LedgerError::Rpc {
                code: -32000,
                message: "execution reverted".into(),
            });
        }
        let (sel, args) = call.data.split_at(4);
        let arg = || {
            (args.len() >= 32)
                .then(|| address_arg(args))
                .ok_or_else(|| LedgerError::Decode("missing address argument".into()))
        };

        if sel == selector(functions::IS_AUTHORIZED_RELAYER) {
            Ok(returns::boolean(state.authorized.contains(&arg()?)))
        } else if sel == selector(functions::GET_TOTAL_HITS) {
            Ok(returns::uint(state.total_hits))
        } else if sel == selector(functions::GET_PLAYER_TOTAL_SCORE) {
            let score = state.scores.get(&arg()?).copied().unwrap_or_default();
            Ok(returns::uint(score))
        } else if sel == selector(functions::GET_PLAYER_HITS) {
            let hits = state.hits.get(&arg()?).cloned().unwrap_or_default();
            Ok(returns::uint_array(&hits))
        } else if sel == selector(functions::GET_GLOBAL_TOP_SCORES) {
            Ok(returns::top_scores(&state.top_scores))
        } else {
            Err(LedgerError::Rpc {
                code: -32000,
                message: "execution reverted".into(),
            })
        }
    }
}

/// Manually advanced clock.
#[derive(Debug, Default)]
pub struct MockTimeSource {
    now: AtomicU64,
}

impl MockTimeSource {
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: AtomicU64::new(start),
        }
    }

    pub fn advance(&self, ms: u64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }
}

impl TimeSource for MockTimeSource {
    fn now(&self) -> Timestamp {
        self.now.load(Ordering::SeqCst)
    }
}
