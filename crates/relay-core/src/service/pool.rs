//! Identity pool with round-robin selection.
//!
//! Selection starts at the rotation pointer and walks the pool once,
//! skipping identities that are busy, whose balance cannot be read, or whose
//! balance is below the configured minimum. Balances are cached for a TTL.
//!
//! The pool lock is never held across a ledger query.

use crate::config::RelayConfig;
use crate::domain::{Address, BusySet, SigningIdentity, Timestamp, U256};
use crate::ports::{LedgerClient, TimeSource};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Clone, Copy, Debug)]
struct BalanceEntry {
    balance: U256,
    fetched_at: Timestamp,
}

#[derive(Debug)]
struct PoolState {
    /// Index where the next scan begins.
    rotation: usize,
    busy: BusySet,
    balances: HashMap<Address, BalanceEntry>,
}

/// Fixed, ordered set of signing identities.
pub struct IdentityPool {
    identities: Vec<Arc<SigningIdentity>>,
    state: Arc<Mutex<PoolState>>,
    ledger: Arc<dyn LedgerClient>,
    clock: Arc<dyn TimeSource>,
    min_balance: U256,
    balance_ttl_ms: u64,
}

impl IdentityPool {
    /// Build a pool. Duplicate identities are kept once, in first position.
    pub fn new(
        identities: Vec<SigningIdentity>,
        ledger: Arc<dyn LedgerClient>,
        clock: Arc<dyn TimeSource>,
        config: &RelayConfig,
    ) -> Self {
        let mut unique: Vec<Arc<SigningIdentity>> = Vec::with_capacity(identities.len());
        for identity in identities {
            if unique.iter().any(|i| i.address() == identity.address()) {
                warn!(address = %identity.address(), "Duplicate relayer identity ignored");
                continue;
            }
            unique.push(Arc::new(identity));
        }

        Self {
            identities: unique,
            state: Arc::new(Mutex::new(PoolState {
                rotation: 0,
                busy: BusySet::new(),
                balances: HashMap::new(),
            })),
            ledger,
            clock,
            min_balance: config.min_balance_wei,
            balance_ttl_ms: config.balance_ttl.as_millis() as u64,
        }
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }

    /// Addresses in pool order.
    pub fn addresses(&self) -> Vec<Address> {
        self.identities.iter().map(|i| i.address()).collect()
    }

    pub fn identities(&self) -> &[Arc<SigningIdentity>] {
        &self.identities
    }

    /// Number of identities currently executing.
    pub fn busy_count(&self) -> usize {
        self.state.lock().busy.len()
    }

    pub fn is_busy(&self, address: &Address) -> bool {
        self.state.lock().busy.contains(address)
    }

    /// Current rotation pointer.
    pub fn rotation(&self) -> usize {
        self.state.lock().rotation
    }

    /// Forget the cached balance of `address`.
    pub fn invalidate_balance(&self, address: &Address) {
        self.state.lock().balances.remove(address);
    }

    /// Find an idle, funded identity without claiming it.
    ///
    /// Advances the rotation pointer past the returned identity.
    pub async fn select_available(&self) -> Option<Arc<SigningIdentity>> {
        self.scan(false, None).await
    }

    /// Find an idle, funded identity and mark it busy.
    ///
    /// The identity stays busy until the returned lease is dropped.
    pub async fn acquire(&self) -> Option<IdentityLease> {
        self.claim(None).await
    }

    /// Like [`acquire`](Self::acquire), but never returns `excluded`.
    pub async fn acquire_excluding(&self, excluded: &Address) -> Option<IdentityLease> {
        self.claim(Some(excluded)).await
    }

    async fn claim(&self, excluded: Option<&Address>) -> Option<IdentityLease> {
        let identity = self.scan(true, excluded).await?;
        Some(IdentityLease {
            identity,
            state: Arc::clone(&self.state),
        })
    }

    async fn scan(
        &self,
        claim: bool,
        excluded: Option<&Address>,
    ) -> Option<Arc<SigningIdentity>> {
        let n = self.identities.len();
        if n == 0 {
            return None;
        }
        let start = self.state.lock().rotation;

        for attempt in 0..n {
            let idx = (start + attempt) % n;
            let identity = &self.identities[idx];
            let address = identity.address();
            if excluded == Some(&address) {
                continue;
            }

            if self.state.lock().busy.contains(&address) {
                continue;
            }

            let Some(balance) = self.balance_of(&address).await else {
                continue;
            };
            if balance < self.min_balance {
                warn!(
                    address = %address,
                    balance = %balance,
                    minimum = %self.min_balance,
                    "Relayer balance too low, skipping"
                );
                continue;
            }

            let mut state = self.state.lock();
            // Another acquirer may have claimed it while the balance was fetched.
            if claim && !state.busy.try_insert(address) {
                continue;
            }
            state.rotation = (idx + 1) % n;
            debug!(address = %address, index = idx, "Selected relayer");
            return Some(Arc::clone(identity));
        }

        None
    }

    /// Cached balance if fresh, otherwise a ledger query.
    async fn balance_of(&self, address: &Address) -> Option<U256> {
        let now = self.clock.now();
        if let Some(entry) = self.state.lock().balances.get(address).copied() {
            if now.saturating_sub(entry.fetched_at) <= self.balance_ttl_ms {
                return Some(entry.balance);
            }
        }

        match self.ledger.get_balance(address).await {
            Ok(balance) => {
                self.state.lock().balances.insert(
                    *address,
                    BalanceEntry {
                        balance,
                        fetched_at: now,
                    },
                );
                Some(balance)
            }
            Err(e) => {
                warn!(address = %address, error = %e, "Balance check failed");
                None
            }
        }
    }
}

impl fmt::Debug for IdentityPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityPool")
            .field("identities", &self.addresses())
            .field("min_balance", &self.min_balance)
            .field("balance_ttl_ms", &self.balance_ttl_ms)
            .finish()
    }
}

/// Exclusive claim on one identity. Dropping it frees the identity.
pub struct IdentityLease {
    identity: Arc<SigningIdentity>,
    state: Arc<Mutex<PoolState>>,
}

impl IdentityLease {
    pub fn identity(&self) -> &SigningIdentity {
        &self.identity
    }

    pub fn address(&self) -> Address {
        self.identity.address()
    }
}

impl Drop for IdentityLease {
    fn drop(&mut self) {
        self.state.lock().busy.remove(&self.identity.address());
    }
}

impl fmt::Debug for IdentityLease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("IdentityLease")
            .field(&self.identity.address())
            .finish()
    }
}
