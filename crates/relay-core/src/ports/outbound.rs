//! Outbound (Driven) ports for the relay.
//!
//! These traits define dependencies on external systems that the relay
//! needs for operation.

use crate::domain::{
    Address, CallRequest, Eip1559Fees, LedgerError, Receipt, SigningIdentity, Timestamp,
    TransactionRequest, TxHash, U256,
};
use async_trait::async_trait;

/// Remote ledger interface.
///
/// Every method is one network round-trip (or, for
/// `wait_for_confirmation`, a sequence of them) and may fail.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Current balance of `address` in wei.
    async fn get_balance(&self, address: &Address) -> Result<U256, LedgerError>;

    /// Next sequence number for `address`, counting pending transactions.
    async fn get_pending_nonce(&self, address: &Address) -> Result<u64, LedgerError>;

    /// Gas the call is expected to consume.
    async fn estimate_gas(&self, call: &CallRequest) -> Result<u64, LedgerError>;

    /// Suggested EIP-1559 fees.
    ///
    /// # Returns
    /// - `Ok(Some(_))`: the network supports dynamic fees
    /// - `Ok(None)`: the network has no base fee
    /// - `Err`: the query failed
    async fn estimate_fees(&self) -> Result<Option<Eip1559Fees>, LedgerError>;

    /// Legacy gas price in wei.
    async fn gas_price(&self) -> Result<U256, LedgerError>;

    /// Sign `tx` with `signer` and broadcast it.
    async fn submit(
        &self,
        signer: &SigningIdentity,
        tx: TransactionRequest,
    ) -> Result<TxHash, LedgerError>;

    /// Suspend until `hash` is included.
    async fn wait_for_confirmation(&self, hash: &TxHash) -> Result<Receipt, LedgerError>;

    /// Read-only contract call, returning raw ABI data.
    async fn call(&self, call: &CallRequest) -> Result<Vec<u8>, LedgerError>;
}

/// Time source for consistent timestamp handling.
///
/// Abstracted to allow testing with deterministic time.
pub trait TimeSource: Send + Sync {
    /// Returns the current timestamp in milliseconds.
    fn now(&self) -> Timestamp;
}

/// Default system time source.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Timestamp {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as Timestamp
    }
}
