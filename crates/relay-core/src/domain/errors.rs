//! Relay error types.

use super::entities::{TxHash, U256};
use super::identity::IdentityError;
use thiserror::Error;

/// Errors reported by a `LedgerClient` implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// HTTP / connection failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The node answered with a JSON-RPC error object.
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// The response could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// The response had neither a result nor an error.
    #[error("RPC response missing result for {0}")]
    MissingResult(String),

    /// Signing the transaction failed.
    #[error("signing error: {0}")]
    Signing(#[from] IdentityError),
}

/// Failure of a single execution attempt.
///
/// Each variant names the step that failed and keeps the underlying cause.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
    #[error("failed to fetch sequence number: {0}")]
    Nonce(LedgerError),

    #[error("failed to submit transaction: {0}")]
    Submission(LedgerError),

    #[error("failed waiting for confirmation of {tx_hash}: {source}")]
    Confirmation { tx_hash: TxHash, source: LedgerError },

    #[error("transaction {tx_hash} not confirmed within {timeout_ms}ms")]
    ConfirmationTimeout { tx_hash: TxHash, timeout_ms: u64 },

    #[error("transaction {tx_hash} reverted")]
    Reverted { tx_hash: TxHash },

    #[error("insufficient balance for gas: have {available}, need {required}")]
    InsufficientFunds { required: U256, available: U256 },

    #[error("execution abandoned before completion")]
    Abandoned,
}

/// Errors decoding contract return data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AbiError {
    #[error("return data too short: need {needed} bytes, got {actual}")]
    TooShort { needed: usize, actual: usize },

    #[error("offset or length out of range: {0}")]
    OutOfRange(String),
}

impl From<AbiError> for LedgerError {
    fn from(e: AbiError) -> Self {
        LedgerError::Decode(e.to_string())
    }
}
