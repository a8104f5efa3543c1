//! Domain layer for the relay.
//!
//! Contains entities, the busy set and pure encoding logic.

pub mod abi;
pub mod busy;
pub mod entities;
pub mod errors;
pub mod fees;
pub mod identity;
pub mod transaction;

pub use abi::{ContractCall, HitTracker};
pub use busy::BusySet;
pub use entities::*;
pub use errors::{AbiError, ExecutionError, LedgerError};
pub use fees::{Eip1559Fees, FeeStrategy, FALLBACK_GAS_PRICE_WEI};
pub use identity::{IdentityError, SigningIdentity};
pub use transaction::{SignedTransaction, TransactionRequest};
