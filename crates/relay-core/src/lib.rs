//! # Relay Core
//!
//! Multi-key transaction relay queue for the HitTracker contract.
//!
//! ## Purpose
//!
//! Accepts "record a hit" requests, pairs each with a funded signing identity
//! from a fixed pool, and relays it as a signed transaction. Submission is
//! serialized per identity; a failed relay is retried once on a different
//! identity.
//!
//! ## Domain Invariants
//!
//! | Invariant | Enforcement Location |
//! |-----------|---------------------|
//! | Busy Set never holds an identity twice | `domain/busy.rs` - `try_insert()` |
//! | Underfunded identities are never selected | `service/pool.rs` - `scan()` |
//! | Stale balances are refreshed before use | `service/pool.rs` - `balance_of()` |
//! | Rotation visits every funded identity before repeating | `service/pool.rs` - rotation pointer |
//! | At most one retry, on a different identity | `service/queue.rs` - `run_relay()` |
//!
//! ## Relay Flow
//!
//! ```text
//! enqueue ──→ [BACKLOG] ──drain──→ acquire(identity) ──spawn──→ execute
//!                 ↑                     │ none                      │
//!                 │                     └── sleep(poll) ──┐         ├── ok ──→ resolve
//!                 └───────────────────────────────────────┘         └── err ──→ retry once ──→ resolve
//! ```
//!
//! ## Module Structure (Hexagonal Architecture)
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  service/  - IdentityPool, RelayQueue, TransactionExecutor,     │
//! │              BootstrapAuthorizer, Scoreboard                    │
//! └─────────────────────────────────────────────────────────────────┘
//!                          ↑ uses ↑
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  ports/outbound.rs - LedgerClient, TimeSource traits            │
//! └─────────────────────────────────────────────────────────────────┘
//!                          ↑ uses ↑
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  domain/identity.rs    - SigningIdentity                        │
//! │  domain/busy.rs        - BusySet                                │
//! │  domain/fees.rs        - FeeStrategy, gas arithmetic            │
//! │  domain/transaction.rs - TransactionRequest signing (RLP)       │
//! │  domain/abi.rs         - HitTracker ABI encoding                │
//! │  domain/errors.rs      - LedgerError, ExecutionError            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod config;
pub mod domain;
pub mod ports;
pub mod service;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use config::{ConfigError, RelayConfig};
pub use domain::*;
pub use ports::{LedgerClient, SystemTimeSource, TimeSource};
pub use service::{
    BootstrapAuthorizer, BootstrapError, BootstrapReport, CompletionHandle, IdentityLease,
    IdentityPool, RelayFailure, RelayOutcome, RelayQueue, RelayReceipt, Scoreboard,
    TransactionExecutor,
};
