//! # Ledger RPC
//!
//! [`LedgerClient`](relay_core::LedgerClient) adapter for Ethereum-compatible
//! nodes, speaking JSON-RPC 2.0 over HTTP.
//!
//! | Port method | RPC method |
//! |-------------|------------|
//! | `get_balance` | `eth_getBalance` |
//! | `get_pending_nonce` | `eth_getTransactionCount` (`pending`) |
//! | `estimate_gas` | `eth_estimateGas` |
//! | `estimate_fees` | `eth_getBlockByNumber` + `eth_maxPriorityFeePerGas` |
//! | `gas_price` | `eth_gasPrice` |
//! | `submit` | `eth_sendRawTransaction` |
//! | `wait_for_confirmation` | `eth_getTransactionReceipt` (polled) |
//! | `call` | `eth_call` |
//!
//! Transactions are signed locally; keys never leave the process.

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod client;
pub mod codec;

pub use client::{JsonRpcLedger, RpcSettings};
