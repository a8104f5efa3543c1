//! Ports layer for the relay.
//!
//! Outbound ports are the dependencies the relay needs from the ledger and
//! the clock.

pub mod outbound;

pub use outbound::{LedgerClient, SystemTimeSource, TimeSource};
