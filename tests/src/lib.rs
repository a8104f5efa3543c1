//! # Hit Relay Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── relay_flow.rs   # gateway → queue → pool → executor over MockLedger
//!     └── rpc_flow.rs     # the same stack over JsonRpcLedger and a fake node
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p relay-tests
//! cargo bench -p relay-tests
//! ```

pub mod integration;
