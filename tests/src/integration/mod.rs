//! Cross-crate flows.

pub mod relay_flow;
pub mod rpc_flow;
