//! Gateway domain: configuration, errors and wire types.

pub mod config;
pub mod error;
pub mod types;

pub use config::{CorsConfig, GatewayConfig};
pub use error::{ApiError, GatewayError};
