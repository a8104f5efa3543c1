//! Relay configuration with validation.

use crate::domain::{Address, U256};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default HitTracker deployment on Celo Sepolia.
pub const DEFAULT_CONTRACT_ADDRESS: Address = Address([
    0x80, 0xb8, 0x28, 0xb2, 0x26, 0xaf, 0xee, 0x0a, 0x2f, 0xa8, 0x74, 0x04, 0xef, 0x3e, 0xd4, 0x4e,
    0x6d, 0xde, 0xec, 0xf2,
]);

/// Celo Sepolia chain id.
pub const DEFAULT_CHAIN_ID: u64 = 11_142_220;

/// Tunables of the identity pool, queue and executor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Chain id used when signing.
    pub chain_id: u64,
    /// HitTracker contract address.
    pub contract_address: Address,
    /// Identities with less than this balance (wei) are never selected.
    pub min_balance_wei: U256,
    /// How long a cached balance is trusted.
    #[serde(with = "humantime_serde")]
    pub balance_ttl: Duration,
    /// Safety multiplier applied to gas estimates.
    pub gas_multiplier: f64,
    /// Gas limit used when estimation fails.
    pub fallback_gas_limit: u64,
    /// Drain loop back-off when no identity is available.
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
    /// Deadline for confirmation (zero disables it).
    #[serde(with = "humantime_serde")]
    pub confirmation_timeout: Duration,
    /// Refuse to submit when the pre-flight check finds insufficient funds.
    pub enforce_affordability: bool,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            chain_id: DEFAULT_CHAIN_ID,
            contract_address: DEFAULT_CONTRACT_ADDRESS,
            min_balance_wei: U256::from(100_000_000_000_000u64), // 0.0001 native
            balance_ttl: Duration::from_secs(30),
            gas_multiplier: 1.2,
            fallback_gas_limit: 300_000,
            poll_interval: Duration::from_millis(100),
            confirmation_timeout: Duration::from_secs(120),
            enforce_affordability: false,
        }
    }
}

impl RelayConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chain_id == 0 {
            return Err(ConfigError::InvalidValue("chain_id cannot be 0".into()));
        }
        if !self.gas_multiplier.is_finite() || self.gas_multiplier < 1.0 {
            return Err(ConfigError::InvalidValue(format!(
                "gas_multiplier must be >= 1.0, got {}",
                self.gas_multiplier
            )));
        }
        if self.fallback_gas_limit == 0 {
            return Err(ConfigError::InvalidValue(
                "fallback_gas_limit cannot be 0".into(),
            ));
        }
        if self.poll_interval.is_zero() {
            return Err(ConfigError::InvalidTimeout(
                "poll_interval cannot be 0".into(),
            ));
        }
        Ok(())
    }

    /// Confirmation deadline, if enabled.
    pub fn confirmation_deadline(&self) -> Option<Duration> {
        (!self.confirmation_timeout.is_zero()).then_some(self.confirmation_timeout)
    }
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Value out of range or unparsable
    #[error("invalid value: {0}")]
    InvalidValue(String),
    /// Invalid timeout or interval
    #[error("invalid timeout: {0}")]
    InvalidTimeout(String),
}

/// Humantime serde module for Duration serialization
pub mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("{}ms", duration.as_millis()))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_duration(&s).map_err(serde::de::Error::custom)
    }

    /// Parse `"250ms"`, `"30s"`, `"2m"` or plain seconds.
    pub fn parse_duration(s: &str) -> Result<Duration, &'static str> {
        let s = s.trim();
        if let Some(ms) = s.strip_suffix("ms") {
            ms.trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|_| "invalid milliseconds")
        } else if let Some(secs) = s.strip_suffix('s') {
            secs.trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| "invalid seconds")
        } else if let Some(mins) = s.strip_suffix('m') {
            mins.trim()
                .parse::<u64>()
                .map(|m| Duration::from_secs(m * 60))
                .map_err(|_| "invalid minutes")
        } else {
            s.parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| "invalid duration format")
        }
    }
}
