//! Node settings loaded from environment variables.
//!
//! Every variable is optional except `PRIVATE_KEY`. Unset or empty variables
//! keep their defaults. An unparsable value is warned about and also keeps
//! the default, then the assembled [`RelayConfig`] is validated as a whole.

use ledger_rpc::RpcSettings;
use relay_core::{Address, ConfigError, IdentityError, RelayConfig, SigningIdentity, U256};
use relay_gateway::{CorsConfig, GatewayConfig};
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;
use zeroize::Zeroizing;

pub const DEFAULT_RPC_URL: &str = "https://forno.celo-sepolia.celo-testnet.org/";

/// Highest `RELAYER_PRIVATE_KEY_<n>` index that is read.
pub const MAX_RELAYER_KEYS: usize = 50;

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("PRIVATE_KEY is not set")]
    MissingPrimaryKey,

    #[error("PRIVATE_KEY is invalid: {0}")]
    InvalidPrimaryKey(IdentityError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Everything the node needs to start.
///
/// Not `Debug`: the RPC URL may carry an API key.
pub struct NodeSettings {
    /// Deployer identity; authorizes the relayers.
    pub primary: SigningIdentity,
    /// Identities of the relay pool.
    pub relayers: Vec<SigningIdentity>,
    pub relay: RelayConfig,
    pub rpc: RpcSettings,
    pub gateway: GatewayConfig,
}

impl NodeSettings {
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::load(|name| std::env::var(name).ok())
    }

    /// Load from an arbitrary variable lookup.
    pub fn load<F>(lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let primary_key = var("PRIVATE_KEY")
            .map(Zeroizing::new)
            .ok_or(SettingsError::MissingPrimaryKey)?;
        let primary =
            SigningIdentity::from_hex(&primary_key).map_err(SettingsError::InvalidPrimaryKey)?;

        let mut relayers = Vec::new();
        for n in 1..=MAX_RELAYER_KEYS {
            let name = format!("RELAYER_PRIVATE_KEY_{n}");
            let Some(key) = var(&name).map(Zeroizing::new) else {
                continue;
            };
            match SigningIdentity::from_hex(&key) {
                Ok(identity) => relayers.push(identity),
                Err(e) => warn!(variable = %name, error = %e, "Ignoring relayer key"),
            }
        }
        if relayers.is_empty() {
            warn!("No relayer keys configured, relaying with the primary identity");
            relayers.push(
                SigningIdentity::from_hex(&primary_key).map_err(SettingsError::InvalidPrimaryKey)?,
            );
        }

        let mut relay = RelayConfig::default();
        override_with(&var, "CONTRACT_ADDRESS", &mut relay.contract_address, |s| {
            Address::from_str(s).ok()
        });
        override_with(&var, "CHAIN_ID", &mut relay.chain_id, |s| s.parse().ok());
        override_with(&var, "MIN_BALANCE_WEI", &mut relay.min_balance_wei, |s| {
            U256::from_dec_str(s).ok()
        });
        override_with(&var, "BALANCE_TTL_MS", &mut relay.balance_ttl, millis);
        override_with(&var, "GAS_MULTIPLIER", &mut relay.gas_multiplier, |s| {
            s.parse().ok()
        });
        override_with(&var, "FALLBACK_GAS_LIMIT", &mut relay.fallback_gas_limit, |s| {
            s.parse().ok()
        });
        override_with(&var, "POLL_INTERVAL_MS", &mut relay.poll_interval, millis);
        override_with(
            &var,
            "CONFIRMATION_TIMEOUT_MS",
            &mut relay.confirmation_timeout,
            millis,
        );
        override_with(
            &var,
            "ENFORCE_AFFORDABILITY",
            &mut relay.enforce_affordability,
            flag,
        );
        relay.validate()?;

        let url = var("ALCHEMY_RPC_URL")
            .or_else(|| var("CELO_RPC_URL"))
            .unwrap_or_else(|| DEFAULT_RPC_URL.to_string());
        let mut rpc = RpcSettings::new(url, relay.chain_id);
        override_with(&var, "RPC_TIMEOUT_MS", &mut rpc.request_timeout, millis);

        let mut gateway = GatewayConfig::default();
        override_with(&var, "PORT", &mut gateway.port, |s| s.parse().ok());
        if let Some(origins) = var("CORS_ORIGINS") {
            gateway.cors = CorsConfig::default().with_origins(&origins);
        }

        Ok(Self {
            primary,
            relayers,
            relay,
            rpc,
            gateway,
        })
    }
}

fn override_with<V, T, P>(var: &V, name: &str, target: &mut T, parse: P)
where
    V: Fn(&str) -> Option<String>,
    P: Fn(&str) -> Option<T>,
{
    let Some(raw) = var(name) else {
        return;
    };
    match parse(raw.trim()) {
        Some(value) => *target = value,
        None => warn!(variable = name, value = %raw, "Unparsable value, keeping default"),
    }
}

fn millis(s: &str) -> Option<Duration> {
    s.parse().ok().map(Duration::from_millis)
}

fn flag(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Host part of an RPC endpoint, safe to log.
pub fn endpoint_host(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| "<unparsable>".to_string())
}
