//! Core domain entities for the relay.

use primitive_types::U256 as PrimitiveU256;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Keccak256};
use std::fmt;
use std::str::FromStr;

/// 256-bit unsigned integer (balances, fees, contract words).
pub type U256 = PrimitiveU256;

/// 32-byte hash.
pub type Hash = [u8; 32];

/// Timestamp in milliseconds.
pub type Timestamp = u64;

/// Maximum points a single hit may carry.
pub const MAX_POINTS: u64 = 100;

/// Keccak256 hash function.
pub fn keccak256(data: &[u8]) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// 20-byte account address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// Zero address.
    pub const ZERO: Address = Address([0u8; 20]);

    /// Create from raw bytes.
    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// EIP-55 mixed-case checksum encoding.
    pub fn to_checksum(&self) -> String {
        let lower = hex::encode(self.0);
        let hash = keccak256(lower.as_bytes());
        let mut out = String::with_capacity(42);
        out.push_str("0x");
        for (i, c) in lower.chars().enumerate() {
            let nibble = (hash[i / 2] >> (if i % 2 == 0 { 4 } else { 0 })) & 0x0f;
            if c.is_ascii_alphabetic() && nibble >= 8 {
                out.push(c.to_ascii_uppercase());
            } else {
                out.push(c);
            }
        }
        out
    }
}

/// Error parsing an address string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressParseError {
    #[error("address must be 0x followed by 40 hex characters")]
    InvalidLength,
    #[error("address contains non-hex characters")]
    InvalidHex,
}

impl FromStr for Address {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .ok_or(AddressParseError::InvalidLength)?;
        if digits.len() != 40 {
            return Err(AddressParseError::InvalidLength);
        }
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(digits, &mut bytes).map_err(|_| AddressParseError::InvalidHex)?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_checksum())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_checksum())
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_checksum())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Transaction hash as returned by the ledger.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TxHash(pub Hash);

impl TxHash {
    /// Hex string with 0x prefix.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Parse from a 0x-prefixed hex string.
    pub fn from_hex(s: &str) -> Option<Self> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(digits, &mut bytes).ok()?;
        Some(Self(bytes))
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxHash({})", self.to_hex())
    }
}

impl Serialize for TxHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

/// Point value of a single hit, bounded to `0..=MAX_POINTS`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Points(u64);

/// Point value outside the accepted range.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("points must be between 0 and {max}, got {value}")]
pub struct PointsOutOfRange {
    pub value: i128,
    pub max: u64,
}

impl Points {
    /// Validate a raw point value.
    pub fn new(value: i128) -> Result<Self, PointsOutOfRange> {
        if value < 0 || value > MAX_POINTS as i128 {
            return Err(PointsOutOfRange {
                value,
                max: MAX_POINTS,
            });
        }
        Ok(Self(value as u64))
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

/// A validated request to record one hit on the ledger.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RelayRequest {
    /// Player credited with the hit.
    pub player: Address,
    /// Points awarded.
    pub points: Points,
}

impl RelayRequest {
    pub fn new(player: Address, points: Points) -> Self {
        Self { player, points }
    }
}

/// Read-only or gas-estimation call against a contract.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallRequest {
    /// Caller, when the call depends on `msg.sender`.
    pub from: Option<Address>,
    /// Contract address.
    pub to: Address,
    /// ABI-encoded calldata.
    pub data: Vec<u8>,
}

/// Confirmation receipt of an included transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Receipt {
    pub tx_hash: TxHash,
    pub block_number: u64,
    /// `true` if execution succeeded, `false` if it reverted.
    pub success: bool,
    pub gas_used: u64,
}

/// One row of the contract's global leaderboard.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TopScore {
    pub player: Address,
    pub score: U256,
    pub timestamp: U256,
}

/// Aggregated per-player view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayerScore {
    pub player: Address,
    pub total_score: U256,
    pub hit_count: usize,
}
