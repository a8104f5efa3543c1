//! # Signing Identities
//!
//! A secp256k1 signing key plus the address derived from it.
//!
//! ## Security Notes
//!
//! - The secret key is never exposed: `Debug` prints the address only and
//!   error messages never echo the input key material.
//! - Decoded key bytes are zeroized after the signing key is built. The
//!   `k256::ecdsa::SigningKey` itself zeroizes on drop.

use super::entities::{keccak256, Address, Hash};
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use std::fmt;
use zeroize::Zeroize;

/// Errors building an identity from key material.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    /// Key is not 32 bytes of hex.
    #[error("private key must be 64 hex characters (optionally 0x-prefixed)")]
    MalformedKey,
    /// Key is zero or not below the curve order.
    #[error("private key is not a valid secp256k1 scalar")]
    InvalidScalar,
    /// Signing failed.
    #[error("signing failed")]
    SigningFailed,
}

/// One signing credential of the relay pool.
pub struct SigningIdentity {
    signing_key: SigningKey,
    address: Address,
}

impl SigningIdentity {
    /// Create from secret key bytes (32 bytes).
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self, IdentityError> {
        let signing_key =
            SigningKey::from_bytes(bytes.into()).map_err(|_| IdentityError::InvalidScalar)?;
        let address = address_from_pubkey(signing_key.verifying_key());
        Ok(Self {
            signing_key,
            address,
        })
    }

    /// Parse a hex private key, with or without `0x` prefix.
    pub fn from_hex(key: &str) -> Result<Self, IdentityError> {
        let key = key.trim();
        let digits = key.strip_prefix("0x").unwrap_or(key);
        if digits.len() != 64 {
            return Err(IdentityError::MalformedKey);
        }
        let mut bytes = [0u8; 32];
        if hex::decode_to_slice(digits, &mut bytes).is_err() {
            bytes.zeroize();
            return Err(IdentityError::MalformedKey);
        }
        let identity = Self::from_bytes(&bytes);
        bytes.zeroize();
        identity
    }

    /// Public address of this identity.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Sign a 32-byte prehash, returning the low-S signature and recovery id.
    pub fn sign_prehash(&self, prehash: &Hash) -> Result<(Signature, RecoveryId), IdentityError> {
        self.signing_key
            .sign_prehash_recoverable(prehash)
            .map_err(|_| IdentityError::SigningFailed)
    }
}

impl fmt::Debug for SigningIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningIdentity")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// Derive the account address from a public key.
///
/// Last 20 bytes of keccak256 over the uncompressed point without its `0x04` prefix.
pub fn address_from_pubkey(public_key: &VerifyingKey) -> Address {
    let encoded = public_key.to_encoded_point(false);
    let hash = keccak256(&encoded.as_bytes()[1..]);
    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..]);
    Address(address)
}
