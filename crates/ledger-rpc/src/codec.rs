//! Hex encodings used on the JSON-RPC wire.
//!
//! Quantities are `0x`-prefixed big-endian hex without leading zeros; data
//! is `0x`-prefixed hex of the raw bytes.

use relay_core::{Address, CallRequest, LedgerError, Receipt, TxHash, U256};
use serde::{Deserialize, Serialize};

pub fn encode_quantity(value: u64) -> String {
    format!("0x{value:x}")
}

pub fn encode_data(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Lower-case hex, as accepted by every node.
pub fn encode_address(address: &Address) -> String {
    encode_data(address.as_bytes())
}

fn strip_prefix(s: &str) -> Result<&str, LedgerError> {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .ok_or_else(|| LedgerError::Decode(format!("missing 0x prefix: {s}")))
}

pub fn decode_u64(s: &str) -> Result<u64, LedgerError> {
    let digits = strip_prefix(s)?;
    if digits.is_empty() {
        return Ok(0);
    }
    u64::from_str_radix(digits, 16).map_err(|e| LedgerError::Decode(format!("{s}: {e}")))
}

pub fn decode_u256(s: &str) -> Result<U256, LedgerError> {
    let digits = strip_prefix(s)?;
    if digits.is_empty() {
        return Ok(U256::zero());
    }
    U256::from_str_radix(digits, 16).map_err(|e| LedgerError::Decode(format!("{s}: {e:?}")))
}

pub fn decode_data(s: &str) -> Result<Vec<u8>, LedgerError> {
    hex::decode(strip_prefix(s)?).map_err(|e| LedgerError::Decode(format!("invalid data: {e}")))
}

pub fn decode_hash(s: &str) -> Result<TxHash, LedgerError> {
    TxHash::from_hex(s).ok_or_else(|| LedgerError::Decode(format!("invalid hash: {s}")))
}

/// `eth_call` / `eth_estimateGas` transaction object.
#[derive(Debug, Serialize)]
pub struct CallObject {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    pub to: String,
    pub data: String,
}

impl From<&CallRequest> for CallObject {
    fn from(call: &CallRequest) -> Self {
        Self {
            from: call.from.as_ref().map(encode_address),
            to: encode_address(&call.to),
            data: encode_data(&call.data),
        }
    }
}

/// The part of a block header the adapter reads.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockHeader {
    pub base_fee_per_gas: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptObject {
    pub transaction_hash: String,
    pub block_number: Option<String>,
    pub status: Option<String>,
    pub gas_used: Option<String>,
}

impl ReceiptObject {
    /// `None` while the receipt has no block number yet.
    pub fn into_receipt(self) -> Result<Option<Receipt>, LedgerError> {
        let Some(block) = self.block_number else {
            return Ok(None);
        };
        // Pre-Byzantium receipts carry no status; treat them as successful.
        let success = match self.status.as_deref() {
            Some(status) => decode_u64(status)? == 1,
            None => true,
        };
        Ok(Some(Receipt {
            tx_hash: decode_hash(&self.transaction_hash)?,
            block_number: decode_u64(&block)?,
            success,
            gas_used: self.gas_used.as_deref().map(decode_u64).transpose()?.unwrap_or(0),
        }))
    }
}
