//! HitTracker contract ABI.
//!
//! Calls are a 4-byte keccak selector followed by 32-byte words. Only the
//! shapes this contract uses are supported: `address`, `uint256`, `bool`,
//! `uint256[]` and `(address,uint256,uint256)[]`.

use super::entities::{keccak256, Address, CallRequest, RelayRequest, TopScore, U256};
use super::errors::AbiError;

const WORD: usize = 32;

/// Function signatures of the HitTracker contract.
pub mod functions {
    pub const RECORD_HIT: &str = "recordHit(address,uint256)";
    pub const ADD_AUTHORIZED_RELAYER: &str = "addAuthorizedRelayer(address)";
    pub const IS_AUTHORIZED_RELAYER: &str = "isAuthorizedRelayer(address)";
    pub const GET_TOTAL_HITS: &str = "getTotalHits()";
    pub const GET_PLAYER_TOTAL_SCORE: &str = "getPlayerTotalScore(address)";
    pub const GET_PLAYER_HITS: &str = "getPlayerHits(address)";
    pub const GET_GLOBAL_TOP_SCORES: &str = "getGlobalTopScores()";
}

/// First four bytes of keccak256 over the canonical signature.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// A state-changing call to be signed and submitted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContractCall {
    pub to: Address,
    pub data: Vec<u8>,
    /// Function signature, for logging.
    pub function: &'static str,
}

impl ContractCall {
    /// Gas-estimation request for this call sent from `from`.
    pub fn as_call_request(&self, from: Address) -> CallRequest {
        CallRequest {
            from: Some(from),
            to: self.to,
            data: self.data.clone(),
        }
    }
}

/// Typed call builder for a deployed HitTracker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HitTracker {
    address: Address,
}

impl HitTracker {
    pub fn new(address: Address) -> Self {
        Self { address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn record_hit(&self, request: &RelayRequest) -> ContractCall {
        let mut data = encode_call(functions::RECORD_HIT);
        data.extend_from_slice(&address_word(&request.player));
        data.extend_from_slice(&uint_word(U256::from(request.points.value())));
        self.write(functions::RECORD_HIT, data)
    }

    pub fn add_authorized_relayer(&self, relayer: &Address) -> ContractCall {
        let mut data = encode_call(functions::ADD_AUTHORIZED_RELAYER);
        data.extend_from_slice(&address_word(relayer));
        self.write(functions::ADD_AUTHORIZED_RELAYER, data)
    }

    pub fn is_authorized_relayer(&self, relayer: &Address) -> CallRequest {
        let mut data = encode_call(functions::IS_AUTHORIZED_RELAYER);
        data.extend_from_slice(&address_word(relayer));
        self.view(data)
    }

    pub fn total_hits(&self) -> CallRequest {
        self.view(encode_call(functions::GET_TOTAL_HITS))
    }

    pub fn player_total_score(&self, player: &Address) -> CallRequest {
        let mut data = encode_call(functions::GET_PLAYER_TOTAL_SCORE);
        data.extend_from_slice(&address_word(player));
        self.view(data)
    }

    pub fn player_hits(&self, player: &Address) -> CallRequest {
        let mut data = encode_call(functions::GET_PLAYER_HITS);
        data.extend_from_slice(&address_word(player));
        self.view(data)
    }

    pub fn global_top_scores(&self) -> CallRequest {
        self.view(encode_call(functions::GET_GLOBAL_TOP_SCORES))
    }

    fn write(&self, function: &'static str, data: Vec<u8>) -> ContractCall {
        ContractCall {
            to: self.address,
            data,
            function,
        }
    }

    fn view(&self, data: Vec<u8>) -> CallRequest {
        CallRequest {
            from: None,
            to: self.address,
            data,
        }
    }
}

fn encode_call(signature: &str) -> Vec<u8> {
    selector(signature).to_vec()
}

/// Left-pad an address to a 32-byte word.
pub fn address_word(address: &Address) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[12..].copy_from_slice(address.as_bytes());
    word
}

/// Big-endian 32-byte word.
pub fn uint_word(value: U256) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    value.to_big_endian(&mut word);
    word
}

fn word_at(data: &[u8], index: usize) -> Result<&[u8], AbiError> {
    let start = index
        .checked_mul(WORD)
        .ok_or_else(|| AbiError::OutOfRange(format!("word index {}", index)))?;
    let end = start + WORD;
    if data.len() < end {
        return Err(AbiError::TooShort {
            needed: end,
            actual: data.len(),
        });
    }
    Ok(&data[start..end])
}

fn word_as_usize(word: &[u8]) -> Result<usize, AbiError> {
    let value = U256::from_big_endian(word);
    if value > U256::from(u32::MAX) {
        return Err(AbiError::OutOfRange(value.to_string()));
    }
    Ok(value.as_usize())
}

fn word_as_address(word: &[u8]) -> Address {
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&word[12..]);
    Address(bytes)
}

/// Decode a single `uint256` return value.
pub fn decode_uint(data: &[u8]) -> Result<U256, AbiError> {
    Ok(U256::from_big_endian(word_at(data, 0)?))
}

/// Decode a single `bool` return value.
pub fn decode_bool(data: &[u8]) -> Result<bool, AbiError> {
    Ok(!decode_uint(data)?.is_zero())
}

// Dynamic return values start with an offset word pointing at the length word.
fn dynamic_array(data: &[u8], element_words: usize) -> Result<(usize, &[u8]), AbiError> {
    let offset = word_as_usize(word_at(data, 0)?)?;
    if offset % WORD != 0 || offset >= data.len() {
        return Err(AbiError::OutOfRange(format!("array offset {}", offset)));
    }
    let tail = &data[offset..];
    let len = word_as_usize(word_at(tail, 0)?)?;
    let needed = WORD + len * element_words * WORD;
    if tail.len() < needed {
        return Err(AbiError::TooShort {
            needed: offset + needed,
            actual: data.len(),
        });
    }
    Ok((len, &tail[WORD..needed]))
}

/// Decode a `uint256[]` return value.
pub fn decode_uint_array(data: &[u8]) -> Result<Vec<U256>, AbiError> {
    let (len, body) = dynamic_array(data, 1)?;
    (0..len)
        .map(|i| word_at(body, i).map(U256::from_big_endian))
        .collect()
}

/// Decode a `(address,uint256,uint256)[]` return value.
pub fn decode_top_scores(data: &[u8]) -> Result<Vec<TopScore>, AbiError> {
    let (len, body) = dynamic_array(data, 3)?;
    (0..len)
        .map(|i| {
            Ok(TopScore {
                player: word_as_address(word_at(body, i * 3)?),
                score: U256::from_big_endian(word_at(body, i * 3 + 1)?),
                timestamp: U256::from_big_endian(word_at(body, i * 3 + 2)?),
            })
        })
        .collect()
}

/// Encoders for return values, used by in-memory ledgers in tests.
#[cfg(any(test, feature = "test-utils"))]
pub mod returns {
    use super::*;

    pub fn uint(value: U256) -> Vec<u8> {
        uint_word(value).to_vec()
    }

    pub fn boolean(value: bool) -> Vec<u8> {
        uint(U256::from(u8::from(value)))
    }

    pub fn uint_array(values: &[U256]) -> Vec<u8> {
        let mut out = uint(U256::from(WORD));
        out.extend_from_slice(&uint_word(U256::from(values.len())));
        for v in values {
            out.extend_from_slice(&uint_word(*v));
        }
        out
    }

    pub fn top_scores(rows: &[TopScore]) -> Vec<u8> {
        let mut out = uint(U256::from(WORD));
        out.extend_from_slice(&uint_word(U256::from(rows.len())));
        for row in rows {
            out.extend_from_slice(&address_word(&row.player));
            out.extend_from_slice(&uint_word(row.score));
            out.extend_from_slice(&uint_word(row.timestamp));
        }
        out
    }
}
