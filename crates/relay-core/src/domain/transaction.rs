//! Transaction construction and signing.
//!
//! `Dynamic` fees produce an EIP-1559 (type `0x02`) envelope, `Legacy` fees an
//! EIP-155 transaction. `Unspecified` is signed as legacy at
//! `FALLBACK_GAS_PRICE_WEI`; ledger adapters resolve it to a network price
//! before signing.

use super::entities::{keccak256, Address, Hash, TxHash, U256};
use super::fees::{Eip1559Fees, FeeStrategy, FALLBACK_GAS_PRICE_WEI};
use super::identity::{IdentityError, SigningIdentity};
use rlp::RlpStream;

/// EIP-2718 type byte of dynamic-fee transactions.
pub const EIP1559_TX_TYPE: u8 = 0x02;

/// An unsigned contract call ready to be signed by a pool identity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionRequest {
    pub to: Address,
    pub data: Vec<u8>,
    pub nonce: u64,
    pub gas_limit: u64,
    pub fees: FeeStrategy,
}

/// A signed, encoded transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedTransaction {
    pub raw: Vec<u8>,
    pub hash: TxHash,
}

struct SignatureParts {
    y_parity: u8,
    r: U256,
    s: U256,
}

impl TransactionRequest {
    /// Copy of this request with `Unspecified` fees replaced by `fees`.
    pub fn with_resolved_fees(mut self, fees: FeeStrategy) -> Self {
        if self.fees == FeeStrategy::Unspecified {
            self.fees = fees;
        }
        self
    }

    /// Hash the signer commits to.
    pub fn signing_hash(&self, chain_id: u64) -> Hash {
        keccak256(&self.encode(chain_id, None))
    }

    /// Sign with `signer` for `chain_id`.
    pub fn sign(
        &self,
        chain_id: u64,
        signer: &SigningIdentity,
    ) -> Result<SignedTransaction, IdentityError> {
        let prehash = self.signing_hash(chain_id);
        let (signature, recovery_id) = signer.sign_prehash(&prehash)?;
        let bytes = signature.to_bytes();
        let parts = SignatureParts {
            y_parity: u8::from(recovery_id.is_y_odd()),
            r: U256::from_big_endian(&bytes[..32]),
            s: U256::from_big_endian(&bytes[32..]),
        };

        let raw = self.encode(chain_id, Some(parts));
        let hash = TxHash(keccak256(&raw));
        Ok(SignedTransaction { raw, hash })
    }

    fn encode(&self, chain_id: u64, signature: Option<SignatureParts>) -> Vec<u8> {
        match self.fees {
            FeeStrategy::Dynamic(fees) => self.encode_eip1559(chain_id, &fees, signature),
            FeeStrategy::Legacy { gas_price } => self.encode_legacy(chain_id, gas_price, signature),
            FeeStrategy::Unspecified => {
                self.encode_legacy(chain_id, U256::from(FALLBACK_GAS_PRICE_WEI), signature)
            }
        }
    }

    // [chainId, nonce, maxPriorityFeePerGas, maxFeePerGas, gasLimit, to, value, data, accessList, (yParity, r, s)]
    fn encode_eip1559(
        &self,
        chain_id: u64,
        fees: &Eip1559Fees,
        signature: Option<SignatureParts>,
    ) -> Vec<u8> {
        let mut stream = RlpStream::new_list(if signature.is_some() { 12 } else { 9 });
        stream.append(&chain_id);
        stream.append(&self.nonce);
        stream.append(&fees.max_priority_fee_per_gas);
        stream.append(&fees.max_fee_per_gas);
        stream.append(&self.gas_limit);
        stream.append(&self.to.as_bytes().to_vec());
        stream.append(&U256::zero());
        stream.append(&self.data);
        stream.begin_list(0);
        if let Some(sig) = signature {
            stream.append(&sig.y_parity);
            stream.append(&sig.r);
            stream.append(&sig.s);
        }

        let body = stream.out();
        let mut out = Vec::with_capacity(body.len() + 1);
        out.push(EIP1559_TX_TYPE);
        out.extend_from_slice(&body);
        out
    }

    // Unsigned: [nonce, gasPrice, gasLimit, to, value, data, chainId, 0, 0]
    // Signed:   [nonce, gasPrice, gasLimit, to, value, data, v, r, s]
    fn encode_legacy(
        &self,
        chain_id: u64,
        gas_price: U256,
        signature: Option<SignatureParts>,
    ) -> Vec<u8> {
        let mut stream = RlpStream::new_list(9);
        stream.append(&self.nonce);
        stream.append(&gas_price);
        stream.append(&self.gas_limit);
        stream.append(&self.to.as_bytes().to_vec());
        stream.append(&U256::zero());
        stream.append(&self.data);
        match signature {
            Some(sig) => {
                let v = chain_id * 2 + 35 + u64::from(sig.y_parity);
                stream.append(&v);
                stream.append(&sig.r);
                stream.append(&sig.s);
            }
            None => {
                stream.append(&chain_id);
                stream.append(&0u8);
                stream.append(&0u8);
            }
        }
        stream.out().to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::identity::address_from_pubkey;
    use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
    use rlp::Rlp;

    const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const CHAIN_ID: u64 = 11_142_220;

    fn request(fees: FeeStrategy) -> TransactionRequest {
        TransactionRequest {
            to: Address([0x42; 20]),
            data: vec![0xde, 0xad, 0xbe, 0xef],
            nonce: 7,
            gas_limit: 120_000,
            fees,
        }
    }

    fn recover(prehash: &Hash, r: &[u8], s: &[u8], parity: u8) -> Address {
        let mut bytes = [0u8; 64];
        bytes[32 - r.len()..32].copy_from_slice(r);
        bytes[64 - s.len()..].copy_from_slice(s);
        let sig = Signature::from_slice(&bytes).unwrap();
        let recid = RecoveryId::from_byte(parity).unwrap();
        let key = VerifyingKey::recover_from_prehash(prehash, &sig, recid).unwrap();
        address_from_pubkey(&key)
    }

    #[test]
    fn test_eip1559_signature_recovers_signer() {
        let signer = SigningIdentity::from_hex(DEV_KEY).unwrap();
        let tx = request(FeeStrategy::Dynamic(Eip1559Fees {
            max_fee_per_gas: U256::from(30_000_000_000u64),
            max_priority_fee_per_gas: U256::from(1_000_000_000u64),
        }));

        let signed = tx.sign(CHAIN_ID, &signer).unwrap();
        assert_eq!(signed.raw[0], EIP1559_TX_TYPE);
        assert_eq!(signed.hash, TxHash(keccak256(&signed.raw)));

        let rlp = Rlp::new(&signed.raw[1..]);
        assert_eq!(rlp.item_count().unwrap(), 12);
        assert_eq!(rlp.val_at::<u64>(0).unwrap(), CHAIN_ID);
        assert_eq!(rlp.val_at::<u64>(1).unwrap(), 7);
        let parity: u8 = rlp.val_at(9).unwrap();
        let r: Vec<u8> = rlp.val_at(10).unwrap();
        let s: Vec<u8> = rlp.val_at(11).unwrap();

        let recovered = recover(&tx.signing_hash(CHAIN_ID), &r, &s, parity);
        assert_eq!(recovered, signer.address());
    }

    #[test]
    fn test_legacy_signature_uses_eip155_v() {
        let signer = SigningIdentity::from_hex(DEV_KEY).unwrap();
        let tx = request(FeeStrategy::Legacy {
            gas_price: U256::from(25_000_000_000u64),
        });

        let signed = tx.sign(CHAIN_ID, &signer).unwrap();
        let rlp = Rlp::new(&signed.raw);
        assert_eq!(rlp.item_count().unwrap(), 9);

        let v: u64 = rlp.val_at(6).unwrap();
        assert!(v == CHAIN_ID * 2 + 35 || v == CHAIN_ID * 2 + 36);
        let r: Vec<u8> = rlp.val_at(7).unwrap();
        let s: Vec<u8> = rlp.val_at(8).unwrap();

        let parity = (v - CHAIN_ID * 2 - 35) as u8;
        let recovered = recover(&tx.signing_hash(CHAIN_ID), &r, &s, parity);
        assert_eq!(recovered, signer.address());
    }

    #[test]
    fn test_resolve_only_replaces_unspecified() {
        let legacy = FeeStrategy::Legacy {
            gas_price: U256::from(9u64),
        };
        let resolved = request(FeeStrategy::Unspecified).with_resolved_fees(legacy);
        assert_eq!(resolved.fees, legacy);

        let dynamic = FeeStrategy::Dynamic(Eip1559Fees {
            max_fee_per_gas: U256::from(2u64),
            max_priority_fee_per_gas: U256::from(1u64),
        });
        let untouched = request(dynamic).with_resolved_fees(legacy);
        assert_eq!(untouched.fees, dynamic);
    }

    #[test]
    fn test_signing_is_deterministic() {
        let signer = SigningIdentity::from_hex(DEV_KEY).unwrap();
        let tx = request(FeeStrategy::Unspecified);
        let a = tx.sign(CHAIN_ID, &signer).unwrap();
        let b = tx.sign(CHAIN_ID, &signer).unwrap();
        assert_eq!(a, b);
    }
}
