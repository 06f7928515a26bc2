//! # Transaction Encoding and Signing
//!
//! Legacy (pre-typed) ledger transactions with replay-protected signatures:
//! the signing digest is the keccak256 of the RLP list
//! `(nonce, gasPrice, gas, to, value, data, chainId, 0, 0)` and the final
//! wire form replaces the last three items with `(v, r, s)` where
//! `v = chainId * 2 + 35 + recoveryId`.

use k256::ecdsa::SigningKey;
use mm_01_signature_verification::keccak256;
use primitive_types::U256;
use rlp::RlpStream;
use shared_types::{Address, Hash, TxHash};

use super::errors::LedgerError;

/// An unsigned contract call transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyTransaction {
    pub nonce: u64,
    pub gas_price: U256,
    pub gas_limit: u64,
    pub to: Address,
    pub value: U256,
    pub data: Vec<u8>,
}

/// Minimal big-endian representation of a U256 (empty for zero), which is
/// how RLP expects integers.
fn uint_bytes(value: &U256) -> Vec<u8> {
    let mut buf = [0u8; 32];
    value.to_big_endian(&mut buf);
    let first = buf.iter().position(|b| *b != 0).unwrap_or(32);
    buf[first..].to_vec()
}

fn append_uint(stream: &mut RlpStream, value: &U256) {
    stream.append(&uint_bytes(value));
}

fn append_u64(stream: &mut RlpStream, value: u64) {
    append_uint(stream, &U256::from(value));
}

impl LegacyTransaction {
    /// Replay-protected signing digest for `chain_id`.
    pub fn signing_digest(&self, chain_id: u64) -> Hash {
        let mut stream = RlpStream::new_list(9);
        append_u64(&mut stream, self.nonce);
        append_uint(&mut stream, &self.gas_price);
        append_u64(&mut stream, self.gas_limit);
        stream.append(&self.to.as_slice());
        append_uint(&mut stream, &self.value);
        stream.append(&self.data);
        append_u64(&mut stream, chain_id);
        stream.append_empty_data();
        stream.append_empty_data();
        keccak256(&stream.out())
    }

    /// Sign and produce the raw wire bytes ready for broadcast, plus the
    /// transaction hash (keccak256 of those bytes).
    pub fn sign(&self, key: &SigningKey, chain_id: u64) -> Result<(Vec<u8>, TxHash), LedgerError> {
        let digest = self.signing_digest(chain_id);
        let (sig, recid) = key
            .sign_prehash_recoverable(&digest)
            .map_err(|e| LedgerError::Signing {
                message: e.to_string(),
            })?;

        // Low-S normalization flips the recovered point's parity.
        let (sig, recid_byte) = match sig.normalize_s() {
            Some(normalized) => (normalized, recid.to_byte() ^ 1),
            None => (sig, recid.to_byte()),
        };

        let v = chain_id * 2 + 35 + u64::from(recid_byte);
        let bytes = sig.to_bytes();
        let r = U256::from_big_endian(&bytes[..32]);
        let s = U256::from_big_endian(&bytes[32..]);

        let mut stream = RlpStream::new_list(9);
        append_u64(&mut stream, self.nonce);
        append_uint(&mut stream, &self.gas_price);
        append_u64(&mut stream, self.gas_limit);
        stream.append(&self.to.as_slice());
        append_uint(&mut stream, &self.value);
        stream.append(&self.data);
        append_u64(&mut stream, v);
        append_uint(&mut stream, &r);
        append_uint(&mut stream, &s);

        let raw = stream.out().to_vec();
        let tx_hash = keccak256(&raw);
        Ok((raw, tx_hash))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mm_01_signature_verification::testing::generate_keypair;

    fn sample_tx() -> LegacyTransaction {
        LegacyTransaction {
            nonce: 9,
            gas_price: U256::from(20_000_000_000u64),
            gas_limit: 21000,
            to: [0x35; 20],
            value: U256::zero(),
            data: vec![0xde, 0xad],
        }
    }

    #[test]
    fn test_uint_bytes_minimal() {
        assert!(uint_bytes(&U256::zero()).is_empty());
        assert_eq!(uint_bytes(&U256::from(1)), vec![1]);
        assert_eq!(uint_bytes(&U256::from(0x0100)), vec![1, 0]);
    }

    #[test]
    fn test_digest_depends_on_chain_id() {
        let tx = sample_tx();
        assert_ne!(tx.signing_digest(1), tx.signing_digest(4));
    }

    #[test]
    fn test_digest_is_deterministic() {
        let tx = sample_tx();
        assert_eq!(tx.signing_digest(1), tx.signing_digest(1));
    }

    #[test]
    fn test_signed_v_encodes_chain_id() {
        let (sk, _) = generate_keypair();
        let chain_id = 1337u64;
        let tx = sample_tx();
        let (raw, _) = tx.sign(&sk, chain_id).unwrap();

        // v must be one of chainId*2+35 or chainId*2+36.
        let decoded = rlp::Rlp::new(&raw);
        let v: u64 = decoded.val_at(6).unwrap();
        assert!(v == chain_id * 2 + 35 || v == chain_id * 2 + 36);
    }

    #[test]
    fn test_tx_hash_differs_per_nonce() {
        let (sk, _) = generate_keypair();
        let tx_a = sample_tx();
        let mut tx_b = sample_tx();
        tx_b.nonce = 10;
        let (_, hash_a) = tx_a.sign(&sk, 1).unwrap();
        let (_, hash_b) = tx_b.sign(&sk, 1).unwrap();
        assert_ne!(hash_a, hash_b);
    }
}
