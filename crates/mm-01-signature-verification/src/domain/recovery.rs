//! # Address Recovery (secp256k1)
//!
//! Recovery of an Ethereum-style address from a 65-byte `r || s || v`
//! signature over a 32-byte signing digest. Uses the `k256` crate for the
//! curve arithmetic and Keccak256 for address derivation.

use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use sha3::{Digest, Keccak256};
use shared_types::{Address, Hash};

use super::errors::SignatureError;

/// A 65-byte compact signature: `r (32) || s (32) || v (1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature65(pub [u8; 65]);

impl Signature65 {
    /// Parse from a byte slice; rejects anything that is not exactly 65 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, SignatureError> {
        let arr: [u8; 65] = bytes.try_into().map_err(|_| SignatureError::InvalidFormat)?;
        Ok(Self(arr))
    }

    pub fn r(&self) -> &[u8] {
        &self.0[..32]
    }

    pub fn s(&self) -> &[u8] {
        &self.0[32..64]
    }

    pub fn v(&self) -> u8 {
        self.0[64]
    }

    pub fn as_bytes(&self) -> &[u8; 65] {
        &self.0
    }
}

/// Keccak256 hash.
pub fn keccak256(data: &[u8]) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    let out = hasher.finalize();
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&out);
    hash
}

/// Derive the Ethereum-style address of a public key: the last 20 bytes of
/// the Keccak256 of the uncompressed point (without the 0x04 prefix).
pub fn address_from_pubkey(public_key: &VerifyingKey) -> Address {
    let point = public_key.to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);
    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..]);
    address
}

/// Recover the signer address from a signature over `digest`.
pub fn recover_address(digest: &Hash, signature: &Signature65) -> Result<Address, SignatureError> {
    let recovery_id = parse_recovery_id(signature.v())?;

    let sig =
        Signature::from_slice(&signature.0[..64]).map_err(|_| SignatureError::InvalidFormat)?;

    let recovered = VerifyingKey::recover_from_prehash(digest, &sig, recovery_id)
        .map_err(|_| SignatureError::RecoveryFailed)?;

    Ok(address_from_pubkey(&recovered))
}

/// Parse a recovery id from a `v` byte. Valid values: 0, 1, 27, 28.
fn parse_recovery_id(v: u8) -> Result<RecoveryId, SignatureError> {
    let id = match v {
        0 | 27 => 0u8,
        1 | 28 => 1u8,
        _ => return Err(SignatureError::InvalidRecoveryId(v)),
    };
    RecoveryId::try_from(id).map_err(|_| SignatureError::InvalidRecoveryId(v))
}
