//! # Signing Test Helpers
//!
//! Key generation and typed-data signing for tests. Clients sign over the
//! exact tuples in [`crate::domain::actions`], so these helpers double as a
//! reference signer implementation.

use k256::ecdsa::{SigningKey, VerifyingKey};
use shared_types::{Address, Hash};

use crate::domain::actions::TypedAction;
use crate::domain::recovery::{address_from_pubkey, Signature65};
use crate::domain::typed_data::signing_digest;

/// Generate a fresh secp256k1 keypair.
pub fn generate_keypair() -> (SigningKey, VerifyingKey) {
    let signing_key = SigningKey::random(&mut rand::thread_rng());
    let verifying_key = *signing_key.verifying_key();
    (signing_key, verifying_key)
}

/// Address of a verifying key.
pub fn address_of(vk: &VerifyingKey) -> Address {
    address_from_pubkey(vk)
}

/// Sign a 32-byte digest, producing a compact `r || s || v` signature with a
/// low-S value and `v` in `{27, 28}`.
pub fn sign_digest(digest: &Hash, sk: &SigningKey) -> Signature65 {
    // Signing over a fixed digest cannot fail for a valid key.
    let (sig, recid) = sk
        .sign_prehash_recoverable(digest)
        .expect("signing failed");

    // Normalize to low-S; flipping S flips the recovered point's parity.
    let (sig, recid_byte) = match sig.normalize_s() {
        Some(normalized) => (normalized, recid.to_byte() ^ 1),
        None => (sig, recid.to_byte()),
    };

    let mut raw = [0u8; 65];
    raw[..64].copy_from_slice(&sig.to_bytes());
    raw[64] = 27 + recid_byte;
    Signature65(raw)
}

/// Sign a typed action with a private key.
pub fn sign_typed<T: TypedAction>(action: &T, sk: &SigningKey) -> Signature65 {
    sign_digest(&signing_digest(action), sk)
}
