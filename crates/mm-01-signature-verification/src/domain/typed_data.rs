//! # Typed-Data Hashing
//!
//! EIP-712 style structured hashing: a domain separator binds signatures to
//! this application, a per-struct type hash binds them to one action kind and
//! field ordering, and the final signing digest is
//! `keccak256(0x19 0x01 || domain_separator || struct_hash)`.
//!
//! The byte layout here is part of the wire contract: clients sign over the
//! exact same encoding, so any change to a type string or to the word
//! encoding breaks every deployed signer.

use primitive_types::U256;
use shared_types::{Address, Hash};

use super::actions::TypedAction;
use super::recovery::keccak256;

/// Application name bound into the domain separator.
pub const DOMAIN_NAME: &str = "MeshMarket";

/// Typed-data domain version.
pub const DOMAIN_VERSION: &str = "1";

/// `keccak256("EIP712Domain(string name,string version)")` style domain
/// separator over the application name and version. Chain id and verifying
/// contract are message fields of every action tuple instead, so one domain
/// separator covers all configured networks.
pub fn domain_separator() -> Hash {
    let type_hash = keccak256(b"EIP712Domain(string name,string version)");
    let mut encoded = Vec::with_capacity(96);
    encoded.extend_from_slice(&type_hash);
    encoded.extend_from_slice(&keccak256(DOMAIN_NAME.as_bytes()));
    encoded.extend_from_slice(&keccak256(DOMAIN_VERSION.as_bytes()));
    keccak256(&encoded)
}

/// Compute the 32-byte signing digest for one typed action.
pub fn signing_digest<T: TypedAction>(action: &T) -> Hash {
    let struct_hash = hash_struct(action);
    let mut preimage = Vec::with_capacity(2 + 32 + 32);
    preimage.extend_from_slice(&[0x19, 0x01]);
    preimage.extend_from_slice(&domain_separator());
    preimage.extend_from_slice(&struct_hash);
    keccak256(&preimage)
}

/// `keccak256(type_hash || encode_data(action))`.
pub fn hash_struct<T: TypedAction>(action: &T) -> Hash {
    let type_hash = keccak256(T::TYPE_STRING.as_bytes());
    let mut encoded = Vec::with_capacity(32 + 32 * 12);
    encoded.extend_from_slice(&type_hash);
    action.encode_data(&mut encoded);
    keccak256(&encoded)
}

// Word encoders. Every atomic field occupies exactly one 32-byte word;
// dynamic fields (string/bytes) are represented by their keccak256.

/// Append a `uint256` word.
pub fn push_u256(out: &mut Vec<u8>, value: U256) {
    let mut word = [0u8; 32];
    value.to_big_endian(&mut word);
    out.extend_from_slice(&word);
}

/// Append a `uint256` word from a u64.
pub fn push_u64(out: &mut Vec<u8>, value: u64) {
    push_u256(out, U256::from(value));
}

/// Append an `address` word (left-padded to 32 bytes).
pub fn push_address(out: &mut Vec<u8>, adr: &Address) {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(adr);
    out.extend_from_slice(&word);
}

/// Append a `bytes16` word (right-padded to 32 bytes).
pub fn push_bytes16(out: &mut Vec<u8>, value: &[u8; 16]) {
    let mut word = [0u8; 32];
    word[..16].copy_from_slice(value);
    out.extend_from_slice(&word);
}

/// Append a `bytes32` word.
pub fn push_bytes32(out: &mut Vec<u8>, value: &[u8; 32]) {
    out.extend_from_slice(value);
}

/// Append the hash word of a dynamic `string` field.
pub fn push_string(out: &mut Vec<u8>, value: &str) {
    out.extend_from_slice(&keccak256(value.as_bytes()));
}
