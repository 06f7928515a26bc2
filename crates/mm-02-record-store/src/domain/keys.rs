//! # Key Codecs
//!
//! Byte-level key layouts for every table. Block keys are namespaced per
//! scanner instance and fixed-width big-endian so that ordered range scans
//! recover the checkpoint (the highest key in a namespace is the last block
//! fully applied).

use shared_types::{Address, Oid, TxHash};

/// Separator between a scanner namespace and the block number.
const NS_SEP: u8 = 0x00;

/// Block key: `namespace || 0x00 || u64-BE block number`.
///
/// The fixed-width big-endian suffix makes lexicographic order equal numeric
/// order within a namespace.
pub fn block_key(namespace: &str, number: u64) -> Vec<u8> {
    let mut key = Vec::with_capacity(namespace.len() + 1 + 8);
    key.extend_from_slice(namespace.as_bytes());
    key.push(NS_SEP);
    key.extend_from_slice(&number.to_be_bytes());
    key
}

/// Prefix covering every block key of one scanner namespace.
pub fn block_prefix(namespace: &str) -> Vec<u8> {
    let mut prefix = Vec::with_capacity(namespace.len() + 1);
    prefix.extend_from_slice(namespace.as_bytes());
    prefix.push(NS_SEP);
    prefix
}

/// Extract the block number from a key produced by [`block_key`].
pub fn block_number_from_key(key: &[u8]) -> Option<u64> {
    if key.len() < 9 {
        return None;
    }
    let tail: [u8; 8] = key[key.len() - 8..].try_into().ok()?;
    if key[key.len() - 9] != NS_SEP {
        return None;
    }
    Some(u64::from_be_bytes(tail))
}

/// Key for records identified by a 128-bit oid (accounts, actions).
pub fn oid_key(oid: &Oid) -> Vec<u8> {
    oid.as_bytes().to_vec()
}

/// Key for records identified by a wallet address (members).
pub fn address_key(address: &Address) -> Vec<u8> {
    address.to_vec()
}

/// Key for records identified by a 16-byte entity id (markets, catalogs,
/// APIs, channels).
pub fn id16_key(id: &[u8; 16]) -> Vec<u8> {
    id.to_vec()
}

/// Key for records identified by a transaction hash (token movements).
pub fn tx_key(tx_hash: &TxHash) -> Vec<u8> {
    tx_hash.to_vec()
}

/// Market actor key: `market_id || actor || actor_type`.
pub fn actor_key(market_id: &[u8; 16], actor: &Address, actor_type: u8) -> Vec<u8> {
    let mut key = Vec::with_capacity(16 + 20 + 1);
    key.extend_from_slice(market_id);
    key.extend_from_slice(actor);
    key.push(actor_type);
    key
}

/// Prefix covering every actor of one market.
pub fn actor_prefix(market_id: &[u8; 16]) -> Vec<u8> {
    market_id.to_vec()
}

/// Secondary index key over a string field (username, email). The value
/// stored under an index key is the owning account oid.
pub fn string_index_key(value: &str) -> Vec<u8> {
    value.as_bytes().to_vec()
}

/// Index key binding a maker wallet to its market id.
pub fn maker_index_key(maker: &Address) -> Vec<u8> {
    maker.to_vec()
}
