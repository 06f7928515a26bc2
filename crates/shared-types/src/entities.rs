//! # Core Entities
//!
//! Wire-level primitives shared by all MeshMarket subsystems.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A 20-byte Ethereum-style account or contract address.
pub type Address = [u8; 20];

/// A 32-byte hash (Keccak256 digests, block hashes, content hashes).
pub type Hash = [u8; 32];

/// A 32-byte ledger transaction hash.
pub type TxHash = [u8; 32];

/// A 128-bit object identifier, caller-opaque (verification actions,
/// accounts, markets, catalogs, APIs).
pub type Oid = Uuid;

/// Nanoseconds since the Unix epoch.
pub type Timestamp = u64;

/// The zero address (never a valid signer).
pub const ZERO_ADDRESS: Address = [0u8; 20];

/// Current wall-clock time in nanoseconds since the Unix epoch.
pub fn now_ns() -> Timestamp {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

/// Render an address as lowercase `0x`-prefixed hex.
pub fn hex_address(adr: &Address) -> String {
    format!("0x{}", hex::encode(adr))
}

/// Render a 32-byte hash as lowercase `0x`-prefixed hex.
pub fn hex_hash(hash: &Hash) -> String {
    format!("0x{}", hex::encode(hash))
}

/// Parse a `0x`-prefixed or bare hex string into an address.
pub fn parse_address(s: &str) -> Option<Address> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(s).ok()?;
    let arr: Address = bytes.try_into().ok()?;
    Some(arr)
}

/// Role of an actor inside a data market.
///
/// Values match the on-chain contract enum ordinals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ActorType {
    /// Sells data services into the market.
    Provider = 1,
    /// Buys data services from the market.
    Consumer = 2,
    /// Both provider and consumer.
    ProviderConsumer = 3,
}

impl ActorType {
    /// Decode a contract ordinal; `None` for anything out of range.
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            1 => Some(ActorType::Provider),
            2 => Some(ActorType::Consumer),
            3 => Some(ActorType::ProviderConsumer),
            _ => None,
        }
    }
}

/// Wallet custody type of an account, as claimed at onboarding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum WalletType {
    /// Key held in an in-browser / client-side wallet (e.g. Metamask).
    Metamask = 1,
    /// Key imported directly.
    Imported = 2,
    /// Key held on a hardware device.
    Hardware = 3,
}

impl WalletType {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            1 => Some(WalletType::Metamask),
            2 => Some(WalletType::Imported),
            3 => Some(WalletType::Hardware),
            _ => None,
        }
    }
}
