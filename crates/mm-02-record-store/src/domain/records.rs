//! # Record Entities
//!
//! Every value stored in the record store is one of these structs, encoded
//! with bincode. Chain-projected records (members, markets, actors, catalogs,
//! APIs, channels, token movements) are append-only: the event projection
//! inserts them once and never updates them in place. Off-chain records
//! (accounts, user keys, verification actions) are owned by the action
//! workflow.

use serde::{Deserialize, Serialize};
use shared_types::{Address, Hash, Oid, Timestamp, TxHash};

use super::errors::StoreError;

// ============================================================================
// Chain Read-Model
// ============================================================================

/// One scanned ledger block. Written together with the checkpoint in the same
/// transaction that applied the block's events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRecord {
    /// Block number.
    pub number: u64,
    /// Block timestamp (seconds since epoch, as reported by the ledger).
    pub timestamp: u64,
    /// Number of events applied from this block.
    pub cnt_events: u32,
}

/// On-chain member registration, keyed by wallet address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRecord {
    pub address: Address,
    /// Block number at which the registration was observed.
    pub registered: u64,
    /// EULA content hash the member accepted.
    pub eula: String,
    /// Member profile content hash (may be empty).
    pub profile: String,
    /// Membership level reported by the contract.
    pub level: u8,
    /// Transaction that carried the registration.
    pub tx_hash: TxHash,
}

/// On-chain data market, keyed by its 16-byte market id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketRecord {
    pub market_id: [u8; 16],
    /// Wallet of the member that created the market.
    pub owner: Address,
    /// Payment coin contract address.
    pub coin: Address,
    /// Market terms content hash.
    pub terms: String,
    /// Market metadata content hash.
    pub meta: String,
    /// Delegate wallet operating the market.
    pub maker: Address,
    /// Provider security deposit, big-endian 256-bit amount.
    pub provider_security: [u8; 32],
    /// Consumer security deposit, big-endian 256-bit amount.
    pub consumer_security: [u8; 32],
    /// Market fee, big-endian 256-bit amount.
    pub market_fee: [u8; 32],
    /// Block number at which creation was observed.
    pub created: u64,
    pub tx_hash: TxHash,
}

/// A member acting inside a market, keyed by `(market_id, actor, actor_type)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketActor {
    pub market_id: [u8; 16],
    pub actor: Address,
    /// Raw actor type discriminant (see [`shared_types::ActorType`]).
    pub actor_type: u8,
    /// Block number of the join event.
    pub joined: u64,
    /// Security deposit posted by the actor, big-endian 256-bit amount.
    pub security: [u8; 32],
    /// Actor metadata content hash.
    pub meta: String,
    pub tx_hash: TxHash,
}

/// On-chain API catalog, keyed by its 16-byte catalog id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogRecord {
    pub catalog_id: [u8; 16],
    pub owner: Address,
    /// Block number of the creation event.
    pub created: u64,
    pub terms: String,
    pub meta: String,
    pub tx_hash: TxHash,
}

/// An API published into a catalog, keyed by its 16-byte api id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiRecord {
    pub api_id: [u8; 16],
    pub catalog_id: [u8; 16],
    pub owner: Address,
    /// Block number of the publish event.
    pub published: u64,
    /// API schema content hash.
    pub schema: String,
    pub meta: String,
    pub tx_hash: TxHash,
}

/// Payment or paying channel opened inside a market, keyed by channel id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRecord {
    pub channel_id: [u8; 16],
    pub market_id: [u8; 16],
    /// Channel type discriminant (1 = payment, 2 = paying).
    pub channel_type: u8,
    /// Wallet funding the channel.
    pub actor: Address,
    /// Delegate wallet allowed to spend from the channel.
    pub delegate: Address,
    /// Counterparty receiving from the channel.
    pub recipient: Address,
    /// Channel amount, big-endian 256-bit.
    pub amount: [u8; 32],
    /// Block number of the open event.
    pub opened: u64,
    pub tx_hash: TxHash,
}

/// ERC20 `Transfer` observed on the payment coin, keyed by tx hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenTransfer {
    pub tx_hash: TxHash,
    pub from: Address,
    pub to: Address,
    /// Transferred value, big-endian 256-bit.
    pub value: [u8; 32],
    /// Block number of the event.
    pub block_number: u64,
}

/// ERC20 `Approval` observed on the payment coin, keyed by tx hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenApproval {
    pub tx_hash: TxHash,
    pub owner: Address,
    pub spender: Address,
    /// Approved value, big-endian 256-bit.
    pub value: [u8; 32],
    /// Block number of the event.
    pub block_number: u64,
}

// ============================================================================
// Off-Chain Identity
// ============================================================================

/// Off-chain identity bound to a wallet. Created exactly once, as the side
/// effect of a verified onboard action. Unique by username, email and wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub oid: Oid,
    pub username: String,
    pub email: String,
    pub wallet_address: Address,
    /// Wallet type discriminant (see [`shared_types::WalletType`]).
    pub wallet_type: u8,
    /// Nanosecond creation timestamp.
    pub created: Timestamp,
    pub registered: u64,
    pub eula: String,
    pub profile: String,
}

/// A WAMP client public key granted to an account. Onboarding grants the
/// first key; each login grants another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserKey {
    /// Ed25519 client public key, the record key.
    pub pubkey: [u8; 32],
    /// Owning account.
    pub owner: Oid,
    /// Nanosecond timestamp the key was granted.
    pub created: Timestamp,
}

// ============================================================================
// Verification Actions
// ============================================================================

/// The six verifiable action kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionKind {
    OnboardMember,
    LoginMember,
    CreateMarket,
    JoinMarket,
    CreateCatalog,
    PublishApi,
}

impl ActionKind {
    /// Stable wire name, used in result payloads and log markers.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::OnboardMember => "onboard_member",
            ActionKind::LoginMember => "login_member",
            ActionKind::CreateMarket => "create_market",
            ActionKind::JoinMarket => "join_market",
            ActionKind::CreateCatalog => "create_catalog",
            ActionKind::PublishApi => "publish_api",
        }
    }
}

/// Lifecycle of a verification action. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionStatus {
    /// Created, waiting for the out-of-band code.
    Pending,
    /// Correct code presented, local side effects applied.
    Verified,
    /// Ledger transaction broadcast.
    Submitted,
    /// Terminal failure (ledger rejection or expiry).
    Failed,
}

impl ActionStatus {
    /// Check a proposed transition. Statuses only move forward; `Failed` is
    /// reachable from any non-terminal state.
    pub fn transition(self, to: ActionStatus) -> Result<ActionStatus, StoreError> {
        let ok = matches!(
            (self, to),
            (ActionStatus::Pending, ActionStatus::Verified)
                | (ActionStatus::Verified, ActionStatus::Submitted)
                | (ActionStatus::Pending, ActionStatus::Failed)
                | (ActionStatus::Verified, ActionStatus::Failed)
        );
        if ok {
            Ok(to)
        } else {
            Err(StoreError::IllegalTransition { from: self, to })
        }
    }
}

/// A pending intent awaiting out-of-band confirmation, keyed by oid.
///
/// The payload is captured once at creation and never mutated afterwards;
/// only `status` changes, and only through [`ActionStatus::transition`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationAction {
    pub oid: Oid,
    pub kind: ActionKind,
    pub status: ActionStatus,
    /// One-time activation code, exact-match.
    pub code: String,
    /// Nanosecond creation timestamp, used for expiry.
    pub created: Timestamp,
    /// Opaque action parameters, bincode-encoded by the workflow.
    pub payload: Vec<u8>,
}
