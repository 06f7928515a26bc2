//! # Requests, Captured Payloads and Results
//!
//! A `*Request` is what the client submits to `create_*`, a `*Payload` is
//! the immutable snapshot captured inside the verification action, and the
//! result structs are what callers get back. Payloads are bincode-encoded
//! into [`mm_02_record_store::VerificationAction::payload`] and never
//! mutated after creation.

use mm_01_signature_verification::Signature65;
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use shared_types::{Address, Oid, Timestamp, TxHash};

// ============================================================================
// Requests
// ============================================================================

#[derive(Debug, Clone)]
pub struct OnboardMemberRequest {
    pub username: String,
    pub email: String,
    pub member: Address,
    pub wallet_type: u8,
    /// Block number at signing time.
    pub registered: u64,
    pub eula: String,
    pub profile: String,
    /// WAMP client key to link to the new account.
    pub client_pubkey: [u8; 32],
    pub signature: Signature65,
}

#[derive(Debug, Clone)]
pub struct LoginMemberRequest {
    pub member: Address,
    /// Block number at signing time.
    pub logged_in: u64,
    /// Client wall-clock timestamp (ns).
    pub timestamp: u64,
    pub member_email: String,
    pub client_pubkey: [u8; 32],
    pub signature: Signature65,
}

#[derive(Debug, Clone)]
pub struct CreateMarketRequest {
    pub member: Address,
    pub created: u64,
    pub market_id: [u8; 16],
    pub coin: Address,
    pub terms: String,
    pub meta: String,
    pub maker: Address,
    pub provider_security: U256,
    pub consumer_security: U256,
    pub market_fee: U256,
    pub signature: Signature65,
}

#[derive(Debug, Clone)]
pub struct JoinMarketRequest {
    pub member: Address,
    pub joined: u64,
    pub market_id: [u8; 16],
    pub actor_type: u8,
    pub meta: String,
    pub signature: Signature65,
}

#[derive(Debug, Clone)]
pub struct CreateCatalogRequest {
    pub member: Address,
    pub created: u64,
    pub catalog_id: [u8; 16],
    pub terms: String,
    pub meta: String,
    /// Off-chain metadata blob; must hash to `meta`.
    pub attributes: Option<Vec<u8>>,
    pub signature: Signature65,
}

#[derive(Debug, Clone)]
pub struct PublishApiRequest {
    pub member: Address,
    pub published: u64,
    pub catalog_id: [u8; 16],
    pub api_id: [u8; 16],
    pub schema: String,
    pub meta: String,
    /// API schema blob; must hash to `schema`.
    pub schema_blob: Option<Vec<u8>>,
    pub signature: Signature65,
}

// ============================================================================
// Captured Payloads
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnboardPayload {
    pub username: String,
    pub email: String,
    pub member: Address,
    pub wallet_type: u8,
    pub registered: u64,
    pub eula: String,
    pub profile: String,
    pub client_pubkey: [u8; 32],
    pub signature: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginPayload {
    /// Account resolved at create time.
    pub account_oid: Oid,
    pub member: Address,
    pub member_email: String,
    pub client_pubkey: [u8; 32],
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateMarketPayload {
    pub member: Address,
    pub created: u64,
    pub market_id: [u8; 16],
    pub coin: Address,
    pub terms: String,
    pub meta: String,
    pub maker: Address,
    pub provider_security: U256,
    pub consumer_security: U256,
    pub market_fee: U256,
    pub signature: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinMarketPayload {
    pub member: Address,
    pub joined: u64,
    pub market_id: [u8; 16],
    pub actor_type: u8,
    pub meta: String,
    pub signature: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateCatalogPayload {
    pub member: Address,
    pub created: u64,
    pub catalog_id: [u8; 16],
    pub terms: String,
    pub meta: String,
    pub signature: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishApiPayload {
    pub member: Address,
    pub published: u64,
    pub catalog_id: [u8; 16],
    pub api_id: [u8; 16],
    pub schema: String,
    pub meta: String,
    pub signature: Vec<u8>,
}

// ============================================================================
// Results
// ============================================================================

/// Result of every `create_*` call. Deliberately uniform across kinds and
/// branches (including the onboard-to-login fallback), so the response
/// shape leaks nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateActionResult {
    /// Wire name of the action actually created.
    pub action: &'static str,
    pub vaction_oid: Oid,
    /// Nanosecond timestamp of the submission.
    pub timestamp: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnboardVerified {
    pub member_oid: Oid,
    pub created: Timestamp,
    pub tx_hash: TxHash,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginVerified {
    pub member_oid: Oid,
    pub client_pubkey: [u8; 32],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketVerified {
    pub market_id: [u8; 16],
    pub tx_hash: TxHash,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinVerified {
    pub market_id: [u8; 16],
    pub actor_type: u8,
    pub tx_hash: TxHash,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogVerified {
    pub catalog_id: [u8; 16],
    pub tx_hash: TxHash,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiVerified {
    pub catalog_id: [u8; 16],
    pub api_id: [u8; 16],
    pub tx_hash: TxHash,
}
