//! # Action Tuples
//!
//! One strongly-typed struct per signable action kind. The field order inside
//! `encode_data` and the `TYPE_STRING` constants are the wire contract:
//! clients compute signatures over exactly these tuples, in exactly this
//! order. Do not reorder fields.

use primitive_types::U256;
use shared_types::Address;

use super::typed_data::{
    push_address, push_bytes16, push_bytes32, push_string, push_u256, push_u64,
};

/// A fixed, ordered tuple of action-specific fields that can be hashed and
/// signed as typed data.
pub trait TypedAction {
    /// The canonical type string, hashed into the struct hash.
    const TYPE_STRING: &'static str;

    /// Append the encoded field words, in declaration order.
    fn encode_data(&self, out: &mut Vec<u8>);
}

/// Onboarding: register a new member wallet with the network contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberRegister {
    pub chain_id: u64,
    pub verifying_contract: Address,
    pub member: Address,
    /// Block number at signing time.
    pub registered: u64,
    /// Content hash of the accepted EULA.
    pub eula: String,
    /// Content hash of the off-chain member profile (may be empty).
    pub profile: String,
}

impl TypedAction for MemberRegister {
    const TYPE_STRING: &'static str = "MemberRegister(uint256 chainId,address verifyingContract,address member,uint256 registered,string eula,string profile)";

    fn encode_data(&self, out: &mut Vec<u8>) {
        push_u64(out, self.chain_id);
        push_address(out, &self.verifying_contract);
        push_address(out, &self.member);
        push_u64(out, self.registered);
        push_string(out, &self.eula);
        push_string(out, &self.profile);
    }
}

/// Login: bind a new client public key to an existing member account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberLogin {
    pub chain_id: u64,
    pub verifying_contract: Address,
    pub member: Address,
    /// Block number at signing time.
    pub logged_in: u64,
    /// Client wall-clock timestamp (ns).
    pub timestamp: u64,
    pub member_email: String,
    /// WAMP client public key to authorize (32 bytes).
    pub client_pubkey: [u8; 32],
}

impl TypedAction for MemberLogin {
    const TYPE_STRING: &'static str = "MemberLogin(uint256 chainId,address verifyingContract,address member,uint256 loggedIn,uint256 timestamp,string memberEmail,bytes32 clientPubkey)";

    fn encode_data(&self, out: &mut Vec<u8>) {
        push_u64(out, self.chain_id);
        push_address(out, &self.verifying_contract);
        push_address(out, &self.member);
        push_u64(out, self.logged_in);
        push_u64(out, self.timestamp);
        push_string(out, &self.member_email);
        push_bytes32(out, &self.client_pubkey);
    }
}

/// Create a new data market.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketCreate {
    pub chain_id: u64,
    pub verifying_contract: Address,
    pub member: Address,
    /// Block number at signing time.
    pub created: u64,
    pub market_id: [u8; 16],
    /// Payment token contract for this market.
    pub coin: Address,
    /// Content hash of the market terms.
    pub terms: String,
    /// Content hash of the off-chain market metadata.
    pub meta: String,
    /// Wallet of the market maker service that will operate this market.
    pub maker: Address,
    pub provider_security: U256,
    pub consumer_security: U256,
    pub market_fee: U256,
}

impl TypedAction for MarketCreate {
    const TYPE_STRING: &'static str = "MarketCreate(uint256 chainId,address verifyingContract,address member,uint256 created,bytes16 marketId,address coin,string terms,string meta,address maker,uint256 providerSecurity,uint256 consumerSecurity,uint256 marketFee)";

    fn encode_data(&self, out: &mut Vec<u8>) {
        push_u64(out, self.chain_id);
        push_address(out, &self.verifying_contract);
        push_address(out, &self.member);
        push_u64(out, self.created);
        push_bytes16(out, &self.market_id);
        push_address(out, &self.coin);
        push_string(out, &self.terms);
        push_string(out, &self.meta);
        push_address(out, &self.maker);
        push_u256(out, self.provider_security);
        push_u256(out, self.consumer_security);
        push_u256(out, self.market_fee);
    }
}

/// Join an existing data market as a provider and/or consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketJoin {
    pub chain_id: u64,
    pub verifying_contract: Address,
    pub member: Address,
    /// Block number at signing time.
    pub joined: u64,
    pub market_id: [u8; 16],
    /// Contract ordinal of the actor role.
    pub actor_type: u8,
    /// Content hash of the off-chain actor metadata.
    pub meta: String,
}

impl TypedAction for MarketJoin {
    const TYPE_STRING: &'static str = "MarketJoin(uint256 chainId,address verifyingContract,address member,uint256 joined,bytes16 marketId,uint8 actorType,string meta)";

    fn encode_data(&self, out: &mut Vec<u8>) {
        push_u64(out, self.chain_id);
        push_address(out, &self.verifying_contract);
        push_address(out, &self.member);
        push_u64(out, self.joined);
        push_bytes16(out, &self.market_id);
        push_u64(out, self.actor_type as u64);
        push_string(out, &self.meta);
    }
}

/// Create a new API catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogCreate {
    pub chain_id: u64,
    pub verifying_contract: Address,
    pub member: Address,
    /// Block number at signing time.
    pub created: u64,
    pub catalog_id: [u8; 16],
    /// Content hash of the catalog terms.
    pub terms: String,
    /// Content hash of the off-chain catalog metadata.
    pub meta: String,
}

impl TypedAction for CatalogCreate {
    const TYPE_STRING: &'static str = "CatalogCreate(uint256 chainId,address verifyingContract,address member,uint256 created,bytes16 catalogId,string terms,string meta)";

    fn encode_data(&self, out: &mut Vec<u8>) {
        push_u64(out, self.chain_id);
        push_address(out, &self.verifying_contract);
        push_address(out, &self.member);
        push_u64(out, self.created);
        push_bytes16(out, &self.catalog_id);
        push_string(out, &self.terms);
        push_string(out, &self.meta);
    }
}

/// Publish an API into a catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiPublish {
    pub chain_id: u64,
    pub verifying_contract: Address,
    pub member: Address,
    /// Block number at signing time.
    pub published: u64,
    pub catalog_id: [u8; 16],
    pub api_id: [u8; 16],
    /// Content hash of the API schema blob.
    pub schema: String,
    /// Content hash of the off-chain API metadata.
    pub meta: String,
}

impl TypedAction for ApiPublish {
    const TYPE_STRING: &'static str = "ApiPublish(uint256 chainId,address verifyingContract,address member,uint256 published,bytes16 catalogId,bytes16 apiId,string schema,string meta)";

    fn encode_data(&self, out: &mut Vec<u8>) {
        push_u64(out, self.chain_id);
        push_address(out, &self.verifying_contract);
        push_address(out, &self.member);
        push_u64(out, self.published);
        push_bytes16(out, &self.catalog_id);
        push_bytes16(out, &self.api_id);
        push_string(out, &self.schema);
        push_string(out, &self.meta);
    }
}
