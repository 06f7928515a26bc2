//! # Contract Call Builders
//!
//! Calldata builders for the delegated (`...For`) contract functions. Every
//! write carries the member's typed-data signature so the contract can
//! verify the member authorized the call even though the control plane's
//! hot wallet submits it.

use primitive_types::U256;
use shared_types::Address;

use super::abi::AbiEncoder;

pub const FN_REGISTER_MEMBER: &str = "registerMemberFor(address,uint256,string,string,bytes)";
pub const FN_CREATE_MARKET: &str =
    "createMarketFor(address,uint256,bytes16,address,string,string,address,uint256,uint256,uint256,bytes)";
pub const FN_JOIN_MARKET: &str = "joinMarketFor(address,uint256,bytes16,uint8,string,bytes)";
pub const FN_CREATE_CATALOG: &str = "createCatalogFor(address,uint256,bytes16,string,string,bytes)";
pub const FN_PUBLISH_API: &str =
    "publishApiFor(address,uint256,bytes16,bytes16,string,string,bytes)";

/// A fully encoded contract call, ready to be wrapped in a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractCall {
    /// Target contract.
    pub to: Address,
    /// ABI-encoded calldata.
    pub data: Vec<u8>,
}

pub fn register_member_for(
    contract: &Address,
    member: &Address,
    registered: u64,
    eula: &str,
    profile: &str,
    signature: &[u8],
) -> ContractCall {
    let mut enc = AbiEncoder::new(FN_REGISTER_MEMBER);
    enc.push_address(member)
        .push_u64(registered)
        .push_string(eula)
        .push_string(profile)
        .push_bytes(signature);
    ContractCall {
        to: *contract,
        data: enc.finish(),
    }
}

#[allow(clippy::too_many_arguments)]
pub fn create_market_for(
    contract: &Address,
    member: &Address,
    created: u64,
    market_id: &[u8; 16],
    coin: &Address,
    terms: &str,
    meta: &str,
    maker: &Address,
    provider_security: U256,
    consumer_security: U256,
    market_fee: U256,
    signature: &[u8],
) -> ContractCall {
    let mut enc = AbiEncoder::new(FN_CREATE_MARKET);
    enc.push_address(member)
        .push_u64(created)
        .push_bytes16(market_id)
        .push_address(coin)
        .push_string(terms)
        .push_string(meta)
        .push_address(maker)
        .push_u256(provider_security)
        .push_u256(consumer_security)
        .push_u256(market_fee)
        .push_bytes(signature);
    ContractCall {
        to: *contract,
        data: enc.finish(),
    }
}

pub fn join_market_for(
    contract: &Address,
    member: &Address,
    joined: u64,
    market_id: &[u8; 16],
    actor_type: u8,
    meta: &str,
    signature: &[u8],
) -> ContractCall {
    let mut enc = AbiEncoder::new(FN_JOIN_MARKET);
    enc.push_address(member)
        .push_u64(joined)
        .push_bytes16(market_id)
        .push_u8(actor_type)
        .push_string(meta)
        .push_bytes(signature);
    ContractCall {
        to: *contract,
        data: enc.finish(),
    }
}

pub fn create_catalog_for(
    contract: &Address,
    member: &Address,
    created: u64,
    catalog_id: &[u8; 16],
    terms: &str,
    meta: &str,
    signature: &[u8],
) -> ContractCall {
    let mut enc = AbiEncoder::new(FN_CREATE_CATALOG);
    enc.push_address(member)
        .push_u64(created)
        .push_bytes16(catalog_id)
        .push_string(terms)
        .push_string(meta)
        .push_bytes(signature);
    ContractCall {
        to: *contract,
        data: enc.finish(),
    }
}

#[allow(clippy::too_many_arguments)]
pub fn publish_api_for(
    contract: &Address,
    member: &Address,
    published: u64,
    catalog_id: &[u8; 16],
    api_id: &[u8; 16],
    schema: &str,
    meta: &str,
    signature: &[u8],
) -> ContractCall {
    let mut enc = AbiEncoder::new(FN_PUBLISH_API);
    enc.push_address(member)
        .push_u64(published)
        .push_bytes16(catalog_id)
        .push_bytes16(api_id)
        .push_string(schema)
        .push_string(meta)
        .push_bytes(signature);
    ContractCall {
        to: *contract,
        data: enc.finish(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::abi::selector;

    #[test]
    fn test_calls_carry_their_selector() {
        let call = register_member_for(&[1u8; 20], &[2u8; 20], 7, "e", "p", &[0u8; 65]);
        assert_eq!(&call.data[..4], &selector(FN_REGISTER_MEMBER));
        assert_eq!(call.to, [1u8; 20]);
    }

    #[test]
    fn test_distinct_functions_distinct_selectors() {
        let selectors = [
            selector(FN_REGISTER_MEMBER),
            selector(FN_CREATE_MARKET),
            selector(FN_JOIN_MARKET),
            selector(FN_CREATE_CATALOG),
            selector(FN_PUBLISH_API),
        ];
        for i in 0..selectors.len() {
            for j in (i + 1)..selectors.len() {
                assert_ne!(selectors[i], selectors[j]);
            }
        }
    }
}
