//! # Typed Chain Events
//!
//! Decoding of raw logs into the closed set of events the synchronizer
//! projects. `topics[0]` selects the event; indexed args come from the
//! remaining topics, everything else from the ABI-encoded data section.
//!
//! Logs whose `topics[0]` is not in the set decode to `None` and are skipped
//! by the scanner (contracts emit more events than the read-model tracks).

use primitive_types::U256;
use shared_types::Address;

use super::abi::{address_from_topic, bytes16_from_topic, event_topic, AbiReader};
use super::errors::LedgerError;
use super::logs::Log;

/// Event signature strings. Argument order matches the contract
/// declarations; changing one changes its topic hash and silently drops the
/// event, so they are pinned by tests.
pub const SIG_TRANSFER: &str = "Transfer(address,address,uint256)";
pub const SIG_APPROVAL: &str = "Approval(address,address,uint256)";
pub const SIG_MEMBER_REGISTERED: &str = "MemberRegistered(address,uint256,string,string,uint8)";
pub const SIG_MARKET_CREATED: &str =
    "MarketCreated(bytes16,address,uint256,address,string,string,address,uint256,uint256,uint256)";
pub const SIG_ACTOR_JOINED: &str = "ActorJoined(bytes16,address,uint8,uint256,uint256,string)";
pub const SIG_CATALOG_CREATED: &str = "CatalogCreated(bytes16,address,uint256,string,string)";
pub const SIG_API_PUBLISHED: &str = "ApiPublished(bytes16,bytes16,address,uint256,string,string)";
pub const SIG_CHANNEL_OPENED: &str =
    "ChannelOpened(bytes16,bytes16,uint8,address,address,address,uint256,uint256)";

/// A decoded event, ready for projection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainEvent {
    /// ERC20 transfer on the payment coin.
    Transfer {
        from: Address,
        to: Address,
        value: U256,
    },
    /// ERC20 approval on the payment coin.
    Approval {
        owner: Address,
        spender: Address,
        value: U256,
    },
    MemberRegistered {
        member: Address,
        registered: u64,
        eula: String,
        profile: String,
        level: u8,
    },
    MarketCreated {
        market_id: [u8; 16],
        owner: Address,
        created: u64,
        coin: Address,
        terms: String,
        meta: String,
        maker: Address,
        provider_security: U256,
        consumer_security: U256,
        market_fee: U256,
    },
    ActorJoined {
        market_id: [u8; 16],
        actor: Address,
        actor_type: u8,
        joined: u64,
        security: U256,
        meta: String,
    },
    CatalogCreated {
        catalog_id: [u8; 16],
        owner: Address,
        created: u64,
        terms: String,
        meta: String,
    },
    ApiPublished {
        catalog_id: [u8; 16],
        api_id: [u8; 16],
        owner: Address,
        published: u64,
        schema: String,
        meta: String,
    },
    ChannelOpened {
        channel_id: [u8; 16],
        market_id: [u8; 16],
        channel_type: u8,
        actor: Address,
        delegate: Address,
        recipient: Address,
        amount: U256,
        opened: u64,
    },
}

impl ChainEvent {
    /// Short name used in log output.
    pub fn name(&self) -> &'static str {
        match self {
            ChainEvent::Transfer { .. } => "Transfer",
            ChainEvent::Approval { .. } => "Approval",
            ChainEvent::MemberRegistered { .. } => "MemberRegistered",
            ChainEvent::MarketCreated { .. } => "MarketCreated",
            ChainEvent::ActorJoined { .. } => "ActorJoined",
            ChainEvent::CatalogCreated { .. } => "CatalogCreated",
            ChainEvent::ApiPublished { .. } => "ApiPublished",
            ChainEvent::ChannelOpened { .. } => "ChannelOpened",
        }
    }
}

fn topic(log: &Log, index: usize) -> Result<&[u8; 32], LedgerError> {
    log.topics.get(index).ok_or_else(|| LedgerError::MalformedLog {
        message: format!("missing topic {}", index),
    })
}

/// Decode a raw log. `Ok(None)` means the event is not one the read-model
/// tracks; `Err` means the log claims a known signature but its payload does
/// not fit it.
pub fn decode_log(log: &Log) -> Result<Option<ChainEvent>, LedgerError> {
    let topic0 = match log.topics.first() {
        Some(t) => *t,
        None => return Ok(None),
    };

    let reader = AbiReader::new(&log.data);

    let event = if topic0 == event_topic(SIG_TRANSFER) {
        ChainEvent::Transfer {
            from: address_from_topic(topic(log, 1)?),
            to: address_from_topic(topic(log, 2)?),
            value: reader.u256_at(0)?,
        }
    } else if topic0 == event_topic(SIG_APPROVAL) {
        ChainEvent::Approval {
            owner: address_from_topic(topic(log, 1)?),
            spender: address_from_topic(topic(log, 2)?),
            value: reader.u256_at(0)?,
        }
    } else if topic0 == event_topic(SIG_MEMBER_REGISTERED) {
        ChainEvent::MemberRegistered {
            member: address_from_topic(topic(log, 1)?),
            registered: reader.u64_at(0)?,
            eula: reader.string_at(1)?,
            profile: reader.string_at(2)?,
            level: reader.u8_at(3)?,
        }
    } else if topic0 == event_topic(SIG_MARKET_CREATED) {
        ChainEvent::MarketCreated {
            market_id: bytes16_from_topic(topic(log, 1)?),
            owner: reader.address_at(0)?,
            created: reader.u64_at(1)?,
            coin: reader.address_at(2)?,
            terms: reader.string_at(3)?,
            meta: reader.string_at(4)?,
            maker: reader.address_at(5)?,
            provider_security: reader.u256_at(6)?,
            consumer_security: reader.u256_at(7)?,
            market_fee: reader.u256_at(8)?,
        }
    } else if topic0 == event_topic(SIG_ACTOR_JOINED) {
        ChainEvent::ActorJoined {
            market_id: bytes16_from_topic(topic(log, 1)?),
            actor: reader.address_at(0)?,
            actor_type: reader.u8_at(1)?,
            joined: reader.u64_at(2)?,
            security: reader.u256_at(3)?,
            meta: reader.string_at(4)?,
        }
    } else if topic0 == event_topic(SIG_CATALOG_CREATED) {
        ChainEvent::CatalogCreated {
            catalog_id: bytes16_from_topic(topic(log, 1)?),
            owner: reader.address_at(0)?,
            created: reader.u64_at(1)?,
            terms: reader.string_at(2)?,
            meta: reader.string_at(3)?,
        }
    } else if topic0 == event_topic(SIG_API_PUBLISHED) {
        ChainEvent::ApiPublished {
            catalog_id: bytes16_from_topic(topic(log, 1)?),
            api_id: reader.bytes16_at(0)?,
            owner: reader.address_at(1)?,
            published: reader.u64_at(2)?,
            schema: reader.string_at(3)?,
            meta: reader.string_at(4)?,
        }
    } else if topic0 == event_topic(SIG_CHANNEL_OPENED) {
        ChainEvent::ChannelOpened {
            channel_id: bytes16_from_topic(topic(log, 1)?),
            market_id: reader.bytes16_at(0)?,
            channel_type: reader.u8_at(1)?,
            actor: reader.address_at(2)?,
            delegate: reader.address_at(3)?,
            recipient: reader.address_at(4)?,
            amount: reader.u256_at(5)?,
            opened: reader.u64_at(6)?,
        }
    } else {
        return Ok(None);
    };

    Ok(Some(event))
}

/// Log construction helpers for tests and the mock ledger. These build the
/// exact topic/data layouts `decode_log` expects, so they double as the
/// reference emitter.
pub mod encode {
    use super::*;
    use crate::domain::abi::{AbiEncoder, WORD};
    use shared_types::{Hash, TxHash};

    fn topic_from_address(adr: &Address) -> [u8; 32] {
        let mut t = [0u8; 32];
        t[12..].copy_from_slice(adr);
        t
    }

    fn topic_from_bytes16(id: &[u8; 16]) -> [u8; 32] {
        let mut t = [0u8; 32];
        t[..16].copy_from_slice(id);
        t
    }

    /// Data section of an encoder without the 4-byte selector.
    fn data_of(enc: &AbiEncoder) -> Vec<u8> {
        enc.finish()[4..].to_vec()
    }

    pub struct LogMeta {
        pub address: Address,
        pub block_number: u64,
        pub block_hash: Hash,
        pub tx_hash: TxHash,
        pub log_index: u32,
    }

    fn raw(meta: LogMeta, topics: Vec<[u8; 32]>, data: Vec<u8>) -> Log {
        Log {
            address: meta.address,
            topics,
            data,
            block_number: meta.block_number,
            block_hash: meta.block_hash,
            tx_hash: meta.tx_hash,
            log_index: meta.log_index,
        }
    }

    pub fn transfer(meta: LogMeta, from: &Address, to: &Address, value: U256) -> Log {
        let mut word = [0u8; WORD];
        value.to_big_endian(&mut word);
        raw(
            meta,
            vec![
                event_topic(SIG_TRANSFER),
                topic_from_address(from),
                topic_from_address(to),
            ],
            word.to_vec(),
        )
    }

    pub fn approval(meta: LogMeta, owner: &Address, spender: &Address, value: U256) -> Log {
        let mut word = [0u8; WORD];
        value.to_big_endian(&mut word);
        raw(
            meta,
            vec![
                event_topic(SIG_APPROVAL),
                topic_from_address(owner),
                topic_from_address(spender),
            ],
            word.to_vec(),
        )
    }

    pub fn member_registered(
        meta: LogMeta,
        member: &Address,
        registered: u64,
        eula: &str,
        profile: &str,
        level: u8,
    ) -> Log {
        let mut enc = AbiEncoder::new(SIG_MEMBER_REGISTERED);
        enc.push_u64(registered)
            .push_string(eula)
            .push_string(profile)
            .push_u8(level);
        raw(
            meta,
            vec![event_topic(SIG_MEMBER_REGISTERED), topic_from_address(member)],
            data_of(&enc),
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub fn market_created(
        meta: LogMeta,
        market_id: &[u8; 16],
        owner: &Address,
        created: u64,
        coin: &Address,
        terms: &str,
        meta_hash: &str,
        maker: &Address,
        provider_security: U256,
        consumer_security: U256,
        market_fee: U256,
    ) -> Log {
        let mut enc = AbiEncoder::new(SIG_MARKET_CREATED);
        enc.push_address(owner)
            .push_u64(created)
            .push_address(coin)
            .push_string(terms)
            .push_string(meta_hash)
            .push_address(maker)
            .push_u256(provider_security)
            .push_u256(consumer_security)
            .push_u256(market_fee);
        raw(
            meta,
            vec![event_topic(SIG_MARKET_CREATED), topic_from_bytes16(market_id)],
            data_of(&enc),
        )
    }

    pub fn actor_joined(
        meta: LogMeta,
        market_id: &[u8; 16],
        actor: &Address,
        actor_type: u8,
        joined: u64,
        security: U256,
        meta_hash: &str,
    ) -> Log {
        let mut enc = AbiEncoder::new(SIG_ACTOR_JOINED);
        enc.push_address(actor)
            .push_u8(actor_type)
            .push_u64(joined)
            .push_u256(security)
            .push_string(meta_hash);
        raw(
            meta,
            vec![event_topic(SIG_ACTOR_JOINED), topic_from_bytes16(market_id)],
            data_of(&enc),
        )
    }

    pub fn catalog_created(
        meta: LogMeta,
        catalog_id: &[u8; 16],
        owner: &Address,
        created: u64,
        terms: &str,
        meta_hash: &str,
    ) -> Log {
        let mut enc = AbiEncoder::new(SIG_CATALOG_CREATED);
        enc.push_address(owner)
            .push_u64(created)
            .push_string(terms)
            .push_string(meta_hash);
        raw(
            meta,
            vec![event_topic(SIG_CATALOG_CREATED), topic_from_bytes16(catalog_id)],
            data_of(&enc),
        )
    }

    pub fn api_published(
        meta: LogMeta,
        catalog_id: &[u8; 16],
        api_id: &[u8; 16],
        owner: &Address,
        published: u64,
        schema: &str,
        meta_hash: &str,
    ) -> Log {
        let mut enc = AbiEncoder::new(SIG_API_PUBLISHED);
        enc.push_bytes16(api_id)
            .push_address(owner)
            .push_u64(published)
            .push_string(schema)
            .push_string(meta_hash);
        raw(
            meta,
            vec![event_topic(SIG_API_PUBLISHED), topic_from_bytes16(catalog_id)],
            data_of(&enc),
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub fn channel_opened(
        meta: LogMeta,
        channel_id: &[u8; 16],
        market_id: &[u8; 16],
        channel_type: u8,
        actor: &Address,
        delegate: &Address,
        recipient: &Address,
        amount: U256,
        opened: u64,
    ) -> Log {
        let mut enc = AbiEncoder::new(SIG_CHANNEL_OPENED);
        enc.push_bytes16(market_id)
            .push_u8(channel_type)
            .push_address(actor)
            .push_address(delegate)
            .push_address(recipient)
            .push_u256(amount)
            .push_u64(opened);
        raw(
            meta,
            vec![event_topic(SIG_CHANNEL_OPENED), topic_from_bytes16(channel_id)],
            data_of(&enc),
        )
    }
}
