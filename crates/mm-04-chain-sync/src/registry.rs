//! # Event Projection Registry
//!
//! A static, immutable map from event name to its projection handler, built
//! once at startup. Every handler is insert-if-absent: re-scanned blocks and
//! replayed logs hit existing keys and become logged no-ops, which is the
//! idempotency guarantee of the whole synchronizer. No handler ever updates
//! a record in place.

use std::collections::HashMap;

use mm_02_record_store::{
    encode_record, keys, ApiRecord, CatalogRecord, ChannelRecord, MarketActor, MarketRecord,
    MemberRecord, ReadTransaction, Table, TokenApproval, TokenTransfer, WriteTransaction,
};
use mm_03_ledger_client::{ChainEvent, Log};
use primitive_types::U256;
use tracing::debug;

use crate::errors::SyncError;

/// Outcome of applying one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// A new record was written.
    Inserted,
    /// The key already existed; nothing was written.
    Duplicate,
}

/// One projection handler. Implementations must only insert, never update.
pub trait ApplyEvent: Send + Sync {
    /// The event name this handler projects (matches [`ChainEvent::name`]).
    fn event_name(&self) -> &'static str;

    /// Project the event into the transaction. Returns [`Applied::Duplicate`]
    /// without writing if the target key already exists.
    fn apply(
        &self,
        event: &ChainEvent,
        log: &Log,
        txn: &mut dyn WriteTransaction,
    ) -> Result<Applied, SyncError>;
}

/// The dispatch table. Built once, then only read.
pub struct EventRegistry {
    handlers: HashMap<&'static str, Box<dyn ApplyEvent>>,
}

impl EventRegistry {
    pub fn empty() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// The full standard projection: token movements plus every market
    /// control-plane event.
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(TransferHandler));
        registry.register(Box::new(ApprovalHandler));
        registry.register(Box::new(MemberRegisteredHandler));
        registry.register(Box::new(MarketCreatedHandler));
        registry.register(Box::new(ActorJoinedHandler));
        registry.register(Box::new(CatalogCreatedHandler));
        registry.register(Box::new(ApiPublishedHandler));
        registry.register(Box::new(ChannelOpenedHandler));
        registry
    }

    pub fn register(&mut self, handler: Box<dyn ApplyEvent>) {
        self.handlers.insert(handler.event_name(), handler);
    }

    /// Dispatch one decoded event.
    pub fn apply(
        &self,
        event: &ChainEvent,
        log: &Log,
        txn: &mut dyn WriteTransaction,
    ) -> Result<Applied, SyncError> {
        let handler = self
            .handlers
            .get(event.name())
            .ok_or(SyncError::UnhandledEvent { name: event.name() })?;
        let applied = handler.apply(event, log, txn)?;
        if applied == Applied::Duplicate {
            debug!(event = event.name(), block = log.block_number, "duplicate event skipped");
        }
        Ok(applied)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

fn u256_words(value: &U256) -> [u8; 32] {
    let mut out = [0u8; 32];
    value.to_big_endian(&mut out);
    out
}

/// Insert-if-absent write. The single shared primitive of all handlers.
fn insert_absent(
    txn: &mut dyn WriteTransaction,
    table: Table,
    key: &[u8],
    value: &[u8],
) -> Result<Applied, SyncError> {
    if txn.exists(table, key)? {
        return Ok(Applied::Duplicate);
    }
    txn.put(table, key, value)?;
    Ok(Applied::Inserted)
}

fn wrong_variant(expected: &'static str) -> SyncError {
    SyncError::InvalidEvent {
        message: format!("handler for {} received another event", expected),
    }
}

// ============================================================================
// Handlers
// ============================================================================

struct TransferHandler;

impl ApplyEvent for TransferHandler {
    fn event_name(&self) -> &'static str {
        "Transfer"
    }

    fn apply(
        &self,
        event: &ChainEvent,
        log: &Log,
        txn: &mut dyn WriteTransaction,
    ) -> Result<Applied, SyncError> {
        let ChainEvent::Transfer { from, to, value } = event else {
            return Err(wrong_variant(self.event_name()));
        };
        let record = TokenTransfer {
            tx_hash: log.tx_hash,
            from: *from,
            to: *to,
            value: u256_words(value),
            block_number: log.block_number,
        };
        insert_absent(
            txn,
            Table::TokenTransfers,
            &keys::tx_key(&log.tx_hash),
            &encode_record(&record)?,
        )
    }
}

struct ApprovalHandler;

impl ApplyEvent for ApprovalHandler {
    fn event_name(&self) -> &'static str {
        "Approval"
    }

    fn apply(
        &self,
        event: &ChainEvent,
        log: &Log,
        txn: &mut dyn WriteTransaction,
    ) -> Result<Applied, SyncError> {
        let ChainEvent::Approval {
            owner,
            spender,
            value,
        } = event
        else {
            return Err(wrong_variant(self.event_name()));
        };
        let record = TokenApproval {
            tx_hash: log.tx_hash,
            owner: *owner,
            spender: *spender,
            value: u256_words(value),
            block_number: log.block_number,
        };
        insert_absent(
            txn,
            Table::TokenApprovals,
            &keys::tx_key(&log.tx_hash),
            &encode_record(&record)?,
        )
    }
}

struct MemberRegisteredHandler;

impl ApplyEvent for MemberRegisteredHandler {
    fn event_name(&self) -> &'static str {
        "MemberRegistered"
    }

    fn apply(
        &self,
        event: &ChainEvent,
        log: &Log,
        txn: &mut dyn WriteTransaction,
    ) -> Result<Applied, SyncError> {
        let ChainEvent::MemberRegistered {
            member,
            registered,
            eula,
            profile,
            level,
        } = event
        else {
            return Err(wrong_variant(self.event_name()));
        };
        let record = MemberRecord {
            address: *member,
            registered: *registered,
            eula: eula.clone(),
            profile: profile.clone(),
            level: *level,
            tx_hash: log.tx_hash,
        };
        insert_absent(
            txn,
            Table::Members,
            &keys::address_key(member),
            &encode_record(&record)?,
        )
    }
}

struct MarketCreatedHandler;

impl ApplyEvent for MarketCreatedHandler {
    fn event_name(&self) -> &'static str {
        "MarketCreated"
    }

    fn apply(
        &self,
        event: &ChainEvent,
        log: &Log,
        txn: &mut dyn WriteTransaction,
    ) -> Result<Applied, SyncError> {
        let ChainEvent::MarketCreated {
            market_id,
            owner,
            created,
            coin,
            terms,
            meta,
            maker,
            provider_security,
            consumer_security,
            market_fee,
        } = event
        else {
            return Err(wrong_variant(self.event_name()));
        };
        let record = MarketRecord {
            market_id: *market_id,
            owner: *owner,
            coin: *coin,
            terms: terms.clone(),
            meta: meta.clone(),
            maker: *maker,
            provider_security: u256_words(provider_security),
            consumer_security: u256_words(consumer_security),
            market_fee: u256_words(market_fee),
            created: *created,
            tx_hash: log.tx_hash,
        };
        let applied = insert_absent(
            txn,
            Table::Markets,
            &keys::id16_key(market_id),
            &encode_record(&record)?,
        )?;
        if applied == Applied::Inserted {
            // The maker index backs the one-market-per-maker rule.
            txn.put(Table::IdxMakers, &keys::maker_index_key(maker), market_id)?;
        }
        Ok(applied)
    }
}

struct ActorJoinedHandler;

impl ApplyEvent for ActorJoinedHandler {
    fn event_name(&self) -> &'static str {
        "ActorJoined"
    }

    fn apply(
        &self,
        event: &ChainEvent,
        log: &Log,
        txn: &mut dyn WriteTransaction,
    ) -> Result<Applied, SyncError> {
        let ChainEvent::ActorJoined {
            market_id,
            actor,
            actor_type,
            joined,
            security,
            meta,
        } = event
        else {
            return Err(wrong_variant(self.event_name()));
        };
        if shared_types::ActorType::from_u8(*actor_type).is_none() {
            return Err(SyncError::InvalidEvent {
                message: format!("unknown actor type ordinal {}", actor_type),
            });
        }
        let record = MarketActor {
            market_id: *market_id,
            actor: *actor,
            actor_type: *actor_type,
            joined: *joined,
            security: u256_words(security),
            meta: meta.clone(),
            tx_hash: log.tx_hash,
        };
        insert_absent(
            txn,
            Table::Actors,
            &keys::actor_key(market_id, actor, *actor_type),
            &encode_record(&record)?,
        )
    }
}

struct CatalogCreatedHandler;

impl ApplyEvent for CatalogCreatedHandler {
    fn event_name(&self) -> &'static str {
        "CatalogCreated"
    }

    fn apply(
        &self,
        event: &ChainEvent,
        log: &Log,
        txn: &mut dyn WriteTransaction,
    ) -> Result<Applied, SyncError> {
        let ChainEvent::CatalogCreated {
            catalog_id,
            owner,
            created,
            terms,
            meta,
        } = event
        else {
            return Err(wrong_variant(self.event_name()));
        };
        let record = CatalogRecord {
            catalog_id: *catalog_id,
            owner: *owner,
            created: *created,
            terms: terms.clone(),
            meta: meta.clone(),
            tx_hash: log.tx_hash,
        };
        insert_absent(
            txn,
            Table::Catalogs,
            &keys::id16_key(catalog_id),
            &encode_record(&record)?,
        )
    }
}

struct ApiPublishedHandler;

impl ApplyEvent for ApiPublishedHandler {
    fn event_name(&self) -> &'static str {
        "ApiPublished"
    }

    fn apply(
        &self,
        event: &ChainEvent,
        log: &Log,
        txn: &mut dyn WriteTransaction,
    ) -> Result<Applied, SyncError> {
        let ChainEvent::ApiPublished {
            catalog_id,
            api_id,
            owner,
            published,
            schema,
            meta,
        } = event
        else {
            return Err(wrong_variant(self.event_name()));
        };
        let record = ApiRecord {
            api_id: *api_id,
            catalog_id: *catalog_id,
            owner: *owner,
            published: *published,
            schema: schema.clone(),
            meta: meta.clone(),
            tx_hash: log.tx_hash,
        };
        insert_absent(
            txn,
            Table::Apis,
            &keys::id16_key(api_id),
            &encode_record(&record)?,
        )
    }
}

struct ChannelOpenedHandler;

impl ApplyEvent for ChannelOpenedHandler {
    fn event_name(&self) -> &'static str {
        "ChannelOpened"
    }

    fn apply(
        &self,
        event: &ChainEvent,
        log: &Log,
        txn: &mut dyn WriteTransaction,
    ) -> Result<Applied, SyncError> {
        let ChainEvent::ChannelOpened {
            channel_id,
            market_id,
            channel_type,
            actor,
            delegate,
            recipient,
            amount,
            opened,
        } = event
        else {
            return Err(wrong_variant(self.event_name()));
        };
        let record = ChannelRecord {
            channel_id: *channel_id,
            market_id: *market_id,
            channel_type: *channel_type,
            actor: *actor,
            delegate: *delegate,
            recipient: *recipient,
            amount: u256_words(amount),
            opened: *opened,
            tx_hash: log.tx_hash,
        };
        insert_absent(
            txn,
            Table::Channels,
            &keys::id16_key(channel_id),
            &encode_record(&record)?,
        )
    }
}
