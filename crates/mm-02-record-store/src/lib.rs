//! # Record Store Subsystem (MM-02)
//!
//! The durable side of MeshMarket: a transactional key-value store holding
//! the chain read-model (blocks, members, markets, actors, catalogs, APIs,
//! channels, token movements) and the pending-intent queue (verification
//! actions, accounts, client keys).
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`): record entities, key codecs, errors
//! - **Ports Layer** (`ports/`): the `RecordStore` transaction port
//! - **Adapters** (`adapters/`): in-memory store for tests, RocksDB store
//!   for production
//!
//! ## Store Contract
//!
//! A write transaction either commits all of its writes or none of them, and
//! there is at most one write transaction in flight at a time (single
//! writer). Ordered range scans over fixed-width big-endian keys are the
//! basis of checkpoint recovery.

pub mod adapters;
pub mod domain;
pub mod ports;

pub use adapters::memory::MemoryStore;
pub use adapters::rocks::{RocksDbConfig, RocksDbStore};
pub use domain::errors::StoreError;
pub use domain::keys;
pub use domain::records::{
    Account, ActionKind, ActionStatus, ApiRecord, BlockRecord, CatalogRecord, ChannelRecord,
    MarketActor, MarketRecord, MemberRecord, TokenApproval, TokenTransfer, UserKey,
    VerificationAction,
};
pub use domain::{decode_record, encode_record};
pub use ports::store::{ReadTransaction, RecordStore, Table, WriteTransaction};
