//! # Store Port
//!
//! Object-safe transactional access to the record tables. A write
//! transaction buffers its writes and applies them atomically on commit;
//! at most one write transaction exists at a time (single writer), which is
//! what lets the action workflow serialize per-oid status transitions
//! without a separate lock table.

use crate::domain::errors::StoreError;

/// Logical tables. Adapters map these to column families (RocksDB) or
/// per-table maps (memory).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    /// Scanned blocks plus the per-namespace checkpoint.
    Blocks,
    /// On-chain member registrations, by wallet address.
    Members,
    /// Markets, by 16-byte market id.
    Markets,
    /// Market actors, by `(market_id, actor, actor_type)`.
    Actors,
    /// Catalogs, by 16-byte catalog id.
    Catalogs,
    /// Published APIs, by 16-byte api id.
    Apis,
    /// Payment channels, by 16-byte channel id.
    Channels,
    /// ERC20 transfers, by tx hash.
    TokenTransfers,
    /// ERC20 approvals, by tx hash.
    TokenApprovals,
    /// Off-chain accounts, by oid.
    Accounts,
    /// Client public keys, by pubkey.
    UserKeys,
    /// Verification actions, by oid.
    Actions,
    /// Username -> account oid index.
    IdxUsernames,
    /// Email -> account oid index.
    IdxEmails,
    /// Maker wallet -> market id index.
    IdxMakers,
    /// Wallet address -> account oid index.
    IdxWallets,
}

impl Table {
    /// All tables, in column-family declaration order.
    pub const ALL: [Table; 16] = [
        Table::Blocks,
        Table::Members,
        Table::Markets,
        Table::Actors,
        Table::Catalogs,
        Table::Apis,
        Table::Channels,
        Table::TokenTransfers,
        Table::TokenApprovals,
        Table::Accounts,
        Table::UserKeys,
        Table::Actions,
        Table::IdxUsernames,
        Table::IdxEmails,
        Table::IdxMakers,
        Table::IdxWallets,
    ];

    /// Stable table name, used as the column family name.
    pub fn name(&self) -> &'static str {
        match self {
            Table::Blocks => "blocks",
            Table::Members => "members",
            Table::Markets => "markets",
            Table::Actors => "actors",
            Table::Catalogs => "catalogs",
            Table::Apis => "apis",
            Table::Channels => "channels",
            Table::TokenTransfers => "token_transfers",
            Table::TokenApprovals => "token_approvals",
            Table::Accounts => "accounts",
            Table::UserKeys => "user_keys",
            Table::Actions => "actions",
            Table::IdxUsernames => "idx_usernames",
            Table::IdxEmails => "idx_emails",
            Table::IdxMakers => "idx_makers",
            Table::IdxWallets => "idx_wallets",
        }
    }
}

/// Read access within a transaction (or a read snapshot).
pub trait ReadTransaction {
    /// Fetch the value under a key, if present.
    fn get(&self, table: Table, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;

    /// Check key existence without copying the value.
    fn exists(&self, table: Table, key: &[u8]) -> Result<bool, StoreError> {
        Ok(self.get(table, key)?.is_some())
    }

    /// All `(key, value)` pairs whose key starts with `prefix`, in ascending
    /// key order.
    fn scan_prefix(&self, table: Table, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError>;

    /// The highest `(key, value)` pair under `prefix`, if any. This is the
    /// checkpoint recovery primitive for the blocks table.
    fn last_in_prefix(
        &self,
        table: Table,
        prefix: &[u8],
    ) -> Result<Option<(Vec<u8>, Vec<u8>)>, StoreError>;
}

/// A buffered write transaction. Reads observe the transaction's own
/// uncommitted writes. Dropping without [`WriteTransaction::commit`] discards
/// everything.
pub trait WriteTransaction: ReadTransaction {
    /// Buffer a put.
    fn put(&mut self, table: Table, key: &[u8], value: &[u8]) -> Result<(), StoreError>;

    /// Buffer a delete.
    fn delete(&mut self, table: Table, key: &[u8]) -> Result<(), StoreError>;

    /// Apply all buffered writes atomically.
    fn commit(self: Box<Self>) -> Result<(), StoreError>;
}

/// The store itself. `begin_write` blocks until it is the only writer.
pub trait RecordStore: Send + Sync {
    /// Open a read snapshot.
    fn begin_read(&self) -> Result<Box<dyn ReadTransaction + '_>, StoreError>;

    /// Open the single write transaction.
    fn begin_write(&self) -> Result<Box<dyn WriteTransaction + '_>, StoreError>;
}
