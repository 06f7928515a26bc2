//! # Ledger RPC Port

use async_trait::async_trait;
use primitive_types::U256;
use shared_types::{Address, Hash, TxHash};

use crate::domain::contracts::ContractCall;
use crate::domain::errors::LedgerError;
use crate::domain::logs::{Log, LogFilter};

/// Header fields of one ledger block, as much as the read-model needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockHeader {
    pub number: u64,
    pub hash: Hash,
    /// Seconds since epoch, as reported by the ledger.
    pub timestamp: u64,
}

/// Outbound port to the external ledger RPC endpoint.
///
/// The ledger progresses independently of this process; every answer is a
/// snapshot that may be stale by the time it is used.
#[async_trait]
pub trait LedgerRpc: Send + Sync {
    /// Highest block number the endpoint currently knows.
    async fn block_number(&self) -> Result<u64, LedgerError>;

    /// Header of a specific block, if it exists.
    async fn block_header(&self, number: u64) -> Result<Option<BlockHeader>, LedgerError>;

    /// Event logs for exactly one block, address-filtered.
    async fn get_logs(&self, filter: &LogFilter) -> Result<Vec<Log>, LedgerError>;

    /// Current gas price.
    async fn gas_price(&self) -> Result<U256, LedgerError>;

    /// Gas estimate for a contract call from `from`.
    async fn estimate_gas(&self, from: &Address, call: &ContractCall) -> Result<u64, LedgerError>;

    /// Transaction count of an address including pending transactions. Used
    /// as the next nonce.
    async fn transaction_count_pending(&self, address: &Address) -> Result<u64, LedgerError>;

    /// Broadcast a signed raw transaction. A ledger-level revert surfaces as
    /// [`LedgerError::Reverted`] with the revert reason.
    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<TxHash, LedgerError>;
}
