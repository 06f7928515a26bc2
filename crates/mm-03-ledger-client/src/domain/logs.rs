//! # Event Logs
//!
//! The raw log shape returned by the ledger RPC and the filter used to
//! request logs for exactly one block.

use shared_types::{Address, Hash, TxHash};

/// One event log as returned by the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Log {
    /// Emitting contract.
    pub address: Address,
    /// `topics[0]` is the event signature hash; the rest are indexed args.
    pub topics: Vec<[u8; 32]>,
    /// Non-indexed args, ABI-encoded.
    pub data: Vec<u8>,
    pub block_number: u64,
    pub block_hash: Hash,
    pub tx_hash: TxHash,
    /// Position of the log within its block.
    pub log_index: u32,
}

/// Filter for one block, restricted to the configured contract addresses.
/// The scanner never requests ranges; one block per call keeps checkpointing
/// exact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFilter {
    pub block_number: u64,
    /// Contracts to include; empty means all.
    pub addresses: Vec<Address>,
}

impl LogFilter {
    pub fn for_block(block_number: u64, addresses: Vec<Address>) -> Self {
        Self {
            block_number,
            addresses,
        }
    }

    /// Whether a log at this filter's block passes the address filter.
    pub fn matches(&self, log: &Log) -> bool {
        log.block_number == self.block_number
            && (self.addresses.is_empty() || self.addresses.contains(&log.address))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log_at(block: u64, address: Address) -> Log {
        Log {
            address,
            topics: vec![],
            data: vec![],
            block_number: block,
            block_hash: [0u8; 32],
            tx_hash: [0u8; 32],
            log_index: 0,
        }
    }

    #[test]
    fn test_filter_by_address() {
        let filter = LogFilter::for_block(5, vec![[1u8; 20]]);
        assert!(filter.matches(&log_at(5, [1u8; 20])));
        assert!(!filter.matches(&log_at(5, [2u8; 20])));
        assert!(!filter.matches(&log_at(6, [1u8; 20])));
    }

    #[test]
    fn test_empty_address_filter_matches_all() {
        let filter = LogFilter::for_block(5, vec![]);
        assert!(filter.matches(&log_at(5, [9u8; 20])));
    }
}
