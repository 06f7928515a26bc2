//! # Mock Ledger
//!
//! In-memory [`LedgerRpc`] implementation with a scripted chain. Tests push
//! blocks (with pre-built logs), inject per-block log failures, and script
//! revert reasons for broadcasts. Cloning shares the underlying chain, so a
//! test can keep a handle while the scanner owns another.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use primitive_types::U256;
use shared_types::{Address, TxHash};

use crate::domain::contracts::ContractCall;
use crate::domain::errors::LedgerError;
use crate::domain::logs::{Log, LogFilter};
use crate::ports::rpc::{BlockHeader, LedgerRpc};
use mm_01_signature_verification::keccak256;

struct MockBlock {
    header: BlockHeader,
    logs: Vec<Log>,
}

#[derive(Default)]
struct MockState {
    blocks: Vec<MockBlock>,
    /// Block numbers whose get_logs call fails once, then succeeds.
    failing_logs: HashMap<u64, u32>,
    /// If set, every broadcast reverts with this reason.
    revert_reason: Option<String>,
    submitted: Vec<Vec<u8>>,
    send_attempts: u64,
    gas_price: U256,
    gas_estimate: u64,
}

/// Scripted in-memory ledger.
#[derive(Clone)]
pub struct MockLedger {
    state: Arc<Mutex<MockState>>,
}

impl MockLedger {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                gas_price: U256::from(1_000_000_000u64),
                gas_estimate: 100_000,
                ..Default::default()
            })),
        }
    }

    /// Append a block with the given logs. Block numbers are sequential
    /// starting at 1; timestamps advance by 15 seconds per block.
    pub fn push_block(&self, mut logs: Vec<Log>) -> u64 {
        let mut state = self.state.lock();
        let number = state.blocks.len() as u64 + 1;
        let mut hash = [0u8; 32];
        hash.copy_from_slice(&keccak256(&number.to_be_bytes()));
        for (i, log) in logs.iter_mut().enumerate() {
            log.block_number = number;
            log.block_hash = hash;
            log.log_index = i as u32;
        }
        state.blocks.push(MockBlock {
            header: BlockHeader {
                number,
                hash,
                timestamp: 1_600_000_000 + number * 15,
            },
            logs,
        });
        number
    }

    /// Make `get_logs` for a block fail `times` times before succeeding.
    pub fn fail_logs_at(&self, block_number: u64, times: u32) {
        self.state.lock().failing_logs.insert(block_number, times);
    }

    /// Script every subsequent broadcast to revert with `reason`.
    pub fn set_revert(&self, reason: &str) {
        self.state.lock().revert_reason = Some(reason.to_string());
    }

    /// Clear a scripted revert.
    pub fn clear_revert(&self) {
        self.state.lock().revert_reason = None;
    }

    /// Raw transactions accepted so far.
    pub fn submitted(&self) -> Vec<Vec<u8>> {
        self.state.lock().submitted.clone()
    }

    /// Broadcast attempts, including reverted ones.
    pub fn send_attempts(&self) -> u64 {
        self.state.lock().send_attempts
    }
}

impl Default for MockLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerRpc for MockLedger {
    async fn block_number(&self) -> Result<u64, LedgerError> {
        Ok(self.state.lock().blocks.len() as u64)
    }

    async fn block_header(&self, number: u64) -> Result<Option<BlockHeader>, LedgerError> {
        let state = self.state.lock();
        if number == 0 {
            return Ok(None);
        }
        Ok(state
            .blocks
            .get((number - 1) as usize)
            .map(|b| b.header.clone()))
    }

    async fn get_logs(&self, filter: &LogFilter) -> Result<Vec<Log>, LedgerError> {
        let mut state = self.state.lock();
        if let Some(remaining) = state.failing_logs.get_mut(&filter.block_number) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(LedgerError::Rpc {
                    message: format!("scripted failure for block {}", filter.block_number),
                });
            }
        }
        if filter.block_number == 0 || filter.block_number as usize > state.blocks.len() {
            return Err(LedgerError::BlockNotFound {
                number: filter.block_number,
            });
        }
        let block = &state.blocks[(filter.block_number - 1) as usize];
        Ok(block
            .logs
            .iter()
            .filter(|log| filter.matches(log))
            .cloned()
            .collect())
    }

    async fn gas_price(&self) -> Result<U256, LedgerError> {
        Ok(self.state.lock().gas_price)
    }

    async fn estimate_gas(&self, _from: &Address, _call: &ContractCall) -> Result<u64, LedgerError> {
        Ok(self.state.lock().gas_estimate)
    }

    async fn transaction_count_pending(&self, _address: &Address) -> Result<u64, LedgerError> {
        // One sender in the mock; every accepted broadcast bumps the count.
        Ok(self.state.lock().submitted.len() as u64)
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<TxHash, LedgerError> {
        let mut state = self.state.lock();
        state.send_attempts += 1;
        if let Some(reason) = &state.revert_reason {
            return Err(LedgerError::Reverted {
                reason: reason.clone(),
            });
        }
        state.submitted.push(raw.to_vec());
        Ok(keccak256(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::events::encode::{self, LogMeta};

    fn meta() -> LogMeta {
        LogMeta {
            address: [0xaa; 20],
            block_number: 0,
            block_hash: [0u8; 32],
            tx_hash: [3u8; 32],
            log_index: 0,
        }
    }

    #[tokio::test]
    async fn test_blocks_are_sequential() {
        let ledger = MockLedger::new();
        assert_eq!(ledger.push_block(vec![]), 1);
        assert_eq!(ledger.push_block(vec![]), 2);
        assert_eq!(ledger.block_number().await.unwrap(), 2);
        let header = ledger.block_header(2).await.unwrap().unwrap();
        assert_eq!(header.number, 2);
    }

    #[tokio::test]
    async fn test_logs_are_stamped_with_block() {
        let ledger = MockLedger::new();
        let log = encode::transfer(meta(), &[1u8; 20], &[2u8; 20], U256::one());
        let number = ledger.push_block(vec![log]);

        let logs = ledger
            .get_logs(&LogFilter::for_block(number, vec![]))
            .await
            .unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].block_number, number);
    }

    #[tokio::test]
    async fn test_address_filter_applies() {
        let ledger = MockLedger::new();
        let log = encode::transfer(meta(), &[1u8; 20], &[2u8; 20], U256::one());
        let number = ledger.push_block(vec![log]);

        let logs = ledger
            .get_logs(&LogFilter::for_block(number, vec![[0xbb; 20]]))
            .await
            .unwrap();
        assert!(logs.is_empty());
    }

    #[tokio::test]
    async fn test_scripted_log_failure_is_transient() {
        let ledger = MockLedger::new();
        let number = ledger.push_block(vec![]);
        ledger.fail_logs_at(number, 1);

        let filter = LogFilter::for_block(number, vec![]);
        assert!(ledger.get_logs(&filter).await.is_err());
        assert!(ledger.get_logs(&filter).await.is_ok());
    }
}
