//! # Transaction Submitter
//!
//! Turns an encoded contract call into a broadcast transaction: estimate
//! gas, fetch the pending-inclusive nonce, sign with the hot wallet key,
//! send. One attempt per call; a ledger rejection is surfaced to the caller
//! unchanged, never retried.

use k256::ecdsa::SigningKey;
use primitive_types::U256;
use shared_types::{hex_hash, Address, TxHash};
use tracing::{debug, info, warn};

use crate::domain::contracts::ContractCall;
use crate::domain::errors::LedgerError;
use crate::domain::tx::LegacyTransaction;
use crate::ports::rpc::LedgerRpc;

/// Submitter configuration.
#[derive(Debug, Clone)]
pub struct SubmitterConfig {
    /// Replay-protection chain id.
    pub chain_id: u64,
    /// Safety margin multiplied onto the gas estimate, in percent.
    pub gas_margin_percent: u64,
}

impl Default for SubmitterConfig {
    fn default() -> Self {
        Self {
            chain_id: 1,
            gas_margin_percent: 20,
        }
    }
}

/// Signs and broadcasts contract calls from the control plane's hot wallet.
pub struct TransactionSubmitter<R: LedgerRpc> {
    rpc: R,
    key: SigningKey,
    from: Address,
    config: SubmitterConfig,
}

impl<R: LedgerRpc> TransactionSubmitter<R> {
    pub fn new(rpc: R, key: SigningKey, config: SubmitterConfig) -> Self {
        let from = mm_01_signature_verification::address_from_pubkey(key.verifying_key());
        Self {
            rpc,
            key,
            from,
            config,
        }
    }

    /// The hot wallet address transactions are sent from.
    pub fn sender(&self) -> Address {
        self.from
    }

    pub fn rpc(&self) -> &R {
        &self.rpc
    }

    /// Submit one contract call. Returns the transaction hash once the
    /// endpoint accepted the raw transaction.
    pub async fn submit(&self, call: &ContractCall) -> Result<TxHash, LedgerError> {
        let gas_estimate = self.rpc.estimate_gas(&self.from, call).await?;
        let gas_limit = gas_estimate + gas_estimate * self.config.gas_margin_percent / 100;
        let gas_price = self.rpc.gas_price().await?;

        // Pending-inclusive count, so queued transactions of ours are not
        // clobbered.
        let nonce = self.rpc.transaction_count_pending(&self.from).await?;

        debug!(nonce, gas_limit, "submitting contract call");

        let tx = LegacyTransaction {
            nonce,
            gas_price,
            gas_limit,
            to: call.to,
            value: U256::zero(),
            data: call.data.clone(),
        };
        let (raw, tx_hash) = tx.sign(&self.key, self.config.chain_id)?;

        match self.rpc.send_raw_transaction(&raw).await {
            Ok(accepted) => {
                info!(tx_hash = %hex_hash(&accepted), "transaction accepted");
                Ok(accepted)
            }
            Err(e) => {
                warn!(tx_hash = %hex_hash(&tx_hash), error = %e, "transaction rejected");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::MockLedger;
    use crate::domain::contracts::register_member_for;
    use mm_01_signature_verification::testing::generate_keypair;

    fn call() -> ContractCall {
        register_member_for(&[0x22; 20], &[0x33; 20], 1, "QmE", "QmP", &[0u8; 65])
    }

    #[tokio::test]
    async fn test_submit_broadcasts_signed_tx() {
        let ledger = MockLedger::new();
        let (sk, _) = generate_keypair();
        let submitter = TransactionSubmitter::new(ledger, sk, SubmitterConfig::default());

        let tx_hash = submitter.submit(&call()).await.unwrap();
        assert_ne!(tx_hash, [0u8; 32]);
        assert_eq!(submitter.rpc().submitted().len(), 1);
    }

    #[tokio::test]
    async fn test_revert_is_surfaced_not_retried() {
        let ledger = MockLedger::new();
        ledger.set_revert("MEMBER_ALREADY_REGISTERED");
        let (sk, _) = generate_keypair();
        let submitter = TransactionSubmitter::new(ledger, sk, SubmitterConfig::default());

        let err = submitter.submit(&call()).await.unwrap_err();
        assert!(matches!(err, LedgerError::Reverted { ref reason } if reason == "MEMBER_ALREADY_REGISTERED"));
        // The raw tx reached the endpoint exactly once.
        assert_eq!(submitter.rpc().send_attempts(), 1);
    }

    #[tokio::test]
    async fn test_nonce_counts_pending() {
        let ledger = MockLedger::new();
        let (sk, _) = generate_keypair();
        let submitter = TransactionSubmitter::new(ledger, sk, SubmitterConfig::default());

        submitter.submit(&call()).await.unwrap();
        submitter.submit(&call()).await.unwrap();

        let raws = submitter.rpc().submitted();
        assert_eq!(raws.len(), 2);
        // Distinct nonces produce distinct wire bytes.
        assert_ne!(raws[0], raws[1]);
    }
}
