//! # Workflow Configuration

use serde::{Deserialize, Serialize};
use shared_types::Address;

/// Deployed contract addresses the workflow writes to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractAddresses {
    /// Membership registry.
    pub network: Address,
    /// Market factory.
    pub market: Address,
    /// Catalog / API registry.
    pub catalog: Address,
    /// Payment token.
    pub token: Address,
}

/// Action workflow configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Replay-protection chain id, also part of every signed tuple.
    pub chain_id: u64,
    /// Contract address bound into the typed-data tuples.
    pub verifying_contract: Address,
    pub contracts: ContractAddresses,
    /// Pending actions older than this are expired at verify time.
    pub action_ttl_secs: u64,
    /// Minimum wall-clock per create/verify call, every branch. Uniform
    /// timing blocks enumeration of which emails/usernames/wallets exist.
    pub min_call_ms: u64,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            chain_id: 1,
            verifying_contract: [0u8; 20],
            contracts: ContractAddresses {
                network: [0u8; 20],
                market: [0u8; 20],
                catalog: [0u8; 20],
                token: [0u8; 20],
            },
            action_ttl_secs: 24 * 60 * 60,
            min_call_ms: 100,
        }
    }
}

impl WorkflowConfig {
    /// Short TTL and a negligible call floor for tests.
    pub fn for_testing() -> Self {
        Self {
            chain_id: 1337,
            verifying_contract: [0x77; 20],
            contracts: ContractAddresses {
                network: [0x01; 20],
                market: [0x02; 20],
                catalog: [0x03; 20],
                token: [0x04; 20],
            },
            action_ttl_secs: 60,
            min_call_ms: 1,
        }
    }
}
