//! # Ledger Client Subsystem (MM-03)
//!
//! Everything that talks to or encodes for the external ledger: the RPC
//! port, the ABI codec, typed event decoding, transaction signing and the
//! one-shot transaction submitter.
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`): pure codecs
//!   - `abi`: selectors, head/tail argument encoding, event data decoding
//!   - `events`: raw log to [`ChainEvent`] decoding, keyed by `topics[0]`
//!   - `contracts`: calldata builders for the delegated contract functions
//!   - `tx`: legacy transaction RLP and EIP-155 signing
//! - **Ports Layer** (`ports/`): the [`LedgerRpc`] outbound port
//! - **Service Layer** (`service/`): [`TransactionSubmitter`]
//! - **Adapters** (`adapters/`): scripted [`MockLedger`]
//!
//! ## Submission Policy
//!
//! One attempt per call. A revert is mapped to a domain error by the caller
//! and surfaced; the submitter never retries, reprices or replaces.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::mock::MockLedger;
pub use domain::contracts::{
    create_catalog_for, create_market_for, join_market_for, publish_api_for, register_member_for,
    ContractCall,
};
pub use domain::errors::LedgerError;
pub use domain::events::{decode_log, ChainEvent};
pub use domain::logs::{Log, LogFilter};
pub use domain::tx::LegacyTransaction;
pub use ports::rpc::{BlockHeader, LedgerRpc};
pub use service::submitter::{SubmitterConfig, TransactionSubmitter};
