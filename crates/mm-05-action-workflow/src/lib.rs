//! # Verified Action Workflow Subsystem (MM-05)
//!
//! The two-phase "create, then verify" orchestrator for all privileged
//! operations: member onboarding and login, market creation and joining,
//! catalog creation and API publication.
//!
//! `create_*` authenticates the caller's typed-data signature, captures an
//! immutable payload in the record store, and mails a one-time activation
//! code. `verify_*` checks the code, applies local side effects, and then
//! performs the delegated ledger write through the hot wallet.
//!
//! ## Guarantees
//!
//! - **Signature binding**: every action is accepted only if the recovered
//!   signer equals the claimed member wallet.
//! - **One-shot verification**: an action transitions Pending to Verified
//!   at most once; replays fail with a wrong-state error.
//! - **Uniform responses**: enumeration probes (unknown wallets, taken
//!   emails) get the same response shape and the same minimum latency as
//!   the happy path.
//! - **Ledger asymmetry**: local state committed at verify time is never
//!   rolled back when the ledger later rejects the write; the action is
//!   marked failed and the rejection is surfaced to the caller.

pub mod codes;
pub mod config;
pub mod errors;
pub mod payloads;
pub mod ports;
pub mod service;

pub use config::{ContractAddresses, WorkflowConfig};
pub use errors::{map_revert, WorkflowError};
pub use payloads::{
    ApiVerified, CatalogVerified, CreateActionResult, CreateCatalogRequest, CreateMarketRequest,
    JoinMarketRequest, JoinVerified, LoginMemberRequest, LoginVerified, MarketVerified,
    OnboardMemberRequest, OnboardVerified, PublishApiRequest,
};
pub use ports::{ChainWriter, NotificationGateway, SentMail, TestMailSink};
pub use service::ActionWorkflow;
