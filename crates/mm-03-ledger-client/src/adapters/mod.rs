//! # Adapters
//!
//! Ledger RPC implementations. The mock adapter is not test-gated: the
//! scanner and workflow crates use it for their own tests and demos.

pub mod mock;
