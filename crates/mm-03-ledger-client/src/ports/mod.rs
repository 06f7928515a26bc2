//! # Ports Layer
//!
//! The outbound ledger RPC port. The scanner and the transaction submitter
//! depend only on the trait here; adapters provide HTTP or mock transport.

pub mod rpc;
