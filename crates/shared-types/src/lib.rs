//! # Shared Types Crate
//!
//! Cross-subsystem primitives for MeshMarket. Every crate in the workspace
//! speaks in terms of the types defined here: ledger addresses and hashes,
//! object identifiers, nanosecond timestamps and the market actor roles.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: types that cross a crate boundary live here.
//! - **Plain data**: no I/O, no async, no crypto in this crate.

pub mod entities;

pub use entities::*;
