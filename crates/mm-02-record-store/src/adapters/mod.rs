//! # Adapters
//!
//! Two implementations of the store port: an in-memory store for tests and
//! a RocksDB store for production.

pub mod memory;
pub mod rocks;
