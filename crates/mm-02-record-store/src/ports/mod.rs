//! # Ports Layer
//!
//! The transactional store port. Adapters implement it; the scanner and the
//! action workflow depend only on the traits here.

pub mod store;
