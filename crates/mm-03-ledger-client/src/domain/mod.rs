//! # Domain Layer
//!
//! Pure codecs: ABI encoding/decoding, typed event decoding, RLP
//! transaction encoding and EIP-155 signing. No I/O.

pub mod abi;
pub mod contracts;
pub mod errors;
pub mod events;
pub mod logs;
pub mod tx;
