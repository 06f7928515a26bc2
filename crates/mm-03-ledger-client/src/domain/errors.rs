//! # Ledger Client Errors

use thiserror::Error;

/// Errors from the ledger RPC client, codecs and the transaction submitter.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LedgerError {
    /// Transport or RPC-level failure.
    #[error("ledger rpc error: {message}")]
    Rpc { message: String },

    /// The ledger executed the call and reverted it.
    #[error("transaction reverted: {reason}")]
    Reverted { reason: String },

    /// A log's topics or data did not match its event signature.
    #[error("malformed event log: {message}")]
    MalformedLog { message: String },

    /// ABI data shorter than the declared layout.
    #[error("abi decode error: {message}")]
    AbiDecode { message: String },

    /// Requested block does not exist yet.
    #[error("block {number} not found")]
    BlockNotFound { number: u64 },

    /// Transaction signing failure.
    #[error("transaction signing failed: {message}")]
    Signing { message: String },
}
