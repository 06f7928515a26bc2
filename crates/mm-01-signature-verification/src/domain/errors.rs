//! # Signature Errors

use shared_types::Address;
use thiserror::Error;

/// Errors that can occur during typed-data signature verification.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SignatureError {
    /// The signature is not 65 bytes of `r || s || v`.
    #[error("invalid signature format")]
    InvalidFormat,

    /// Invalid recovery id (v must be 0, 1, 27, or 28).
    #[error("invalid recovery id: {0}")]
    InvalidRecoveryId(u8),

    /// Public-key recovery from the prehash failed.
    #[error("failed to recover public key")]
    RecoveryFailed,

    /// Recovered signer does not match the claimed wallet address.
    #[error("signer mismatch: expected {}, got {}", shared_types::hex_address(expected), shared_types::hex_address(actual))]
    SignerMismatch { expected: Address, actual: Address },
}
