//! # Store Errors

use thiserror::Error;

/// Errors from the record store and its adapters.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Underlying storage engine I/O failure.
    #[error("storage i/o error: {message}")]
    Io { message: String },

    /// Record (de)serialization failure.
    #[error("record serialization error: {message}")]
    Serialization { message: String },

    /// Unknown column family / table.
    #[error("unknown table: {name}")]
    UnknownTable { name: &'static str },

    /// Illegal verification-action status transition.
    #[error("illegal status transition: {from:?} -> {to:?}")]
    IllegalTransition {
        from: crate::domain::records::ActionStatus,
        to: crate::domain::records::ActionStatus,
    },
}
