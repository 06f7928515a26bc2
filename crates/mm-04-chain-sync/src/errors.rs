//! # Synchronizer Errors

use mm_02_record_store::StoreError;
use mm_03_ledger_client::LedgerError;
use thiserror::Error;

/// Errors raised while scanning blocks and applying events.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SyncError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// A decoded event had no registered handler. The registry is built
    /// once at startup, so this is a wiring bug, not a runtime condition.
    #[error("no handler registered for event {name}")]
    UnhandledEvent { name: &'static str },

    /// An event carried a value outside the domain (e.g. unknown actor
    /// type ordinal).
    #[error("invalid event field: {message}")]
    InvalidEvent { message: String },
}
