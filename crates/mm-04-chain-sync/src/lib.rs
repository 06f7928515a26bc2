//! # Chain Synchronizer Subsystem (MM-04)
//!
//! Keeps the local record store consistent with the external ledger: a
//! block-by-block scanner with a durable checkpoint, and an idempotent
//! event-to-record projection.
//!
//! ## Guarantees
//!
//! - **Checkpoint monotonicity**: the checkpoint only advances, and only
//!   after the block's BlockRecord and all its projections committed in one
//!   transaction.
//! - **Idempotent projection**: every handler is insert-if-absent, so
//!   re-scans and replayed logs are no-ops.
//! - **Isolation**: each scanner instance has its own checkpoint namespace
//!   and contract filter; instances never share a checkpoint.

pub mod errors;
pub mod registry;
pub mod scanner;

pub use errors::SyncError;
pub use registry::{Applied, ApplyEvent, EventRegistry};
pub use scanner::{ChainScanner, ScannerConfig, ScannerHandle, ScannerStatus};
