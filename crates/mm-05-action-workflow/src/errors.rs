//! # Workflow Errors
//!
//! Every failure a caller can see carries a stable error code string, which
//! is the wire contract with clients. Codes never change once shipped.

use mm_01_signature_verification::SignatureError;
use mm_02_record_store::StoreError;
use mm_03_ledger_client::LedgerError;
use thiserror::Error;

/// Errors surfaced by the action workflow.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WorkflowError {
    /// Recovered signer differs from the claimed wallet, or the signature
    /// is structurally invalid.
    #[error("invalid signature: {0}")]
    InvalidSignature(#[from] SignatureError),

    /// The desired username is taken; `alternative` is a free suggestion.
    #[error("username {username} already exists (try {alternative})")]
    UsernameExists {
        username: String,
        alternative: String,
    },

    /// No action under that oid (or it is of another kind, which callers
    /// cannot distinguish).
    #[error("no such verification action")]
    NoSuchAction,

    /// Presented code does not match. The action stays pending.
    #[error("invalid activation code")]
    InvalidActivationCode,

    /// The action is no longer pending.
    #[error("action already processed")]
    AlreadyProcessed,

    /// The action outlived its time-to-live.
    #[error("verification action expired")]
    Expired,

    /// A structural constraint of the request failed.
    #[error("invalid request: {message}")]
    InvalidRequest { message: String },

    /// Attached blob does not hash to the value referenced in the signed
    /// payload.
    #[error("content hash mismatch for {field}")]
    ContentHashMismatch { field: &'static str },

    /// Referenced entity is not in the read-model.
    #[error("no such {entity}")]
    NoSuchEntity { entity: &'static str },

    /// A market owner tried to join their own market.
    #[error("cannot join own market")]
    SenderIsOwner,

    /// The chosen maker wallet already operates another market.
    #[error("maker already working for other market")]
    MakerAlreadyWorking,

    /// The ledger reverted the write with a reason we do not map further.
    #[error("ledger rejected the transaction: {reason}")]
    LedgerRejected { reason: String },

    /// The out-of-band notification could not be delivered.
    #[error("notification delivery failed: {message}")]
    NotificationFailed { message: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl WorkflowError {
    /// Stable machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            WorkflowError::InvalidSignature(_) => "mesh.error.invalid_signature",
            WorkflowError::UsernameExists { .. } => "mesh.error.username_already_exists",
            WorkflowError::NoSuchAction => "mesh.error.no_such_object",
            WorkflowError::InvalidActivationCode => "mesh.error.invalid_activation_code",
            WorkflowError::AlreadyProcessed => "mesh.error.wrong_state",
            WorkflowError::Expired => "mesh.error.action_expired",
            WorkflowError::InvalidRequest { .. } => "mesh.error.invalid_request",
            WorkflowError::ContentHashMismatch { .. } => "mesh.error.content_hash_mismatch",
            WorkflowError::NoSuchEntity { .. } => "mesh.error.no_such_object",
            WorkflowError::SenderIsOwner => "mesh.error.sender_is_owner",
            WorkflowError::MakerAlreadyWorking => {
                "mesh.error.maker_already_working_for_other_market"
            }
            WorkflowError::LedgerRejected { .. } => "mesh.error.ledger_rejected",
            WorkflowError::NotificationFailed { .. } => "mesh.error.internal",
            WorkflowError::Store(_) => "mesh.error.internal",
            WorkflowError::Ledger(_) => "mesh.error.internal",
        }
    }
}

/// Map a ledger revert reason onto the matching domain error. Unmapped
/// reasons surface verbatim.
pub fn map_revert(error: LedgerError) -> WorkflowError {
    match error {
        LedgerError::Reverted { reason } => match reason.as_str() {
            "SENDER_IS_OWNER" => WorkflowError::SenderIsOwner,
            "MAKER_ALREADY_WORKING_FOR_OTHER_MARKET" => WorkflowError::MakerAlreadyWorking,
            _ => WorkflowError::LedgerRejected { reason },
        },
        other => WorkflowError::Ledger(other),
    }
}
